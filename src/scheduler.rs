//! Digest scheduler — fires the batch path on a cron schedule.
//!
//! Overlapping runs are not guarded against here; fires are sequential
//! within this loop and a run completes (or fails) before the next
//! sleep begins.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::digest::DigestJob;
use crate::error::ConfigError;

/// Parse a cron expression and compute the next fire time from now.
pub fn next_fire(schedule: &str) -> Result<Option<DateTime<Utc>>, ConfigError> {
    let schedule =
        cron::Schedule::from_str(schedule).map_err(|e| ConfigError::InvalidValue {
            key: "DIGEST_SCHEDULE".into(),
            message: e.to_string(),
        })?;
    Ok(schedule.upcoming(Utc).next())
}

/// Run the digest on `schedule` until the process exits.
///
/// With `run_now`, one immediate run happens before normal scheduling
/// resumes.
pub async fn run_schedule(
    job: Arc<DigestJob>,
    schedule: &str,
    run_now: bool,
) -> Result<(), ConfigError> {
    // Validate the expression up front rather than on the first fire.
    next_fire(schedule)?;

    if run_now {
        info!("Running digest now");
        run_once(&job).await;
    }

    info!(schedule, "Digest scheduler started");
    loop {
        let Some(fire_at) = next_fire(schedule)? else {
            info!("Schedule has no upcoming fires; scheduler exiting");
            return Ok(());
        };

        let wait = (fire_at - Utc::now()).to_std().unwrap_or_default();
        info!(fire_at = %fire_at, "Next digest scheduled");
        tokio::time::sleep(wait).await;

        run_once(&job).await;
    }
}

async fn run_once(job: &DigestJob) {
    if let Err(e) = job.run().await {
        error!(error = %e, "Digest run failed");
    }
}
