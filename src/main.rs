use std::sync::Arc;

use channel_sift::classifier::ClassificationClient;
use channel_sift::classifier::gemini::GeminiOracle;
use channel_sift::config::Config;
use channel_sift::digest::DigestJob;
use channel_sift::pipeline::{AttachmentExtractor, EventGate, MessageProcessor, SlackFileFetcher};
use channel_sift::slack::{SlackWebApi, SocketModeListener};

/// Run mode, from the first CLI argument.
enum Mode {
    /// Real-time listener (default).
    Listen,
    /// One digest pass, then exit.
    Digest,
    /// Cron-driven digest loop; `--now` runs once immediately first.
    Schedule { run_now: bool },
}

fn parse_mode() -> Result<Mode, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("listen") => Ok(Mode::Listen),
        Some("digest") => Ok(Mode::Digest),
        Some("schedule") => Ok(Mode::Schedule {
            run_now: args.iter().any(|a| a == "--now"),
        }),
        Some(other) => Err(format!(
            "unknown mode '{other}' (expected: listen | digest | schedule [--now])"
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mode = parse_mode().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    });

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📡 channel-sift v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Monitored channels: {}", config.monitored_channels.len());
    eprintln!("   Summary channel: {}", config.summary_channel);
    eprintln!("   Model: {}\n", config.oracle.model);

    let chat = Arc::new(SlackWebApi::new(config.bot_token.clone()));
    let extractor = || {
        AttachmentExtractor::new(Arc::new(SlackFileFetcher::new(config.bot_token.clone())))
    };
    let classifier =
        || ClassificationClient::new(Arc::new(GeminiOracle::new(&config.oracle)));

    match mode {
        Mode::Listen => {
            let processor = Arc::new(MessageProcessor::new(
                EventGate::new(
                    config.monitored_channels.clone(),
                    config.summary_channel.clone(),
                ),
                extractor(),
                classifier(),
                chat,
                config.summary_channel.clone(),
            ));
            SocketModeListener::new(config.app_token.clone(), processor)
                .run()
                .await;
        }
        Mode::Digest => {
            let job = DigestJob::new(
                chat,
                extractor(),
                classifier(),
                config.monitored_channels.clone(),
                config.summary_channel.clone(),
            );
            job.run().await?;
        }
        Mode::Schedule { run_now } => {
            let job = Arc::new(DigestJob::new(
                chat,
                extractor(),
                classifier(),
                config.monitored_channels.clone(),
                config.summary_channel.clone(),
            ));
            channel_sift::scheduler::run_schedule(job, &config.digest_schedule, run_now).await?;
        }
    }

    Ok(())
}
