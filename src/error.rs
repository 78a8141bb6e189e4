//! Error types for channel-sift.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Slack error: {0}")]
    Slack(#[from] SlackError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Slack transport and API errors.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Slack API {method} returned error: {error}")]
    Api { method: String, error: String },

    #[error("Socket Mode connection failed: {0}")]
    Socket(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Classification oracle errors.
///
/// Parse failures and length mismatches are *not* errors — the client
/// repairs those into synthetic verdicts. These variants cover whole-call
/// transport failures only.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Oracle request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Oracle stream interrupted: {reason}")]
    Stream { reason: String },
}

/// Pipeline-level errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Classification failed: {0}")]
    Classify(#[from] ClassifierError),

    #[error("Channel lookup failed: {0}")]
    ChannelLookup(SlackError),

    #[error("History fetch failed: {0}")]
    HistoryFetch(SlackError),

    #[error("Post failed: {0}")]
    Post(SlackError),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
