//! channel-sift — watches Slack channels, classifies messages with a
//! generative oracle, and republishes a prioritized view to a summary
//! channel (per-message in real time, plus a daily digest).

pub mod classifier;
pub mod config;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod scheduler;
pub mod slack;
