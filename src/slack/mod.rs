//! Slack connectivity — Web API client and Socket Mode transport.

pub mod api;
pub mod socket;
pub mod types;

pub use api::{ChatApi, SlackWebApi};
pub use socket::SocketModeListener;
