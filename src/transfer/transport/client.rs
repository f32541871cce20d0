//! HTTP client construction.

use reqwest::{Client, ClientBuilder};

use crate::transfer::config::EngineConfig;
use crate::user_agent;

/// Builds the shared client: connect timeout, gzip, User-Agent.
///
/// No whole-request timeout is set; long media transfers are bounded only by
/// the caller cancelling.
pub(super) fn build_client(config: &EngineConfig) -> Result<Client, reqwest::Error> {
    base_client_builder(config).build()
}

fn base_client_builder(config: &EngineConfig) -> ClientBuilder {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(user_agent::default_transfer_user_agent);
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .user_agent(user_agent)
}
