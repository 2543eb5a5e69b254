use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Build a client with a descriptive User-Agent and an optional timeout.
pub fn build_client(user_agent: &str, timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(secs) = timeout_secs.filter(|s| *s > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to build HTTP client")
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
