use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Builds the shared client with an explicit timeout. Later calls are no-ops;
/// the first configuration wins.
pub fn init_http_client(timeout: Option<Duration>) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| build_client(timeout))
}

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| build_client(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS))))
}

fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    // reqwest's blocking client defaults to 30s; `None` has to be set explicitly.
    builder = builder.timeout(timeout);
    builder.build().context("failed to build http client")
}
