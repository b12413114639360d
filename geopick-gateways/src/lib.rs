//! Concrete location, geocoding and places providers.

pub mod device;
pub mod google_places;
pub mod nominatim;
pub mod opencage;

use std::time::Duration;

const USER_AGENT: &str = concat!("geopick/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

fn http_client(timeout: Option<Duration>) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .build()?;
    Ok(client)
}
