use std::time::Duration;

use geopick_core::{entities::*, gateways::geocode::GeoCodingGateway};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Reverse geocoding based on a Nominatim server.
#[derive(Debug, Clone)]
pub struct Nominatim {
    base_url: String,
    client: reqwest::Client,
}

impl Nominatim {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = super::http_client(timeout)?;
        Ok(Self { base_url, client })
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    display_name: Option<String>,
    address: Option<ReverseAddress>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl GeoCodingGateway for Nominatim {
    async fn reverse_geocode(&self, pos: Coordinate) -> anyhow::Result<Vec<Address>> {
        let url = format!("{}/reverse", self.base_url);
        let lat = pos.lat().to_string();
        let lon = pos.lng().to_string();
        let result: ReverseResult = self
            .client
            .get(url)
            .query(&[
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(addresses_from_result(result))
    }
}

fn addresses_from_result(result: ReverseResult) -> Vec<Address> {
    if let Some(err) = result.error {
        // Nominatim reports "Unable to geocode" for positions without an address.
        log::debug!("Nominatim: {err}");
        return vec![];
    }
    let ReverseResult {
        display_name,
        address,
        ..
    } = result;
    let mut addr = Address {
        line: display_name,
        ..Default::default()
    };
    if let Some(a) = address {
        addr.street = match (a.road, a.house_number) {
            (Some(road), Some(nr)) => Some(format!("{road} {nr}")),
            (road, _) => road,
        };
        addr.zip = a.postcode;
        addr.city = a.city.or(a.town).or(a.village);
        addr.state = a.state;
        addr.country = a.country;
    }
    if addr.is_empty() {
        vec![]
    } else {
        vec![addr]
    }
}
