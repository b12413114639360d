use std::collections::HashMap;

use anyhow::anyhow;
use geocoding::{Opencage, Point};
use geopick_core::{entities::*, gateways::geocode::GeoCodingGateway};
use serde_json::Value;

/// Reverse geocoding based on opencagedata.com.
#[derive(Debug, Clone)]
pub struct OpenCage {
    api_key: Option<String>,
}

impl OpenCage {
    pub const fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }
}

impl GeoCodingGateway for OpenCage {
    async fn reverse_geocode(&self, pos: Coordinate) -> anyhow::Result<Vec<Address>> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(anyhow!("No OpenCage API key configured"));
        };
        // The client of the geocoding crate is blocking.
        tokio::task::spawn_blocking(move || reverse_geocode_blocking(api_key, pos)).await?
    }
}

fn reverse_geocode_blocking(api_key: String, pos: Coordinate) -> anyhow::Result<Vec<Address>> {
    let oc = Opencage::new(api_key);
    let point = Point::new(pos.lng(), pos.lat());
    let res = oc.reverse_full(&point)?;
    log::debug!(
        "OpenCage returned {} result(s) for {pos}",
        res.results.len()
    );
    let addresses = res
        .results
        .into_iter()
        .map(|r| address_from_components(r.formatted, &r.components))
        .collect();
    Ok(addresses)
}

fn component(components: &HashMap<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| components.get(*key).and_then(Value::as_str))
        .map(ToString::to_string)
}

fn address_from_components(formatted: String, components: &HashMap<String, Value>) -> Address {
    let road = component(components, &["road", "street", "pedestrian"]);
    let house_number = component(components, &["house_number"]);
    let street = match (road, house_number) {
        (Some(road), Some(nr)) => Some(format!("{road} {nr}")),
        (road, _) => road,
    };
    Address {
        line: Some(formatted),
        street,
        zip: component(components, &["postcode"]),
        city: component(components, &["city", "town", "village", "municipality"]),
        state: component(components, &["state", "region"]),
        country: component(components, &["country"]),
    }
}
