use crate::config;
use anyhow::anyhow;
use geopick_core::{
    entities::*,
    gateways::{geocode::GeoCodingGateway, places::PlacesGateway},
    usecases::{AddressLookup, LocationPicker, LocationResolver, PlaceSearchSession},
};
use geopick_gateways::{
    device::{FixedLocation, StaticPermission},
    google_places::GooglePlaces,
    nominatim::Nominatim,
    opencage::OpenCage,
};
use std::{sync::Arc, time::Duration};

pub type Picker = LocationPicker<StaticPermission, FixedLocation, GeoCodingGw, PlacesGw>;

/// Must be called within a tokio runtime.
pub fn location_picker(cfg: &config::Config) -> anyhow::Result<Picker> {
    let config::Device {
        position,
        permission,
        permission_answer,
    } = cfg.device;
    let permissions = StaticPermission::new(permission, permission_answer);
    let locations = FixedLocation::new(position);
    let geocoding = geocoding_gateway(&cfg.geocoding, cfg.http.timeout)?;
    let places = places_gateway(&cfg.places, cfg.http.timeout)?;
    Ok(LocationPicker::new(
        LocationResolver::new(Arc::new(permissions), Arc::new(locations)),
        AddressLookup::new(Arc::new(geocoding)),
        PlaceSearchSession::new(Arc::new(places)),
    ))
}

pub fn geocoding_gateway(
    cfg: &config::Geocoding,
    timeout: Option<Duration>,
) -> anyhow::Result<GeoCodingGw> {
    let gw = match &cfg.gateway {
        Some(config::GeocodingGateway::OpenCage { api_key }) => {
            log::info!("Use OpenCage geocoding gateway");
            GeoCodingGw::OpenCage(OpenCage::new(Some(api_key.clone())))
        }
        Some(config::GeocodingGateway::Nominatim { base_url }) => {
            log::info!("Use Nominatim geocoding gateway");
            GeoCodingGw::Nominatim(Nominatim::new(base_url.clone(), timeout)?)
        }
        None => {
            log::warn!("No geocoding gateway was configured");
            GeoCodingGw::Dummy(DummyGeoCodingGw)
        }
    };
    Ok(gw)
}

pub fn places_gateway(
    cfg: &config::Places,
    timeout: Option<Duration>,
) -> anyhow::Result<PlacesGw> {
    let gw = match &cfg.gateway {
        Some(config::PlacesGateway::GooglePlaces { api_key, base_url }) => {
            log::info!("Use Google Places gateway");
            PlacesGw::GooglePlaces(GooglePlaces::new(
                api_key.clone(),
                base_url.clone(),
                timeout,
            )?)
        }
        None => {
            log::warn!("No places gateway was configured");
            PlacesGw::Dummy(DummyPlacesGw)
        }
    };
    Ok(gw)
}

#[derive(Debug)]
pub struct DummyGeoCodingGw;

impl GeoCodingGateway for DummyGeoCodingGw {
    async fn reverse_geocode(&self, pos: Coordinate) -> anyhow::Result<Vec<Address>> {
        log::debug!(
            "Cannot resolve the address of {pos} because no geocoding gateway was configured"
        );
        Err(anyhow!("No geocoding gateway configured"))
    }
}

#[derive(Debug)]
pub struct DummyPlacesGw;

impl PlacesGateway for DummyPlacesGw {
    async fn find_predictions(
        &self,
        query: &str,
        _: &SessionToken,
    ) -> anyhow::Result<Vec<PlacePrediction>> {
        log::debug!("Cannot search for '{query}' because no places gateway was configured");
        Err(anyhow!("No places gateway configured"))
    }

    async fn fetch_place_details(
        &self,
        id: &str,
        _: Option<&SessionToken>,
    ) -> anyhow::Result<PlaceDetails> {
        log::debug!("Cannot fetch place {id} because no places gateway was configured");
        Err(anyhow!("No places gateway configured"))
    }
}

#[derive(Debug)]
pub enum GeoCodingGw {
    OpenCage(OpenCage),
    Nominatim(Nominatim),
    Dummy(DummyGeoCodingGw),
}

impl GeoCodingGateway for GeoCodingGw {
    async fn reverse_geocode(&self, pos: Coordinate) -> anyhow::Result<Vec<Address>> {
        match self {
            Self::OpenCage(gw) => gw.reverse_geocode(pos).await,
            Self::Nominatim(gw) => gw.reverse_geocode(pos).await,
            Self::Dummy(gw) => gw.reverse_geocode(pos).await,
        }
    }
}

#[derive(Debug)]
pub enum PlacesGw {
    GooglePlaces(GooglePlaces),
    Dummy(DummyPlacesGw),
}

impl PlacesGateway for PlacesGw {
    async fn find_predictions(
        &self,
        query: &str,
        token: &SessionToken,
    ) -> anyhow::Result<Vec<PlacePrediction>> {
        match self {
            Self::GooglePlaces(gw) => gw.find_predictions(query, token).await,
            Self::Dummy(gw) => gw.find_predictions(query, token).await,
        }
    }

    async fn fetch_place_details(
        &self,
        id: &str,
        token: Option<&SessionToken>,
    ) -> anyhow::Result<PlaceDetails> {
        match self {
            Self::GooglePlaces(gw) => gw.fetch_place_details(id, token).await,
            Self::Dummy(gw) => gw.fetch_place_details(id, token).await,
        }
    }
}
