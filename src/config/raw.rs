use duration_str::deserialize_option_duration;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = include_str!("geopick.default.toml");

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub geocoding: Option<Geocoding>,
    pub places: Option<Places>,
    pub device: Option<Device>,
    pub http: Option<Http>,
    pub gateway: Option<Gateway>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg: Self = toml::from_str(DEFAULT_CONFIG_FILE).expect("Default configuration");
        cfg
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Geocoding {
    pub gateway: Option<GeocodingGateway>,
}

impl Default for Geocoding {
    fn default() -> Self {
        Config::default()
            .geocoding
            .expect("Geocoding configuration")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeocodingGateway {
    Opencage,
    Nominatim,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Places {
    pub gateway: Option<PlacesGateway>,
}

impl Default for Places {
    fn default() -> Self {
        Config::default().places.expect("Places configuration")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacesGateway {
    GooglePlaces,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Device {
    pub position: Option<Position>,
    pub permission: Option<String>,
    pub permission_answer: Option<String>,
}

impl Default for Device {
    fn default() -> Self {
        Config::default().device.expect("Device configuration")
    }
}

#[derive(Clone, Copy, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Http {
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub timeout: Option<Duration>,
}

impl Default for Http {
    fn default() -> Self {
        Config::default().http.expect("HTTP configuration")
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Gateway {
    pub opencage: Option<OpenCage>,
    pub nominatim: Option<Nominatim>,
    pub google_places: Option<GooglePlaces>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpenCage {
    pub api_key: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Nominatim {
    pub base_url: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GooglePlaces {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}
