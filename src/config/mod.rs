use anyhow::{anyhow, Result};
use geopick_core::entities::{Coordinate, PermissionState};
use std::{env, fs, io::ErrorKind, path::Path, time::Duration};

mod raw;

const DEFAULT_CONFIG_FILE_NAME: &str = "geopick.toml";

const ENV_NAME_OPENCAGE_API_KEY: &str = "OPENCAGE_API_KEY";
const ENV_NAME_GOOGLE_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";

#[derive(Debug)]
pub struct Config {
    pub geocoding: Geocoding,
    pub places: Places,
    pub device: Device,
    pub http: Http,
}

impl Config {
    pub fn try_load_from_file_or_default<P: AsRef<Path>>(file_path: Option<P>) -> Result<Self> {
        let file_path: &Path = file_path.as_ref().map(|p| p.as_ref()).unwrap_or_else(|| {
            log::info!("No configuration file specified. load {DEFAULT_CONFIG_FILE_NAME}");
            Path::new(DEFAULT_CONFIG_FILE_NAME)
        });

        let mut raw_config = match fs::read_to_string(file_path) {
            Ok(cfg_string) => toml::from_str(&cfg_string)?,
            Err(err) => match err.kind() {
                ErrorKind::NotFound => {
                    log::info!(
                        "{} not found => load default configuration.",
                        file_path.display()
                    );
                    Ok(raw::Config::default())
                }
                _ => Err(err),
            }?,
        };
        override_api_keys_from_env(&mut raw_config);
        Self::try_from(raw_config)
    }
}

fn override_api_keys_from_env(cfg: &mut raw::Config) {
    let gateway = cfg.gateway.get_or_insert_with(Default::default);
    if let Ok(api_key) = env::var(ENV_NAME_OPENCAGE_API_KEY) {
        gateway
            .opencage
            .get_or_insert_with(Default::default)
            .api_key = Some(api_key);
    }
    if let Ok(api_key) = env::var(ENV_NAME_GOOGLE_MAPS_API_KEY) {
        gateway
            .google_places
            .get_or_insert_with(Default::default)
            .api_key = Some(api_key);
    }
}

#[derive(Debug)]
pub struct Geocoding {
    pub gateway: Option<GeocodingGateway>,
}

#[derive(Debug, Clone)]
pub enum GeocodingGateway {
    OpenCage { api_key: String },
    Nominatim { base_url: Option<String> },
}

#[derive(Debug)]
pub struct Places {
    pub gateway: Option<PlacesGateway>,
}

#[derive(Debug, Clone)]
pub enum PlacesGateway {
    GooglePlaces {
        api_key: String,
        base_url: Option<String>,
    },
}

/// Stand-in for the location services of a handset.
#[derive(Debug)]
pub struct Device {
    /// The last known position, if any.
    pub position: Option<Coordinate>,
    pub permission: PermissionState,
    pub permission_answer: PermissionState,
}

#[derive(Debug)]
pub struct Http {
    pub timeout: Option<Duration>,
}

impl TryFrom<raw::Config> for Config {
    type Error = anyhow::Error;
    fn try_from(from: raw::Config) -> Result<Self> {
        let raw::Config {
            geocoding,
            places,
            device,
            http,
            gateway,
        } = from;

        let gateway = gateway.unwrap_or_default();

        let geo_gateway = match geocoding.unwrap_or_default().gateway {
            Some(raw::GeocodingGateway::Opencage) => {
                let api_key = gateway
                    .opencage
                    .and_then(|gw| gw.api_key)
                    .filter(|key| !key.trim().is_empty());
                match api_key {
                    Some(api_key) => Some(GeocodingGateway::OpenCage { api_key }),
                    None => {
                        log::warn!("No OpenCage API key found");
                        None
                    }
                }
            }
            Some(raw::GeocodingGateway::Nominatim) => {
                let raw::Nominatim { base_url } = gateway.nominatim.unwrap_or_default();
                Some(GeocodingGateway::Nominatim { base_url })
            }
            None => None,
        };
        let geocoding = Geocoding {
            gateway: geo_gateway,
        };

        let places_gateway = match places.unwrap_or_default().gateway {
            Some(raw::PlacesGateway::GooglePlaces) => {
                let raw::GooglePlaces { api_key, base_url } =
                    gateway.google_places.unwrap_or_default();
                match api_key.filter(|key| !key.trim().is_empty()) {
                    Some(api_key) => Some(PlacesGateway::GooglePlaces { api_key, base_url }),
                    None => {
                        log::warn!("No Google Maps API key found");
                        None
                    }
                }
            }
            None => None,
        };
        let places = Places {
            gateway: places_gateway,
        };

        let raw::Device {
            position,
            permission,
            permission_answer,
        } = device.unwrap_or_default();
        let position = position
            .map(|raw::Position { lat, lng }| {
                Coordinate::try_from_lat_lng_deg(lat, lng)
                    .ok_or_else(|| anyhow!("Invalid device position: {lat},{lng}"))
            })
            .transpose()?;
        let device = Device {
            position,
            permission: parse_permission(permission)?,
            permission_answer: parse_permission(permission_answer)?,
        };

        let raw::Http { timeout } = http.unwrap_or_default();
        let http = Http { timeout };

        Ok(Self {
            geocoding,
            places,
            device,
            http,
        })
    }
}

fn parse_permission(state: Option<String>) -> Result<PermissionState> {
    let Some(state) = state else {
        return Ok(PermissionState::default());
    };
    state
        .parse()
        .map_err(|_| anyhow!("Invalid permission state '{state}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<Config> {
        let raw: raw::Config = toml::from_str(toml)?;
        Config::try_from(raw)
    }

    #[test]
    fn load_default_config() {
        let cfg = Config::try_from(raw::Config::default()).unwrap();
        assert!(matches!(
            cfg.geocoding.gateway,
            Some(GeocodingGateway::Nominatim { .. })
        ));
        assert_eq!(
            cfg.device.position,
            Some(Coordinate::from_lat_lng_deg(23.344, 85.296))
        );
        assert_eq!(cfg.device.permission, PermissionState::NotDetermined);
        assert_eq!(cfg.device.permission_answer, PermissionState::Granted);
        assert_eq!(cfg.http.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn load_missing_file() {
        let cfg = Config::try_load_from_file_or_default(Some("does-not-exist.toml"));
        assert!(cfg.is_ok());
    }

    #[test]
    fn opencage_without_api_key() {
        let cfg = from_toml(
            r#"
            [geocoding]
            gateway = "opencage"
            "#,
        )
        .unwrap();
        assert!(cfg.geocoding.gateway.is_none());
    }

    #[test]
    fn google_places_with_api_key() {
        let cfg = from_toml(
            r#"
            [places]
            gateway = "google-places"

            [gateway.google-places]
            api-key = "secret"
            "#,
        )
        .unwrap();
        let Some(PlacesGateway::GooglePlaces { api_key, base_url }) = cfg.places.gateway else {
            panic!("Google Places gateway expected");
        };
        assert_eq!(api_key, "secret");
        assert!(base_url.is_none());
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let cfg = from_toml(
            r#"
            [places]
            gateway = "google-places"

            [gateway.google-places]
            api-key = "  "
            "#,
        )
        .unwrap();
        assert!(cfg.places.gateway.is_none());
    }

    #[test]
    fn device_without_position() {
        let cfg = from_toml(
            r#"
            [device]
            permission = "denied"
            "#,
        )
        .unwrap();
        assert!(cfg.device.position.is_none());
        assert_eq!(cfg.device.permission, PermissionState::Denied);
        assert_eq!(cfg.device.permission_answer, PermissionState::NotDetermined);
    }

    #[test]
    fn reject_invalid_device_config() {
        assert!(from_toml(
            r#"
            [device]
            position = { lat = 91.0, lng = 0.0 }
            "#,
        )
        .is_err());
        assert!(from_toml(
            r#"
            [device]
            permission = "maybe"
            "#,
        )
        .is_err());
    }
}
