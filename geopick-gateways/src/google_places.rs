use std::time::Duration;

use anyhow::anyhow;
use geopick_core::{entities::*, gateways::places::PlacesGateway};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://places.googleapis.com/v1";

const DETAILS_FIELD_MASK: &str = "id,displayName,location";

/// Autocomplete and place details based on the Google Places API (New).
#[derive(Debug, Clone)]
pub struct GooglePlaces {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GooglePlaces {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = super::http_client(timeout)?;
        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AutocompleteRequest<'a> {
    input: &'a str,
    session_token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    place_prediction: Option<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    place_id: String,
    text: Option<FormattableText>,
    structured_format: Option<StructuredFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredFormat {
    main_text: Option<FormattableText>,
    secondary_text: Option<FormattableText>,
}

#[derive(Debug, Deserialize)]
struct FormattableText {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Place {
    id: Option<String>,
    display_name: Option<LocalizedText>,
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: JsonError,
}

#[derive(Debug, Deserialize, thiserror::Error)]
#[error("{message}")]
struct JsonError {
    message: String,
}

async fn json_or_error<T>(response: reqwest::Response) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await?;
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(ErrorResponse { error }) => Err(error.into()),
        Err(_) => Err(anyhow!("Places API responded with status {status}")),
    }
}

impl PlacesGateway for GooglePlaces {
    async fn find_predictions(
        &self,
        query: &str,
        token: &SessionToken,
    ) -> anyhow::Result<Vec<PlacePrediction>> {
        let url = format!("{}/places:autocomplete", self.base_url);
        let request = AutocompleteRequest {
            input: query,
            session_token: token.as_str(),
        };
        let response = self
            .client
            .post(url)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response: AutocompleteResponse = json_or_error(response).await?;
        Ok(predictions_from_response(response))
    }

    async fn fetch_place_details(
        &self,
        id: &str,
        token: Option<&SessionToken>,
    ) -> anyhow::Result<PlaceDetails> {
        let url = format!("{}/places/{id}", self.base_url);
        let mut request = self
            .client
            .get(url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", DETAILS_FIELD_MASK);
        if let Some(token) = token {
            request = request.query(&[("sessionToken", token.as_str())]);
        }
        let place: Place = json_or_error(request.send().await?).await?;
        details_from_place(id, place)
    }
}

fn predictions_from_response(response: AutocompleteResponse) -> Vec<PlacePrediction> {
    response
        .suggestions
        .into_iter()
        // query predictions have no place id
        .filter_map(|s| s.place_prediction)
        .map(|p| {
            let Prediction {
                place_id,
                text,
                structured_format,
            } = p;
            let (main, secondary) = structured_format
                .map(|f| (f.main_text, f.secondary_text))
                .unwrap_or((None, None));
            let primary_text = main.or(text).map(|t| t.text).unwrap_or_default();
            let secondary_text = secondary.map(|t| t.text).unwrap_or_default();
            PlacePrediction {
                id: place_id,
                primary_text,
                secondary_text,
            }
        })
        .collect()
}

fn details_from_place(id: &str, place: Place) -> anyhow::Result<PlaceDetails> {
    let Place {
        id: place_id,
        display_name,
        location,
    } = place;
    let location = location.ok_or_else(|| anyhow!("Place {id} has no location"))?;
    let pos = Coordinate::try_from_lat_lng_deg(location.latitude, location.longitude)
        .ok_or_else(|| anyhow!("Place {id} has an invalid location"))?;
    Ok(PlaceDetails {
        id: place_id.unwrap_or_else(|| id.to_string()),
        pos,
        name: display_name.map(|n| n.text),
    })
}
