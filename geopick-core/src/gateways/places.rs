use std::future::Future;

use geopick_entities::{
    place::{PlaceDetails, PlacePrediction},
    session::SessionToken,
};

pub trait PlacesGateway {
    /// Autocomplete predictions for a partial query in provider rank order.
    fn find_predictions(
        &self,
        query: &str,
        token: &SessionToken,
    ) -> impl Future<Output = anyhow::Result<Vec<PlacePrediction>>> + Send;

    fn fetch_place_details(
        &self,
        id: &str,
        token: Option<&SessionToken>,
    ) -> impl Future<Output = anyhow::Result<PlaceDetails>> + Send;
}
