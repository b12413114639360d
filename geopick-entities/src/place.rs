use crate::geo::*;

/// A candidate place suggested for a partial search query.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacePrediction {
    pub id             : String,
    pub primary_text   : String,
    pub secondary_text : String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub id: String,
    pub pos: Coordinate,
    pub name: Option<String>,
}
