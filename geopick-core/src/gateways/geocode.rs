use std::future::Future;

use geopick_entities::{address::Address, geo::Coordinate};

pub trait GeoCodingGateway {
    /// Resolve a position into candidate addresses, best match first.
    ///
    /// An empty list means that no address was found.
    fn reverse_geocode(
        &self,
        pos: Coordinate,
    ) -> impl Future<Output = anyhow::Result<Vec<Address>>> + Send;
}
