use std::future::Future;

use geopick_entities::geo::Coordinate;

pub trait LocationGateway {
    /// The last known position of the device, if there is any.
    fn last_known_location(
        &self,
    ) -> impl Future<Output = anyhow::Result<Option<Coordinate>>> + Send;
}
