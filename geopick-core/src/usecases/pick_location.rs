use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::{sync::watch, task::JoinHandle};

use super::{
    prelude::*, AddressLookup, AddressState, LocationFix, LocationResolver, PlaceSearchSession,
};
use crate::gateways::{
    geocode::GeoCodingGateway, location::LocationGateway, permission::PermissionGateway,
    places::PlacesGateway,
};

/// Where the map looks at before anything else is known.
pub const DEFAULT_MAP_LOCATION: Coordinate = Coordinate::from_lat_lng_deg(23.344, 85.296);

pub const ADDRESS_NOT_AVAILABLE: &str = "Address not available";
pub const ADDRESS_ERROR: &str = "Error fetching address";

/// Picking a location on a map.
///
/// Ties together the device position, the place search and the address
/// lookup: the map location follows every device fix and every selected
/// place, the marker follows taps as well.
pub struct LocationPicker<P, L, G, S> {
    resolver: LocationResolver<P, L>,
    lookup: AddressLookup<G>,
    search: PlaceSearchSession<S>,
    map_location: Arc<watch::Sender<Coordinate>>,
    marker: Arc<watch::Sender<Option<Coordinate>>>,
    // Counts taps and selections, the latest one decides the marker.
    latest_pick: AtomicU64,
    follow_fixes: JoinHandle<()>,
}

impl<P, L, G, S> std::fmt::Debug for LocationPicker<P, L, G, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationPicker")
            .field("map_location", &*self.map_location.borrow())
            .field("marker", &*self.marker.borrow())
            .field("lookup", &self.lookup)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl<P, L, G, S> Drop for LocationPicker<P, L, G, S> {
    fn drop(&mut self) {
        self.follow_fixes.abort();
    }
}

impl<P, L, G, S> LocationPicker<P, L, G, S>
where
    P: PermissionGateway + Send + Sync + 'static,
    L: LocationGateway + Send + Sync + 'static,
    G: GeoCodingGateway + Send + Sync + 'static,
    S: PlacesGateway + Send + Sync + 'static,
{
    /// Must be called within a tokio runtime.
    pub fn new(
        resolver: LocationResolver<P, L>,
        lookup: AddressLookup<G>,
        search: PlaceSearchSession<S>,
    ) -> Self {
        let (map_location, _) = watch::channel(DEFAULT_MAP_LOCATION);
        let (marker, _) = watch::channel(None);
        let map_location = Arc::new(map_location);
        let marker = Arc::new(marker);
        let follow_fixes = tokio::spawn(follow_fixes(
            resolver.subscribe(),
            Arc::clone(&map_location),
            Arc::clone(&marker),
        ));
        Self {
            resolver,
            lookup,
            search,
            map_location,
            marker,
            latest_pick: AtomicU64::new(0),
            follow_fixes,
        }
    }

    pub const fn resolver(&self) -> &LocationResolver<P, L> {
        &self.resolver
    }

    pub const fn lookup(&self) -> &AddressLookup<G> {
        &self.lookup
    }

    pub const fn search(&self) -> &PlaceSearchSession<S> {
        &self.search
    }

    pub fn map_location(&self) -> Coordinate {
        *self.map_location.borrow()
    }

    pub fn subscribe_map_location(&self) -> watch::Receiver<Coordinate> {
        self.map_location.subscribe()
    }

    pub fn marker(&self) -> Option<Coordinate> {
        *self.marker.borrow()
    }

    pub fn subscribe_marker(&self) -> watch::Receiver<Option<Coordinate>> {
        self.marker.subscribe()
    }

    /// Center the map on the device position.
    pub async fn locate_me(&self) -> LocationFix {
        let fix = self.resolver.resolve_current_location().await;
        if let Some(pos) = fix.pos() {
            self.map_location.send_replace(pos);
            self.marker.send_replace(Some(pos));
        }
        fix
    }

    /// Place the marker and look up its address.
    pub fn tap(&self, pos: Coordinate) -> JoinHandle<()> {
        self.latest_pick.fetch_add(1, Ordering::SeqCst);
        self.marker.send_replace(Some(pos));
        self.lookup.submit(pos)
    }

    /// Move map and marker to `pos` and look up its address.
    pub fn move_to(&self, pos: Coordinate) -> JoinHandle<()> {
        self.map_location.send_replace(pos);
        self.tap(pos)
    }

    /// Resolve a prediction and move map and marker there.
    ///
    /// Nothing moves if the user tapped or selected something else while
    /// the place details were loading.
    pub async fn select_prediction(&self, id: &str) -> Result<Coordinate> {
        let seq = self.latest_pick.fetch_add(1, Ordering::SeqCst) + 1;
        let pos = self.search.on_prediction_selected(id).await?;
        if self.latest_pick.load(Ordering::SeqCst) == seq {
            self.move_to(pos);
        } else {
            log::debug!("Ignoring outdated selection of place {id}");
        }
        Ok(pos)
    }

    /// The address line that should be shown for the marker.
    ///
    /// While a lookup is loading the line of the previous one is kept.
    pub fn address_line(&self) -> String {
        let state = match self.lookup.state() {
            AddressState::Loading => self.lookup.settled(),
            state => state,
        };
        match state {
            AddressState::Success(addr) => addr
                .display_line()
                .unwrap_or_else(|| ADDRESS_NOT_AVAILABLE.to_string()),
            AddressState::Error(_) => ADDRESS_ERROR.to_string(),
            AddressState::Idle | AddressState::Loading => ADDRESS_NOT_AVAILABLE.to_string(),
        }
    }

    /// The current pick, `None` if no marker has been placed yet.
    pub fn picked_location(&self) -> Option<Location> {
        let pos = self.marker()?;
        let address = self.lookup.state().success().cloned();
        Some(Location { pos, address })
    }
}

async fn follow_fixes(
    mut fixes: watch::Receiver<LocationFix>,
    map_location: Arc<watch::Sender<Coordinate>>,
    marker: Arc<watch::Sender<Option<Coordinate>>>,
) {
    while fixes.changed().await.is_ok() {
        let pos = fixes.borrow_and_update().pos();
        if let Some(pos) = pos {
            log::debug!("Following device position {pos}");
            map_location.send_replace(pos);
            marker.send_replace(Some(pos));
        }
    }
}
