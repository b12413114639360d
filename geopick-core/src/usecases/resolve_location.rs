use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::watch;

use super::prelude::*;
use crate::gateways::{location::LocationGateway, permission::PermissionGateway};

/// The permission that is needed to read the device position.
pub const LOCATION_PERMISSION: PermissionKind = PermissionKind::FineLocation;

/// Outcome of asking for the current device position.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocationFix {
    /// Nobody asked yet.
    #[default]
    Unknown,
    /// The user has not answered the permission prompt yet.
    Pending,
    Present(Coordinate),
    Absent(Error),
}

impl LocationFix {
    pub const fn pos(&self) -> Option<Coordinate> {
        match self {
            Self::Present(pos) => Some(*pos),
            _ => None,
        }
    }

    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Permission-gated access to the device position.
///
/// If the permission is missing the resolver asks for it and reports
/// [`Error::PermissionDenied`] right away. Once the user grants the
/// permission the position is fetched without another explicit call
/// and published to all subscribers.
///
/// Only the most recent call publishes its outcome.
pub struct LocationResolver<P, L> {
    permissions: Arc<P>,
    locations: Arc<L>,
    fix: Arc<watch::Sender<LocationFix>>,
    latest: Arc<AtomicU64>,
}

impl<P, L> Clone for LocationResolver<P, L> {
    fn clone(&self) -> Self {
        Self {
            permissions: Arc::clone(&self.permissions),
            locations: Arc::clone(&self.locations),
            fix: Arc::clone(&self.fix),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl<P, L> std::fmt::Debug for LocationResolver<P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("fix", &*self.fix.borrow())
            .finish_non_exhaustive()
    }
}

impl<P, L> LocationResolver<P, L>
where
    P: PermissionGateway + Send + Sync + 'static,
    L: LocationGateway + Send + Sync + 'static,
{
    pub fn new(permissions: Arc<P>, locations: Arc<L>) -> Self {
        let (fix, _) = watch::channel(LocationFix::Unknown);
        Self {
            permissions,
            locations,
            fix: Arc::new(fix),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn fix(&self) -> LocationFix {
        self.fix.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationFix> {
        self.fix.subscribe()
    }

    /// Resolve the current device position.
    ///
    /// Without permission this returns immediately and triggers exactly
    /// one permission request. [`LocationFix::Pending`] is published until
    /// the request is answered, the outcome follows through
    /// [`Self::subscribe`] later on.
    pub async fn resolve_current_location(&self) -> LocationFix {
        let permission = self.permissions.check(LOCATION_PERMISSION);
        if permission.is_granted() {
            let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            let fix = acquire(&*self.locations).await;
            publish(&self.fix, &self.latest, seq, fix.clone());
            return fix;
        }
        log::info!("Location permission is {permission}: asking the user");
        // Publish before the request is spawned so that a fast answer
        // can never be overwritten.
        let mut seq = 0;
        self.fix.send_modify(|fix| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *fix = LocationFix::Pending;
        });
        let permissions = Arc::clone(&self.permissions);
        let locations = Arc::clone(&self.locations);
        let fix_tx = Arc::clone(&self.fix);
        let latest = Arc::clone(&self.latest);
        tokio::spawn(async move {
            let fix = match permissions.request(LOCATION_PERMISSION).await {
                PermissionState::Granted => {
                    log::debug!("Location permission granted: fetching position");
                    acquire(&*locations).await
                }
                answer => {
                    log::warn!("Location permission request answered with {answer}");
                    LocationFix::Absent(Error::PermissionDenied)
                }
            };
            publish(&fix_tx, &latest, seq, fix);
        });
        LocationFix::Absent(Error::PermissionDenied)
    }
}

fn publish(fix_tx: &watch::Sender<LocationFix>, latest: &AtomicU64, seq: u64, fix: LocationFix) {
    let published = fix_tx.send_if_modified(|current| {
        if latest.load(Ordering::SeqCst) != seq {
            return false;
        }
        *current = fix;
        true
    });
    if !published {
        log::debug!("Discarding stale location fix #{seq}");
    }
}

async fn acquire<L>(locations: &L) -> LocationFix
where
    L: LocationGateway,
{
    match locations.last_known_location().await {
        Ok(Some(pos)) => {
            log::debug!("Received device position {pos}");
            LocationFix::Present(pos)
        }
        Ok(None) => {
            log::warn!("Location is null");
            LocationFix::Absent(Error::ProviderUnavailable(
                "No last known location".to_string(),
            ))
        }
        Err(err) => {
            log::warn!("Error getting location: {err:#}");
            LocationFix::Absent(Error::provider_unavailable(&err))
        }
    }
}
