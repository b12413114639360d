//! Stand-ins for the platform services of a handset.

use geopick_core::{
    entities::*,
    gateways::{location::LocationGateway, permission::PermissionGateway},
};
use parking_lot::Mutex;

/// A last known position that never changes.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    pos: Option<Coordinate>,
}

impl FixedLocation {
    pub const fn new(pos: Option<Coordinate>) -> Self {
        Self { pos }
    }
}

impl LocationGateway for FixedLocation {
    async fn last_known_location(&self) -> anyhow::Result<Option<Coordinate>> {
        Ok(self.pos)
    }
}

/// Permissions with a preset state and a preset answer to every prompt.
#[derive(Debug)]
pub struct StaticPermission {
    state: Mutex<PermissionState>,
    answer: PermissionState,
}

impl StaticPermission {
    pub fn new(state: PermissionState, answer: PermissionState) -> Self {
        Self {
            state: Mutex::new(state),
            answer,
        }
    }
}

impl PermissionGateway for StaticPermission {
    fn check(&self, _: PermissionKind) -> PermissionState {
        *self.state.lock()
    }

    async fn request(&self, kind: PermissionKind) -> PermissionState {
        log::info!("Asking for {kind} permission: {}", self.answer);
        let mut state = self.state.lock();
        // a permission that has been granted once stays granted
        if !state.is_granted() {
            *state = self.answer;
        }
        *state
    }
}
