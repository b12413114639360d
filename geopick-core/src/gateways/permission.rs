use std::future::Future;

use geopick_entities::permission::{PermissionKind, PermissionState};

pub trait PermissionGateway {
    fn check(&self, kind: PermissionKind) -> PermissionState;

    /// Ask the user for a permission.
    ///
    /// The future completes once the user answered the prompt.
    fn request(&self, kind: PermissionKind) -> impl Future<Output = PermissionState> + Send;
}
