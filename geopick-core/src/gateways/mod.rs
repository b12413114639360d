//! Ports to the outside world.
//!
//! Every gateway hands out futures that complete exactly once,
//! no matter how the underlying SDK reports its results.

pub mod geocode;
pub mod location;
pub mod permission;
pub mod places;
