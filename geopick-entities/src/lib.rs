#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(test, deny(warnings))]

//! # geopick-entities
//!
//! Reusable, agnostic domain entities for geopick.
//!
//! The entities only contain generic functionality that does not reveal any application-specific business logic.

pub mod address;
pub mod geo;
pub mod location;
pub mod permission;
pub mod place;
pub mod session;

#[cfg(any(test, feature = "builders"))]
pub mod builders;
