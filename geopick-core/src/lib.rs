//! # geopick-core
//!
//! Location and address resolution independent of any concrete
//! location service, geocoder, or places provider.

pub mod entities {
    pub use geopick_entities::{
        address::*, geo::*, location::*, permission::*, place::*, session::*,
    };
}

pub mod gateways;
pub mod usecases;
pub mod util;

pub use self::usecases::Error;
