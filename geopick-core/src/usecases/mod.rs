mod error;
mod lookup_address;
mod pick_location;
mod resolve_location;
mod response;
mod search_places;


pub use self::{
    error::Error, lookup_address::*, pick_location::*, resolve_location::*, response::*,
    search_places::*,
};

mod prelude {
    pub use super::error::Error;
    pub type Result<T> = std::result::Result<T, Error>;
    pub use super::response::ResponseState;
    pub use crate::entities::*;
}
