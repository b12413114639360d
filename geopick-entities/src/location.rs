use crate::{address::*, geo::*};

/// A picked position together with the address that was resolved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub pos: Coordinate,
    pub address: Option<Address>,
}
