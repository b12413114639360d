/// A postal address resolved from a position.
///
/// `city` is the locality and `state` the region of the address.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub line    : Option<String>,
    pub street  : Option<String>,
    pub zip     : Option<String>,
    pub city    : Option<String>,
    pub country : Option<String>,
    pub state   : Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.line.is_none()
            && self.street.is_none()
            && self.zip.is_none()
            && self.city.is_none()
            && self.country.is_none()
            && self.state.is_none()
    }

    /// A single display line.
    ///
    /// Falls back to joining the individual components if the
    /// provider did not deliver a formatted line.
    pub fn display_line(&self) -> Option<String> {
        if let Some(line) = &self.line {
            return Some(line.clone());
        }
        let parts: Vec<_> = [
            &self.street,
            &self.zip,
            &self.city,
            &self.state,
            &self.country,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}
