use geopick_entities::address::Address;

/// Queries shorter than this never reach the places provider.
pub const MIN_QUERY_LEN: usize = 3;

pub trait AutoCorrect {
    fn auto_correct(self) -> Self;
}

pub fn is_searchable_query(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_LEN
}

fn non_empty(x: Option<String>) -> Option<String> {
    x.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

impl AutoCorrect for Address {
    fn auto_correct(mut self) -> Self {
        self.line = non_empty(self.line);
        self.street = non_empty(self.street);
        self.zip = non_empty(self.zip);
        self.city = non_empty(self.city);
        self.country = non_empty(self.country);
        self.state = non_empty(self.state);
        self
    }
}
