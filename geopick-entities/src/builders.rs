pub trait Builder {
    type Build;
    fn build() -> Self::Build;
}

pub use self::{address_builder::*, prediction_builder::*};

pub mod prediction_builder {

    use super::*;
    use crate::place::*;

    #[derive(Debug)]
    pub struct PlacePredictionBuild {
        prediction: PlacePrediction,
    }

    impl PlacePredictionBuild {
        pub fn id(mut self, id: &str) -> Self {
            self.prediction.id = id.into();
            self
        }
        pub fn primary_text(mut self, text: &str) -> Self {
            self.prediction.primary_text = text.into();
            self
        }
        pub fn secondary_text(mut self, text: &str) -> Self {
            self.prediction.secondary_text = text.into();
            self
        }
        pub fn finish(self) -> PlacePrediction {
            self.prediction
        }
    }

    impl Builder for PlacePrediction {
        type Build = PlacePredictionBuild;
        fn build() -> PlacePredictionBuild {
            PlacePredictionBuild {
                prediction: PlacePrediction {
                    id: "".into(),
                    primary_text: "".into(),
                    secondary_text: "".into(),
                },
            }
        }
    }
}

pub mod address_builder {

    use super::*;
    use crate::address::*;

    #[derive(Debug)]
    pub struct AddressBuild {
        addr: Address,
    }

    impl AddressBuild {
        pub fn line(mut self, x: &str) -> Self {
            self.addr.line = Some(x.into());
            self
        }
        pub fn street(mut self, x: &str) -> Self {
            self.addr.street = Some(x.into());
            self
        }
        pub fn zip(mut self, x: &str) -> Self {
            self.addr.zip = Some(x.into());
            self
        }
        pub fn city(mut self, x: &str) -> Self {
            self.addr.city = Some(x.into());
            self
        }
        pub fn country(mut self, x: &str) -> Self {
            self.addr.country = Some(x.into());
            self
        }
        pub fn state(mut self, x: &str) -> Self {
            self.addr.state = Some(x.into());
            self
        }
        pub fn finish(self) -> Address {
            self.addr
        }
    }

    impl Builder for Address {
        type Build = AddressBuild;
        fn build() -> Self::Build {
            AddressBuild {
                addr: Address::default(),
            }
        }
    }

    #[test]
    fn empty_address() {
        assert!(Address::default().is_empty());
        assert!(!Address::build().line("x").finish().is_empty());
        assert!(!Address::build().street("x").finish().is_empty());
        assert!(!Address::build().zip("x").finish().is_empty());
        assert!(!Address::build().city("x").finish().is_empty());
        assert!(!Address::build().country("x").finish().is_empty());
        assert!(!Address::build().state("x").finish().is_empty());
    }
}
