use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PermissionKind {
    FineLocation,
    CoarseLocation,
}

/// Permission state as reported by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    NotDetermined,
}

impl PermissionState {
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}
