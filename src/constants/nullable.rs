//! What metadata knows about whether an element can hold null, so I'm not using an Option<bool> everywhere

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Nullable {
    Null,
    NotNull,
    Unknown,
}

impl Nullable {
    /// Whether a null may show up, unknown counts as yes.
    pub fn may_be_null(&self) -> bool {
        !matches!(self, Nullable::NotNull)
    }
}

impl Default for Nullable {
    fn default() -> Self {
        Nullable::Unknown
    }
}

impl From<bool> for Nullable {
    fn from(b: bool) -> Self {
        if b {
            Nullable::Null
        } else {
            Nullable::NotNull
        }
    }
}
