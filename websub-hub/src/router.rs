//! `hub.mode` classification.

use std::fmt;
use std::str::FromStr;

use crate::params::{ParameterMap, HUB_MODE};

/// Body of the `400` sent when `hub.mode` is missing or unrecognised.
pub const INVALID_MODE_MESSAGE: &str = "The request does not include a valid `hub.mode` parameter.";

/// The five workflows a hub request can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Register,
    Deregister,
    Subscribe,
    Unsubscribe,
    Publish,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Register,
        Mode::Deregister,
        Mode::Subscribe,
        Mode::Unsubscribe,
        Mode::Publish,
    ];

    /// Wire value of this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Register => "register",
            Mode::Deregister => "deregister",
            Mode::Subscribe => "subscribe",
            Mode::Unsubscribe => "unsubscribe",
            Mode::Publish => "publish",
        }
    }

    /// Read `hub.mode` from the request parameters.
    ///
    /// An absent value and an unknown value are both `None`.
    pub fn from_params(params: &ParameterMap) -> Option<Mode> {
        params.get(HUB_MODE).and_then(|value| value.parse().ok())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised `hub.mode` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| UnknownMode(value.to_string()))
    }
}
