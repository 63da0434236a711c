//! Errors shared by the transport, protocol and CLI layers.

/// Errors that can occur while talking to the keyboard
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No vendor-page collection of a supported board was found
    #[error("device not found")]
    DeviceNotFound,

    /// A received report did not have the fixed frame length
    #[error("malformed frame: expected 20 bytes, got {0}")]
    MalformedFrame(usize),

    /// The config read returned fewer fragments than expected
    #[error("incomplete config read: {received}/{expected} fragments")]
    IncompleteReadBuffer { received: usize, expected: usize },

    /// No echo arrived for a transmitted frame
    #[error("no echo received")]
    EchoTimeout,

    /// Key or group name not in the key map
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    /// Per-key request without any `KEY:COLOR` pair
    #[error("no keys given, provide KEY:COLOR pairs")]
    NoKeys,

    /// Color string could not be parsed
    #[error("invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// Effect number outside the built-in range
    #[error("unknown effect {0}, valid: 1-18")]
    InvalidEffect(u8),

    /// Sleep timer not one of the supported values
    #[error("invalid sleep time {0}, valid: 0, 5, 10, 15")]
    InvalidSleep(u8),

    /// Numeric parameter above its maximum
    #[error("{field} must be 0-{max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u8,
        max: u8,
    },

    /// Raw frame input could not be decoded
    #[error("invalid raw frame: {0}")]
    InvalidRaw(String),

    /// HID communication error
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),
}

impl Error {
    /// Errors caused by user input, raised before any device I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownKey(_)
                | Error::NoKeys
                | Error::InvalidColor(_)
                | Error::InvalidEffect(_)
                | Error::InvalidSleep(_)
                | Error::OutOfRange { .. }
                | Error::InvalidRaw(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
