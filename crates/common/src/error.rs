use thiserror::Error;

/// Failure to parse one of the string-encoded LoRaWAN primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid DevEUI {0:?}: expected 16 hex characters")]
    DevEui(String),

    #[error("unknown region common name {0:?}")]
    CommonName(String),

    #[error("unsupported MAC version {0:?}")]
    MacVersion(String),

    #[error("unknown regional parameters revision {0:?}")]
    Revision(String),
}
