//! Errors reported by the measurement core.

use crate::process::Uid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("invalid setting {name}: must be a positive integer, got {value}")]
    InvalidSetting { name: &'static str, value: u64 },

    #[error("Invalid tag: {0}")]
    TagNotFound(String),

    #[error("process with uid {0} not found")]
    UidNotFound(Uid),
}
