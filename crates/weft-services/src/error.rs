//! Service error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown preference: {0}")]
    UnknownPref(String),

    #[error("Preference {name} expects a {expected} value")]
    PrefTypeMismatch { name: String, expected: &'static str },
}
