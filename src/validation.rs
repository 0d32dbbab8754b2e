#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use crate::error::LoadError;

pub const MAX_PERCENTAGE: i64 = 100;

pub fn validate_percentage(percentage: i64) -> Result<u32, LoadError> {
    if !(0..=MAX_PERCENTAGE).contains(&percentage) {
        return Err(LoadError::invalid(
            "percentage",
            format!("{percentage} is outside 0..=100"),
        ));
    }
    u32::try_from(percentage).map_err(|e| LoadError::invalid("percentage", e.to_string()))
}

pub fn validate_non_negative(name: &'static str, value: i64) -> Result<u64, LoadError> {
    u64::try_from(value).map_err(|_| LoadError::invalid(name, format!("{value} must be >= 0")))
}

/// Upper bound on lanes per load; each lane is an OS thread.
pub const MAX_LANES: u64 = 4096;

pub fn validate_lanes(lanes: i64) -> Result<usize, LoadError> {
    let lanes = validate_non_negative("lanes", lanes)?;
    if lanes > MAX_LANES {
        return Err(LoadError::invalid(
            "lanes",
            format!("{lanes} exceeds the limit of {MAX_LANES}"),
        ));
    }
    usize::try_from(lanes).map_err(|e| LoadError::invalid("lanes", e.to_string()))
}
