/// Errors produced while recording samples.
///
/// Every error is local to the call that produced it: no state is mutated
/// when one is returned, and later samples record normally.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// NaN and ±infinity would corrupt `total` and `max`, so they are refused.
    #[error("sample value must be finite, got {value}")]
    InvalidSample { value: f64 },
    /// Adding the sample would push a running total past `f64::MAX`.
    #[error("sample {value} would overflow running total {total}")]
    TotalOverflow { total: f64, value: f64 },
}

/// Reject values that cannot be accumulated.
pub(crate) fn validate(value: f64) -> Result<f64, Error> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidSample { value })
    }
}
