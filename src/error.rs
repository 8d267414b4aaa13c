//! Error types for acoustrace

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Allocation failed: {0}")]
    Allocation(String),

    #[error("Time bin {bin} is beyond the simulated duration ({max_bins} bins)")]
    BinOutOfRange { bin: usize, max_bins: usize },

    #[error("Mesh load error: {0}")]
    MeshLoad(String),

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`], mirroring the result codes callers
/// branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    InvalidArgument,
    Allocation,
    OutOfRange,
    Load,
}

impl Error {
    pub fn code(&self) -> ResultCode {
        match self {
            Error::InvalidArgument(_) => ResultCode::InvalidArgument,
            Error::Allocation(_) => ResultCode::Allocation,
            Error::BinOutOfRange { .. } => ResultCode::OutOfRange,
            Error::MeshLoad(_) | Error::Scenario(_) | Error::Io(_) => ResultCode::Load,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    fn allocation(what: &str, err: TryReserveError) -> Self {
        Error::Allocation(format!("{what}: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reserves room for `additional` more elements, reporting failure as
/// [`Error::Allocation`] instead of aborting.
pub(crate) fn try_reserve<T>(vec: &mut Vec<T>, additional: usize, what: &str) -> Result<()> {
    vec.try_reserve(additional).map_err(|e| Error::allocation(what, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Error::invalid("x").code(), ResultCode::InvalidArgument);
        assert_eq!(
            Error::BinOutOfRange { bin: 3, max_bins: 2 }.code(),
            ResultCode::OutOfRange
        );
        assert_eq!(Error::MeshLoad("bad".into()).code(), ResultCode::Load);
    }

    #[test]
    fn test_try_reserve_overflow_is_allocation_error() {
        let mut v: Vec<u64> = Vec::new();
        let err = try_reserve(&mut v, usize::MAX, "voxels").unwrap_err();
        assert_eq!(err.code(), ResultCode::Allocation);
        assert!(err.to_string().contains("voxels"));
    }

    #[test]
    fn test_try_reserve_ok() {
        let mut v: Vec<u8> = Vec::new();
        try_reserve(&mut v, 16, "bins").unwrap();
        assert!(v.capacity() >= 16);
    }
}
