use thiserror::Error;

/// Why a byte buffer can't be read as an ABI type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayError {
    #[error("buffer too short: need {needed} bytes, have {available}")]
    TooShort { needed: usize, available: usize },

    #[error("buffer at {address:#x} is not aligned to {align} bytes")]
    Misaligned { align: usize, address: usize },

    #[error("offset {offset} is past the end of a {len}-byte buffer")]
    OutOfBounds { offset: usize, len: usize },
}
