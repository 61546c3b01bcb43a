use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed container at offset {offset:#x}: {reason}")]
    MalformedContainer { offset: usize, reason: String },

    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("no SHDR/SHEX instruction chunk in container")]
    ChunkNotFound,

    #[error("insertion index {index} out of range (stream has {count} instructions)")]
    InvalidInsertionIndex { index: usize, count: usize },

    #[error("destination buffer too small (need {need} bytes, have {have})")]
    BufferTooSmall { need: usize, have: usize },

    #[error("inserted stream size {size} is not a multiple of 4 bytes")]
    InvalidStreamAlignment { size: usize },

    #[error("custom-data block (class {class}) at offset {offset:#x} is not supported")]
    UnsupportedOpcodeClass { offset: usize, class: u32 },
}

/// Failure category, one per patch outcome a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedContainer,
    ChunkNotFound,
    InvalidInsertionIndex,
    BufferTooSmall,
    InvalidStreamAlignment,
    UnsupportedOpcodeClass,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedContainer { .. } | Self::UnexpectedEof { .. } => {
                ErrorKind::MalformedContainer
            }
            Self::ChunkNotFound => ErrorKind::ChunkNotFound,
            Self::InvalidInsertionIndex { .. } => ErrorKind::InvalidInsertionIndex,
            Self::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            Self::InvalidStreamAlignment { .. } => ErrorKind::InvalidStreamAlignment,
            Self::UnsupportedOpcodeClass { .. } => ErrorKind::UnsupportedOpcodeClass,
        }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedContainer {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
