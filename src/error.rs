//! Errors raised while decoding oop maps or reading oop map images.
//!
//! None of these are recoverable at this layer. A collector cannot proceed with a partial root
//! set, so every decoding entry point propagates the first error it sees and produces no roots
//! for that map. Whether an error is fatal to the process (a collector) or merely a diagnostic
//! (a debugger reading a foreign or corrupt image) is up to the caller.

use thiserror::Error;

/// Build an [`Error::Malformed`] with a formatted message.
macro_rules! malformed_error {
    ($msg:expr) => {
        crate::Error::Malformed($msg.to_string())
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed(format!($fmt, $($arg)*))
    };
}
pub(crate) use malformed_error;

/// Everything that can go wrong while decoding oop map data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A compressed integer ran past the end of its buffer without a terminating byte, or was
    /// longer than any 64-bit value can be.
    #[error("malformed compressed integer at byte {offset}")]
    MalformedEncoding {
        /// Offset of the first byte of the offending integer.
        offset: usize,
    },

    /// The number of decodable entries does not match the declared `omv_count`. Either the data
    /// ran out early, or bytes were left over after the last declared entry. This usually means
    /// corrupted metadata or an encoder/decoder version skew.
    #[error("oop map declares {declared} values but {decoded} were decoded with {trailing} bytes left over")]
    OmvCountMismatch {
        /// The count recorded in the map.
        declared: usize,
        /// The number of entries that decoded cleanly.
        decoded: usize,
        /// Bytes remaining once decoding stopped.
        trailing: usize,
    },

    /// A tag byte named a value kind this decoder does not know. Treating it as "not a root"
    /// would silently corrupt the heap, so it is always an error.
    #[error("unknown oop map value tag {tag:#04x} at byte {offset}")]
    UnknownValueKind {
        /// The raw tag byte.
        tag: u8,
        /// Offset of the tag byte.
        offset: usize,
    },

    /// A well-formed integer does not fit the field it encodes (a register number beyond `u16`,
    /// or a stack offset beyond `isize`).
    #[error("value at byte {offset} is out of range for its field")]
    ValueOutOfRange {
        /// Offset of the first byte of the offending integer.
        offset: usize,
    },

    /// An oop map image is too short for the structure being read from it.
    #[error("read at byte {offset} is out of bounds of a {len} byte image")]
    OutOfBounds {
        /// Offset of the attempted read.
        offset: usize,
        /// Length of the image.
        len: usize,
    },

    /// No oop map is recorded for the requested pc offset.
    #[error("no oop map at pc offset {0:#x}")]
    NoOopMapAtOffset(u32),

    /// The structure of an oop map image is inconsistent.
    #[error("malformed oop map image: {0}")]
    Malformed(String),
}

/// `Result` specialized to this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
