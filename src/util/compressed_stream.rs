//! Variable-length integer streams.
//!
//! Oop map values are stored as a byte stream of small integers. Each integer is written as a
//! sequence of bytes carrying 7 payload bits each, least significant group first, with the high
//! bit of every byte except the last one set. Signed integers are zig-zag mapped first so that
//! small negative stack offsets stay short.
//!
//! A [`CompressedReadStream`] is a private cursor over a borrowed, immutable buffer. It is
//! created for a single decoding pass and thrown away afterwards, so any number of threads may
//! read the same buffer at the same time.

use crate::error::{Error, Result};
use crate::util::constants::{
    COMPRESSED_CONTINUATION_BIT, COMPRESSED_PAYLOAD_BITS, COMPRESSED_PAYLOAD_MASK,
    MAX_COMPRESSED_BYTES,
};

/// Map a signed value onto an unsigned one so that values of small magnitude get small codes:
/// 0, -1, 1, -2, 2 ... become 0, 1, 2, 3, 4 ...
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// The inverse of [`zigzag_encode`].
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Decode one unsigned compressed integer from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
///
/// # Errors
/// [`Error::MalformedEncoding`] if `bytes` ends before a byte without the continuation bit, or
/// if the integer does not fit in 64 bits.
pub fn decode_uint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut stream = CompressedReadStream::new(bytes);
    let value = stream.read_uint()?;
    Ok((value, stream.position()))
}

/// Encode `value` and append it to `out`. Returns the number of bytes written.
pub fn encode_uint(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    loop {
        let low = (value as u8) & COMPRESSED_PAYLOAD_MASK;
        value >>= COMPRESSED_PAYLOAD_BITS;
        if value == 0 {
            out.push(low);
            return out.len() - start;
        }
        out.push(low | COMPRESSED_CONTINUATION_BIT);
    }
}

/// A forward-only reader of compressed integers over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct CompressedReadStream<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> CompressedReadStream<'a> {
    /// Start reading at the beginning of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// The offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Has every byte been consumed?
    pub fn is_at_end(&self) -> bool {
        self.position == self.buffer.len()
    }

    /// Read one raw byte.
    ///
    /// # Errors
    /// [`Error::MalformedEncoding`] at the end of the buffer.
    pub fn read_u8(&mut self) -> Result<u8> {
        match self.buffer.get(self.position) {
            Some(&byte) => {
                self.position += 1;
                Ok(byte)
            }
            None => Err(Error::MalformedEncoding {
                offset: self.position,
            }),
        }
    }

    /// Read one unsigned compressed integer.
    ///
    /// On error the cursor is left where it was, so the caller can still report the offset at
    /// which the bad integer starts.
    ///
    /// # Errors
    /// [`Error::MalformedEncoding`] if the buffer ends before the terminating byte, or the
    /// encoding is longer than a `u64` allows.
    pub fn read_uint(&mut self) -> Result<u64> {
        let start = self.position;
        let malformed = Error::MalformedEncoding { offset: start };
        let mut value = 0u64;
        let mut shift = 0u32;
        let mut cursor = start;

        loop {
            let Some(&byte) = self.buffer.get(cursor) else {
                return Err(malformed);
            };
            cursor += 1;

            let payload = u64::from(byte & COMPRESSED_PAYLOAD_MASK);
            // The last legal group only has room for the top bit of a u64.
            if shift == COMPRESSED_PAYLOAD_BITS * (MAX_COMPRESSED_BYTES as u32 - 1) && payload > 1 {
                return Err(malformed);
            }
            value |= payload << shift;

            if byte & COMPRESSED_CONTINUATION_BIT == 0 {
                break;
            }

            shift += COMPRESSED_PAYLOAD_BITS;
            if cursor - start >= MAX_COMPRESSED_BYTES {
                return Err(malformed);
            }
        }

        self.position = cursor;
        Ok(value)
    }

    /// Read one zig-zag encoded signed integer.
    ///
    /// # Errors
    /// Same as [`Self::read_uint`].
    pub fn read_int(&mut self) -> Result<i64> {
        self.read_uint().map(zigzag_decode)
    }
}

/// A growable buffer of compressed integers. Only used while an oop map is being built; a
/// finished map never carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedWriteStream {
    buffer: Vec<u8>,
}

impl CompressedWriteStream {
    /// An empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty stream with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Append one raw byte.
    pub fn write_u8(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    /// Append an unsigned compressed integer.
    pub fn write_uint(&mut self, value: u64) {
        encode_uint(value, &mut self.buffer);
    }

    /// Append a zig-zag encoded signed integer.
    pub fn write_int(&mut self, value: i64) {
        self.write_uint(zigzag_encode(value));
    }

    /// Finish writing and take the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
