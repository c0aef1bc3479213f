/// log2 of the number of bytes in an int
pub const LOG_BYTES_IN_INT: u8 = 2;
/// The number of bytes in an int. Oop map record header fields are ints.
pub const BYTES_IN_INT: usize = 1 << LOG_BYTES_IN_INT;

/// Payload bits carried by one byte of a compressed integer.
pub const COMPRESSED_PAYLOAD_BITS: u32 = 7;
/// Mask of the payload bits of one compressed byte.
pub const COMPRESSED_PAYLOAD_MASK: u8 = (1 << COMPRESSED_PAYLOAD_BITS) - 1;
/// The continuation flag of a compressed byte.
pub const COMPRESSED_CONTINUATION_BIT: u8 = 1 << COMPRESSED_PAYLOAD_BITS;
/// The longest legal compressed integer: ceil(64 / 7) bytes.
pub const MAX_COMPRESSED_BYTES: usize =
    (u64::BITS as usize).div_ceil(COMPRESSED_PAYLOAD_BITS as usize);
