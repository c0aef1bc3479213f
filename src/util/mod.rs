/// Address and offset types for the inspected process.
pub mod address;
/// Compressed integer streams.
pub mod compressed_stream;
/// Constants used throughout the crate.
pub mod constants;
/// Calculation, conversion and alignment of sizes.
pub mod conversions;
/// The built-in logger.
pub mod logger;
/// Run-time options.
pub mod options;

pub use self::address::Address;
pub use self::address::ByteOffset;
pub use self::address::ByteSize;
