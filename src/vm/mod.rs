//! The target machine: registers, frame addressing, and the interface through which roots are
//! handed back to the runtime.
//!
//! Nothing in this module knows a particular architecture. Register numbers and stack slot
//! conventions are opaque values supplied by whoever describes the target.

mod frame;
mod register_map;
mod scanning;
mod vmreg;

pub use self::frame::FrameConvention;
pub use self::register_map::RegisterMap;
pub use self::scanning::RootVisitor;
pub use self::vmreg::Register;
