extern crate anyhow;

// Rexport main API
pub use device::{FramedListener, Transport};
pub use devices::balanceboard::{parse, Telemetry};
pub use protocol::{Frame, Line};

pub mod device;
pub mod devices;
pub mod output;
pub mod protocol;
pub mod render;
pub mod session;
pub mod trail;

/// Rexports all error types
pub mod error {
    pub use crate::device::error::*;
    pub use crate::devices::balanceboard::error::*;
    pub use crate::protocol::error::*;
}
