//! Devices speaking the line based telemetry protocol.

pub use balanceboard::Telemetry;

pub mod balanceboard;
