//! Consumers of the device stream.

pub use board::Visualizer;
pub use console::Receiver;

pub mod board;
pub mod console;
