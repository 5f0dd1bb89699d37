//! Module for creating data frames from the newline delimited text stream sent by the balance board.

use bytes::{Buf, BytesMut};
use std::convert::Infallible;
use std::fmt::{self, Display};

/// Trait for protocol frame objects.
pub trait Frame: Sized {
    /// Error returned if the frame payload can not be turned into a frame object.
    type Error;

    /// Check if a full frame is available in the buffer and returns it if possible.
    ///
    /// If a complete frame is in the buffer, the frames payload will be extracted and returned,
    /// and the frame data will be removed from the buffer.
    /// If no complete frame is found, the error FrameCheckError::Incomplete is returned.
    fn check(buffer: &mut BytesMut) -> Result<BytesMut, error::FrameCheckError> {
        split_line(buffer)
    }

    /// Consumes a buffer and returns the corresponding Frame object.
    fn parse(buffer: BytesMut) -> Result<Self, Self::Error>;
}

/// Splits the next non-empty line off the front of the buffer.
///
/// Everything up to and including the first line feed is removed from the buffer. The line is
/// decoded as UTF-8 (invalid bytes are replaced) and surrounding Unicode whitespace, including
/// a trailing `\r`, is trimmed. Lines that are empty after trimming are dropped and the search
/// continues with the next one.
pub fn split_line(buffer: &mut BytesMut) -> Result<BytesMut, error::FrameCheckError> {
    loop {
        let Some(i) = buffer.iter().position(|b| *b == b'\n') else {
            return Err(error::FrameCheckError::Incomplete);
        };
        let raw = buffer.split_to(i);
        buffer.advance(1);

        let text = String::from_utf8_lossy(&raw);
        let line = text.trim();
        if !line.is_empty() {
            return Ok(BytesMut::from(line.as_bytes()));
        }
    }
}

/// A single trimmed text line as sent by the device.
///
/// Bytes that are not valid UTF-8 are replaced instead of failing the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line(String);

impl Line {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Frame for Line {
    type Error = Infallible;

    fn parse(buffer: BytesMut) -> Result<Self, Infallible> {
        Ok(Line(String::from_utf8_lossy(&buffer).into_owned()))
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Line {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, PartialEq)]
    pub enum FrameCheckError {
        #[error("No complete frame in buffer")]
        Incomplete,
    }
}
