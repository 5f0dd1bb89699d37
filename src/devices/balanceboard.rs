use crate::{error::*, Frame};
use bytes::BytesMut;
use serialport::{ClearBuffer, SerialPort};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

/// Baud rate of the device. The balance board firmware talks at 115.2 KBd
pub const BAUD_RATE: u32 = 115_200;

/// Number of comma separated fields in a data line: `TIME,F1,F2,F3,F4,COPx,COPy`
pub const FIELD_COUNT: usize = 7;

/// Prefixes of the messages the firmware prints while it sets up and tares the load cells.
pub const DIAGNOSTIC_PREFIXES: [&str; 5] = ["Setup", "Taring", "Format", "Force", "Calculating"];

const FIELD_NAMES: [&str; FIELD_COUNT] = ["TIME", "F1", "F2", "F3", "F4", "COPx", "COPy"];

/// Open the serial port in non-blocking mode and drop whatever is already queued on it.
pub fn open_port(path: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, DeviceError> {
    let open = || -> serialport::Result<Box<dyn SerialPort>> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::ZERO)
            .open()?;
        port.clear(ClearBuffer::Input)?;
        Ok(port)
    };
    open().map_err(|source| DeviceError::Open {
        port: path.to_string(),
        source,
    })
}

/// Parse a data line, ignoring anything that is not a valid reading.
pub fn parse(line: &str) -> Option<Telemetry> {
    line.parse().ok()
}

/// Single reading of the balance board
///
/// Forces are the load cell readings in Kg. The center of pressure is given in cm relative to
/// the center of the board.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub f4: f64,
    pub cop_x: f64,
    pub cop_y: f64,
}

impl Telemetry {
    /// Sum of all four forces.
    pub fn total_force(&self) -> f64 {
        self.f1 + self.f2 + self.f3 + self.f4
    }

    pub fn cop(&self) -> (f64, f64) {
        (self.cop_x, self.cop_y)
    }

    fn field(fields: &[&str], index: usize) -> Result<f64, TelemetryError> {
        let raw = fields[index].trim();
        raw.parse().map_err(|_| TelemetryError::InvalidNumber {
            field: FIELD_NAMES[index],
            value: raw.to_string(),
        })
    }
}

impl FromStr for Telemetry {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if DIAGNOSTIC_PREFIXES.iter().any(|prefix| s.starts_with(prefix)) {
            return Err(TelemetryError::Diagnostic(s.to_string()));
        }

        let fields: Vec<&str> = s.split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(TelemetryError::WrongNumberOfFields {
                count: fields.len(),
                line: s.to_string(),
            });
        }

        // TIME (field 0) is the firmware's millis() counter and not used.
        Ok(Telemetry {
            f1: Self::field(&fields, 1)?,
            f2: Self::field(&fields, 2)?,
            f3: Self::field(&fields, 3)?,
            f4: Self::field(&fields, 4)?,
            cop_x: Self::field(&fields, 5)?,
            cop_y: Self::field(&fields, 6)?,
        })
    }
}

impl Frame for Telemetry {
    type Error = TelemetryError;

    fn parse(buffer: BytesMut) -> Result<Self, TelemetryError> {
        String::from_utf8_lossy(&buffer).parse()
    }
}

impl Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "F1 {:.1} Kg, F2 {:.1} Kg, F3 {:.1} Kg, F4 {:.1} Kg, COP ({:.1}, {:.1}) cm",
            self.f1, self.f2, self.f3, self.f4, self.cop_x, self.cop_y
        )
    }
}

pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, PartialEq)]
    pub enum TelemetryError {
        #[error("Diagnostic message from device: {0}")]
        Diagnostic(String),
        #[error("Expected 7 fields, got {count}. Input: {line}")]
        WrongNumberOfFields { count: usize, line: String },
        #[error("Field {field} is not a number. Input: {value}")]
        InvalidNumber { field: &'static str, value: String },
    }

    impl TelemetryError {
        /// Whether the line is regular device chatter rather than a broken data line.
        pub fn is_diagnostic(&self) -> bool {
            matches!(self, TelemetryError::Diagnostic(_))
        }
    }
}
