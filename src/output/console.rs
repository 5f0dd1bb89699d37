//! Raw pass-through of device lines to a writer.

use crate::device::{ConnectionState, FramedListener, ListenerStats, Transport};
use crate::devices::balanceboard;
use crate::error::DeviceError;
use crate::protocol::Line;
use crate::session::Session;
use serialport::SerialPort;
use std::io::{self, Write};

/// Prints every line the device sends, without decoding it.
pub struct Receiver<P, W = io::Stdout> {
    listener: FramedListener<P, Line>,
    out: W,
}

impl Receiver<Box<dyn SerialPort>> {
    /// Open the serial port and print to stdout.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, DeviceError> {
        let port = balanceboard::open_port(path, baud_rate)?;
        Ok(Receiver::new(port, io::stdout()))
    }
}

impl<P: Transport, W: Write> Receiver<P, W> {
    pub fn new(port: P, out: W) -> Self {
        Receiver {
            listener: FramedListener::new(port),
            out,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.listener.state()
    }

    pub fn stats(&self) -> ListenerStats {
        self.listener.stats()
    }

    /// Poll the device once and write out all complete lines.
    ///
    /// Read errors are logged and otherwise ignored. Returns the number of lines written.
    pub fn tick(&mut self) -> io::Result<usize> {
        let frames = match self.listener.poll() {
            Ok(frames) => frames,
            Err(e) => {
                log::debug!("{e}");
                return Ok(0);
            }
        };

        let mut written = 0;
        for frame in frames {
            let line = match frame {
                Ok(line) => line,
                Err(never) => match never {},
            };
            writeln!(self.out, "{line}")?;
            written += 1;
        }
        if written > 0 {
            self.out.flush()?;
        }
        Ok(written)
    }

    /// Release the port. Ticks after this write nothing.
    pub fn close(&mut self) {
        if self.listener.close().is_some() {
            log::info!("Receiver closed after {:?}", self.listener.stats());
        }
    }

    pub fn into_writer(self) -> W {
        self.out
    }
}

impl<P: Transport, W: Write> Session for Receiver<P, W> {
    fn tick(&mut self) -> anyhow::Result<()> {
        Receiver::tick(self)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Receiver;
    use crate::device::{mock::MockTransport, ConnectionState};
    use std::io;

    #[test]
    fn test_lines_are_passed_through_unparsed() {
        let mut port = MockTransport::new();
        port.push("Setup complete\r\n1000,1.0,2.0,3.0,4.0,0.5,-0.5\r\n\r\n1,2,3\n");
        let mut receiver = Receiver::new(port, Vec::new());

        assert_eq!(receiver.tick().unwrap(), 3);
        assert_eq!(receiver.state(), ConnectionState::Connected);
        assert_eq!(
            String::from_utf8(receiver.into_writer()).unwrap(),
            "Setup complete\n1000,1.0,2.0,3.0,4.0,0.5,-0.5\n1,2,3\n"
        );
    }

    #[test]
    fn test_partial_line_is_printed_once_complete() {
        let mut port = MockTransport::new();
        port.push("1000,1.0,2").push(".0,3.0,4.0,0.5,-0.5\n");
        let mut receiver = Receiver::new(port, Vec::new());

        assert_eq!(receiver.tick().unwrap(), 0);
        assert_eq!(receiver.tick().unwrap(), 1);
        assert_eq!(
            String::from_utf8(receiver.into_writer()).unwrap(),
            "1000,1.0,2.0,3.0,4.0,0.5,-0.5\n"
        );
    }

    #[test]
    fn test_read_errors_are_swallowed() {
        let mut port = MockTransport::new();
        port.push_error(io::ErrorKind::Other).push("Taring\n");
        let mut receiver = Receiver::new(port, Vec::new());

        assert_eq!(receiver.tick().unwrap(), 0);
        assert_eq!(receiver.tick().unwrap(), 1);
        assert_eq!(receiver.stats().read_errors, 1);
    }

    #[test]
    fn test_close_releases_port() {
        let mut port = MockTransport::new();
        port.push("Setup complete\n");
        let mut receiver = Receiver::new(port, Vec::new());

        receiver.close();
        assert_eq!(receiver.state(), ConnectionState::Closed);
        assert_eq!(receiver.tick().unwrap(), 0);
        assert!(receiver.into_writer().is_empty());
    }
}
