//! IO devices to read and write data from.
use crate::error::{DeviceError, FrameCheckError};
use crate::Frame;
use bytes::BytesMut;
use std::io;
use std::marker::PhantomData;

/// Byte source a listener polls from.
///
/// Reads must never block. A read returns immediately with whatever is available, possibly
/// nothing.
pub trait Transport {
    /// Number of bytes that can be read right now.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to `buf.len()` of the available bytes.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Lifecycle of a consumer attached to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Closed,
}

/// Counters kept by a listener across polls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStats {
    pub polls: u64,
    pub bytes: u64,
    pub frames: u64,
    pub read_errors: u64,
}

/// Listener on IO device
///
/// Allows to read frames from device stream.
pub struct FramedListener<P, F> {
    port: Option<P>,
    buffer: BytesMut,
    stats: ListenerStats,
    frame_type: PhantomData<F>,
}

impl<P, F: Frame> FramedListener<P, F> {
    pub fn new(port: P) -> FramedListener<P, F> {
        FramedListener {
            port: Some(port),
            // Allocate buffer with 256 bytes
            buffer: BytesMut::with_capacity(256),
            stats: ListenerStats::default(),
            frame_type: PhantomData,
        }
    }

    /// Bytes received but not yet resolved into a complete frame.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    pub fn state(&self) -> ConnectionState {
        match self.port {
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Closed,
        }
    }

    /// Release the port. Later polls fail with `DeviceError::Closed`.
    pub fn close(&mut self) -> Option<P> {
        self.port.take()
    }

    fn next_frame(&mut self) -> Option<Result<F, F::Error>> {
        match F::check(&mut self.buffer) {
            Ok(frame_data) => {
                self.stats.frames += 1;
                Some(F::parse(frame_data))
            }
            Err(FrameCheckError::Incomplete) => None,
        }
    }
}

impl<P: Transport, F: Frame> FramedListener<P, F> {
    /// Append all bytes currently available on the port and return the complete frames.
    ///
    /// The returned iterator is lazy: frames are cut from the buffer as it is advanced. Frames
    /// not consumed before the iterator is dropped stay in the buffer and are yielded by the
    /// next poll. On a read error the buffer is left unchanged.
    pub fn poll(&mut self) -> Result<Frames<'_, P, F>, DeviceError> {
        let Some(port) = self.port.as_mut() else {
            return Err(DeviceError::Closed);
        };
        self.stats.polls += 1;
        match Self::fill(port, &mut self.buffer) {
            Ok(n) => {
                self.stats.bytes += n as u64;
                Ok(Frames { listener: self })
            }
            Err(e) => {
                self.stats.read_errors += 1;
                Err(DeviceError::Read(e))
            }
        }
    }

    fn fill(port: &mut P, buffer: &mut BytesMut) -> io::Result<usize> {
        let available = port.bytes_available()?;
        if available == 0 {
            return Ok(0);
        }
        let mut chunk = vec![0u8; available];
        let n = port.read_available(&mut chunk)?;
        buffer.extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}

/// Frames cut from a listener's buffer during one poll.
pub struct Frames<'a, P, F> {
    listener: &'a mut FramedListener<P, F>,
}

impl<P, F: Frame> Iterator for Frames<'_, P, F> {
    type Item = Result<F, F::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.listener.next_frame()
    }
}

/// Serial devices such as USB
pub mod serial {
    use super::Transport;
    use serialport::SerialPort;
    use std::io::{self, Read};

    impl Transport for Box<dyn SerialPort> {
        fn bytes_available(&mut self) -> io::Result<usize> {
            Ok(self.bytes_to_read()? as usize)
        }

        fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.read(buf) {
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
                other => other,
            }
        }
    }
}


pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum DeviceError {
        #[error("Could not open serial port {port}")]
        Open {
            port: String,
            #[source]
            source: serialport::Error,
        },
        #[error("Failed to read from device: {0}")]
        Read(#[from] std::io::Error),
        #[error("Connection to device is closed")]
        Closed,
    }

    impl DeviceError {
        /// Underlying cause, without the context added by this crate.
        pub fn detail(&self) -> String {
            match self {
                DeviceError::Open { source, .. } => source.to_string(),
                DeviceError::Read(e) => e.to_string(),
                DeviceError::Closed => self.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::mock::MockTransport;
    use super::{ConnectionState, FramedListener, ListenerStats};
    use crate::error::DeviceError;
    use crate::protocol::Line;
    use std::io;

    fn lines(listener: &mut FramedListener<MockTransport, Line>) -> Vec<String> {
        listener
            .poll()
            .unwrap()
            .map(|line| line.unwrap().into_string())
            .collect()
    }

    #[test]
    fn test_poll_yields_complete_lines() {
        let mut port = MockTransport::new();
        port.push("Setup complete\r\n1000,1.0,2.0,3.0,4.0,0.5,-0.5\r\n");
        let mut listener = FramedListener::<_, Line>::new(port);

        assert_eq!(
            lines(&mut listener),
            vec!["Setup complete", "1000,1.0,2.0,3.0,4.0,0.5,-0.5"]
        );
        assert!(listener.pending().is_empty());
    }

    #[test]
    fn test_line_split_across_polls() {
        let mut port = MockTransport::new();
        port.push("1000,1.0,2.").push("0,3.0,4.0,0.5,-0.5\n");
        let mut listener = FramedListener::<_, Line>::new(port);

        assert!(lines(&mut listener).is_empty());
        assert_eq!(listener.pending(), b"1000,1.0,2.");
        assert_eq!(lines(&mut listener), vec!["1000,1.0,2.0,3.0,4.0,0.5,-0.5"]);
    }

    #[test]
    fn test_blank_lines_are_never_yielded() {
        let mut port = MockTransport::new();
        port.push("\n  \r\n\t\nTaring...\n\n");
        let mut listener = FramedListener::<_, Line>::new(port);

        assert_eq!(lines(&mut listener), vec!["Taring..."]);
    }

    #[test]
    fn test_whitespace_only_lines_are_never_yielded() {
        let mut port = MockTransport::new();
        port.push("\x0b\n\u{a0}\n\u{a0}1000,1,2,3,4,5,6\u{a0}\n");
        let mut listener = FramedListener::<_, Line>::new(port);

        assert_eq!(lines(&mut listener), vec!["1000,1,2,3,4,5,6"]);
    }

    #[test]
    fn test_closed_listener_rejects_polls() {
        let mut port = MockTransport::new();
        port.push("Setup complete\n");
        let mut listener = FramedListener::<_, Line>::new(port);
        assert_eq!(listener.state(), ConnectionState::Connected);

        assert!(listener.close().is_some());
        assert_eq!(listener.state(), ConnectionState::Closed);
        assert!(matches!(listener.poll(), Err(DeviceError::Closed)));
        assert!(listener.close().is_none());
        assert_eq!(listener.stats().polls, 0);
    }

    #[test]
    fn test_poll_without_data_yields_nothing() {
        let mut listener = FramedListener::<_, Line>::new(MockTransport::new());
        assert!(lines(&mut listener).is_empty());
        assert_eq!(listener.stats().polls, 1);
    }

    #[test]
    fn test_read_error_leaves_buffer_unchanged() {
        let mut port = MockTransport::new();
        port.push("partial")
            .push_error(io::ErrorKind::BrokenPipe)
            .push(" line\n");
        let mut listener = FramedListener::<_, Line>::new(port);

        assert!(lines(&mut listener).is_empty());
        assert!(matches!(listener.poll(), Err(DeviceError::Read(_))));
        assert_eq!(listener.pending(), b"partial");
        assert_eq!(lines(&mut listener), vec!["partial line"]);
        assert_eq!(
            listener.stats(),
            ListenerStats {
                polls: 3,
                bytes: 13,
                frames: 1,
                read_errors: 1
            }
        );
    }

    #[test]
    fn test_unconsumed_frames_survive_until_next_poll() {
        let mut port = MockTransport::new();
        port.push("a\nb\nc\n");
        let mut listener = FramedListener::<_, Line>::new(port);

        let first = listener.poll().unwrap().next();
        assert_eq!(first.map(|l| l.unwrap().into_string()), Some("a".into()));
        assert_eq!(lines(&mut listener), vec!["b", "c"]);
    }

    #[test]
    fn test_framing_is_lossless_and_ordered() {
        let input = "Setup complete\nFormat: TIME,F1,F2,F3,F4,COPx,COPy\n\
                     1,0.1,0.2,0.3,0.4,1.5,-2.5\n2,1.1,1.2,1.3,1.4,0.0,3.25\ntrailing";
        let bytes = input.as_bytes();

        for chunk_size in [1, 2, 3, 5, 7, 11, 64] {
            let mut port = MockTransport::new();
            for chunk in bytes.chunks(chunk_size) {
                port.push(chunk);
            }
            let mut listener = FramedListener::<_, Line>::new(port);

            let mut yielded = Vec::new();
            for _ in 0..bytes.len() {
                yielded.extend(lines(&mut listener));
            }
            for line in &yielded {
                assert!(!line.contains('\n'));
            }

            let mut rebuilt = yielded.join("\n");
            rebuilt.push('\n');
            rebuilt.push_str(std::str::from_utf8(listener.pending()).unwrap());
            assert_eq!(rebuilt, input, "chunk size {chunk_size}");
        }
    }
}
