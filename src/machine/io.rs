//! Host-supplied byte channels for the `,` and `.` operations.
//!
//! The machine reads and writes single bytes against whatever the host
//! plugs in. Channel failures are deliberately invisible to the program:
//! end of input delivers a zero byte to the cell, and a sink that cannot
//! accept a byte drops it. Hosts needing strict failure semantics wrap
//! their channels before handing them over.

use std::io::{Read, Write};

/// Byte-oriented input source consumed by the `Input` opcode.
pub trait InputSource {
    /// Reads one byte, or `None` at end of input.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Byte-oriented output sink fed by the `Output` opcode.
pub trait OutputSink {
    /// Writes one byte. Failures are the sink's problem, not the machine's.
    fn write_byte(&mut self, byte: u8);
}

/// Adapts any [`Read`] into an [`InputSource`].
pub struct ReadInput<R: Read> {
    inner: R,
}

impl<R: Read> ReadInput<R> {
    /// Wraps the given reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> InputSource for ReadInput<R> {
    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buf[0]),
        }
    }
}

/// Adapts any [`Write`] into an [`OutputSink`].
///
/// Flushes after every byte so interactive programs stay responsive.
pub struct WriteOutput<W: Write> {
    inner: W,
}

impl<W: Write> WriteOutput<W> {
    /// Wraps the given writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> OutputSink for WriteOutput<W> {
    fn write_byte(&mut self, byte: u8) {
        if self.inner.write_all(&[byte]).is_ok() {
            let _ = self.inner.flush();
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Replays a fixed byte sequence, then reports end of input.
    pub struct TestInput {
        data: Vec<u8>,
        pos: usize,
    }

    impl TestInput {
        pub fn new(data: impl Into<Vec<u8>>) -> Self {
            Self {
                data: data.into(),
                pos: 0,
            }
        }

        pub fn empty() -> Self {
            Self::new(Vec::new())
        }
    }

    impl InputSource for TestInput {
        fn read_byte(&mut self) -> Option<u8> {
            let byte = self.data.get(self.pos).copied();
            if byte.is_some() {
                self.pos += 1;
            }
            byte
        }
    }

    /// Captures every byte the machine writes.
    #[derive(Default)]
    pub struct TestOutput {
        pub bytes: Vec<u8>,
    }

    impl TestOutput {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl OutputSink for TestOutput {
        fn write_byte(&mut self, byte: u8) {
            self.bytes.push(byte);
        }
    }

    #[test]
    fn read_input_reports_eof_as_none() {
        let mut input = ReadInput::new(&b"ab"[..]);
        assert_eq!(input.read_byte(), Some(b'a'));
        assert_eq!(input.read_byte(), Some(b'b'));
        assert_eq!(input.read_byte(), None);
    }

    #[test]
    fn write_output_passes_bytes_through() {
        let mut buf = Vec::new();
        {
            let mut output = WriteOutput::new(&mut buf);
            output.write_byte(b'x');
            output.write_byte(b'y');
        }
        assert_eq!(buf, b"xy");
    }

    #[test]
    fn test_input_replays_then_ends() {
        let mut input = TestInput::new(vec![1, 2]);
        assert_eq!(input.read_byte(), Some(1));
        assert_eq!(input.read_byte(), Some(2));
        assert_eq!(input.read_byte(), None);
        assert_eq!(input.read_byte(), None);
    }
}
