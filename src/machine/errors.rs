use mfvm_derive::Error;

/// Errors that can occur while parsing a container or executing it.
#[derive(Debug, Error)]
pub enum VmError {
    /// The first four bytes are not the container magic.
    #[error("bad magic: {found:02x?}")]
    BadMagic { found: [u8; 4] },
    /// A header field holds a value the machine refuses to honor.
    #[error("invalid header field {field}: {value}")]
    InvalidHeaderField { field: &'static str, value: u32 },
    /// The payload is shorter than the header declares.
    #[error("truncated payload: expected {expected} bytes, found {actual}")]
    TruncatedPayload { expected: usize, actual: usize },
    /// Bytes remain after the declared payload.
    #[error("{0} trailing bytes after declared payload")]
    TrailingData(usize),
    /// A compressed run's count field is cut off by the end of the stream.
    #[error("truncated run: count field cut off at nibble {offset}")]
    TruncatedRun { offset: u64 },
    /// A compressed run declares a repeat count of zero.
    #[error("empty run at nibble {offset}")]
    EmptyRun { offset: u64 },
    /// A nibble value outside the opcode range.
    #[error("invalid opcode value {0}")]
    InvalidOpcode(u8),
    /// A loop bracket has no partner in the code stream.
    #[error("unbalanced brackets at nibble {offset}")]
    UnbalancedBrackets { offset: u64 },
    /// Execution was cancelled from outside before it could finish.
    #[error("execution interrupted")]
    Interrupted,
}
