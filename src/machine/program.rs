//! Bytecode container representation and serialization.
//!
//! A container wraps a packed nibble stream in a magic-tagged header:
//!
//! ```text
//! offset 0:  magic[4]           = FF 6D 66 FD
//! offset 4:  tape_limit  (u32, big-endian)
//! offset 8:  payload_len (u32, big-endian)
//! offset 12: payload[payload_len]
//! ```
//!
//! The payload length is carried explicitly, so trailing garbage cannot be
//! produced and truncation is always detectable. Parsing additionally walks
//! the payload's run structure once, which rejects a compressed run whose
//! count field is cut off and recovers the logical nibble count when the
//! final low nibble is padding.

use crate::machine::errors::VmError;
use crate::machine::nibble::{RunWriter, scan_stream};
use crate::types::bytes::Bytes;
use crate::types::encoding::{Decode, Encode};

/// Magic bytes identifying a serialized container.
pub const MAGIC: [u8; 4] = [0xFF, 0x6D, 0x66, 0xFD];

/// Highest tape limit a container may declare.
///
/// The machine allocates `2 * tape_limit + 3` cells of four bytes each, so an
/// unchecked header field would let a twelve-byte file demand gigabytes.
pub const MAX_TAPE_LIMIT: u32 = 1 << 24;

/// Tape limit used when the source notation does not specify one.
pub const DEFAULT_TAPE_LIMIT: u32 = 4096;

/// A parsed bytecode container.
///
/// Immutable once built; constructed by [`from_bytes`](Program::from_bytes)
/// or from a [`RunWriter`], and consumed to build an execution engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    tape_limit: u32,
    code: Bytes,
    nibble_len: u64,
}

impl Program {
    /// Builds a container from an encoded opcode stream.
    pub fn new(tape_limit: u32, writer: RunWriter) -> Self {
        let (code, nibble_len) = writer.finish();
        Self {
            tape_limit,
            code,
            nibble_len,
        }
    }

    /// Returns the highest logical tape address the program expects.
    pub fn tape_limit(&self) -> u32 {
        self.tape_limit
    }

    /// Returns the packed code buffer.
    pub fn code(&self) -> &Bytes {
        &self.code
    }

    /// Returns the logical nibble count of the code buffer.
    pub fn nibble_len(&self) -> u64 {
        self.nibble_len
    }

    /// Serializes the container to its wire format.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(12 + self.code.len());
        MAGIC.encode(&mut out);
        self.tape_limit.encode(&mut out);
        (self.code.len() as u32).encode(&mut out);
        out.extend_from_slice(&self.code);
        Bytes::from_vec(out)
    }

    /// Parses a container from its wire format.
    ///
    /// Validates the magic, the header fields, the declared payload length
    /// against the available bytes, and the payload's run structure.
    pub fn from_bytes(data: &[u8]) -> Result<Self, VmError> {
        let mut input = data;

        let magic = <[u8; 4]>::decode(&mut input).map_err(|_| VmError::TruncatedPayload {
            expected: MAGIC.len(),
            actual: data.len(),
        })?;
        if magic != MAGIC {
            return Err(VmError::BadMagic { found: magic });
        }

        let tape_limit = u32::decode(&mut input).map_err(|_| VmError::TruncatedPayload {
            expected: 4,
            actual: input.len(),
        })?;
        if tape_limit > MAX_TAPE_LIMIT {
            return Err(VmError::InvalidHeaderField {
                field: "tape_limit",
                value: tape_limit,
            });
        }

        let payload_len = u32::decode(&mut input).map_err(|_| VmError::TruncatedPayload {
            expected: 4,
            actual: input.len(),
        })? as usize;

        if input.len() < payload_len {
            return Err(VmError::TruncatedPayload {
                expected: payload_len,
                actual: input.len(),
            });
        }
        if input.len() > payload_len {
            return Err(VmError::TrailingData(input.len() - payload_len));
        }

        let code = Bytes::from(input);
        let nibble_len = scan_stream(&code)?;

        Ok(Self {
            tape_limit,
            code,
            nibble_len,
        })
    }
}
