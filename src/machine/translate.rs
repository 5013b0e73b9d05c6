//! Source notation to container translation.
//!
//! The source notation is an eight-symbol alphabet (`+ - > < [ ] . ,`)
//! mapping one-to-one onto the opcode set; every other character is
//! commentary and is dropped. Translation feeds the run-length writer, so
//! repeated symbols come out compressed on the wire.
//!
//! The notation has no way to express a tape limit, so callers supply one
//! (conventionally [`DEFAULT_TAPE_LIMIT`](crate::machine::program::DEFAULT_TAPE_LIMIT)).

use crate::machine::nibble::RunWriter;
use crate::machine::opcode::Opcode;
use crate::machine::program::Program;

/// Translates source notation into a container with the given tape limit.
pub fn translate_source(source: &str, tape_limit: u32) -> Program {
    let mut writer = RunWriter::new();
    for symbol in source.chars() {
        if let Some(op) = Opcode::from_symbol(symbol) {
            writer.push(op);
        }
    }
    Program::new(tape_limit, writer)
}
