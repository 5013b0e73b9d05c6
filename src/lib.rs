//! MinFuck bytecode toolkit.
//!
//! Provides the bytecode container codec, the nibble-stream writers and
//! reader, the tape-machine execution engine, and the source-notation
//! translator.

pub mod machine;
pub mod types;
pub mod utils;
