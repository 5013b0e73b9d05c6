//! Opcode definitions for the nibble-packed instruction set.
//!
//! The [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical
//! opcode list and invokes a callback macro for code generation, so the wire
//! values, mnemonics, and source-notation symbols stay in one table.
//!
//! This module generates:
//! - The [`Opcode`] enum with its 3-bit wire values
//! - `TryFrom<u8>` for decoding nibbles
//! - The symbol table used by the source-notation translator
//!
//! # Wire Format
//!
//! An opcode occupies the low 3 bits of a nibble. Bit 3 ([`RUN_FLAG`]) marks
//! the nibble as the start of a compressed run: the following eight nibbles
//! hold a big-endian `u32` repeat count.

use crate::machine::errors::VmError;

/// Bit set on a nibble that opens a length-prefixed run.
pub const RUN_FLAG: u8 = 0x8;

/// Mask selecting the opcode bits of a nibble.
pub const OP_MASK: u8 = 0x7;

/// Invokes a callback macro with the complete opcode definition list.
///
/// Each row is `Name = wire value, mnemonic, source symbol`.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// `+` ; adds to the cell under the pointer (32-bit, wrapping)
            Inc = 0x0, "INC", '+',
            /// `-` ; subtracts from the cell under the pointer (32-bit, wrapping)
            Dec = 0x1, "DEC", '-',
            /// `>` ; moves the pointer right, modulo the tape length
            Right = 0x2, "RIGHT", '>',
            /// `<` ; moves the pointer left, modulo the tape length
            Left = 0x3, "LEFT", '<',
            /// `[` ; enters the loop body, or skips past the matching close when the cell is zero
            LoopOpen = 0x4, "OPEN", '[',
            /// `]` ; rescans back to the matching open while the cell is non-zero
            LoopClose = 0x5, "CLOSE", ']',
            /// `.` ; writes the cell's low byte to the output sink
            Output = 0x6, "OUT", '.',
            /// `,` ; reads one byte from the input source into the cell
            Input = 0x7, "IN", ',',
        }
    };
}

macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $value:literal, $mnemonic:literal, $symbol:literal
        ),* $(,)?
    ) => {
        /// One base operation of the tape machine.
        ///
        /// The wire representation is the low 3 bits of a nibble; the
        /// compressed-run flag is a wire detail and not part of this value.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $value,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = VmError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(Opcode::$name), )*
                    _ => Err(VmError::InvalidOpcode(value)),
                }
            }
        }

        impl Opcode {
            /// Returns the mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the source-notation character for this opcode.
            pub const fn symbol(&self) -> char {
                match self {
                    $( Opcode::$name => $symbol, )*
                }
            }

            /// Maps a source-notation character to its opcode.
            ///
            /// Any character outside the eight-symbol alphabet returns `None`;
            /// the translator treats those as commentary.
            pub fn from_symbol(symbol: char) -> Option<Opcode> {
                match symbol {
                    $( $symbol => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }
    };
}

for_each_opcode!(define_opcodes);
