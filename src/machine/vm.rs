//! Core execution engine.
//!
//! The engine decodes one opcode run per step and applies it to the tape.
//! Loop brackets are paired by live scanning of the compressed stream in
//! either direction; no jump table is built. While a scan is active, runs
//! pass through untouched and only adjust the nesting depth.
//!
//! Run counts are honored without expansion wherever the semantics allow:
//! arithmetic and pointer runs collapse into a single wrapping update, and
//! bracket runs adjust the scan depth by their whole count at once. A close
//! run that overshoots the active depth has found its match partway through,
//! and because the pointer never moves during a scan the leftover closers in
//! that run resolve uniformly: forward scans started over a zero cell, so
//! they exit; backward scans started over a non-zero cell, so re-examined
//! opens are no-ops.

use crate::machine::errors::VmError;
use crate::machine::io::{InputSource, OutputSink};
use crate::machine::nibble::{Run, RunCursor};
use crate::machine::opcode::Opcode;
use crate::machine::program::Program;
use crate::machine::tape::Tape;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of a single step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// A run was processed; more may follow.
    Continue,
    /// The code stream is exhausted.
    Halted,
}

/// Bracket-scan state. Side effects never apply while a seek is active.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Skip {
    /// Normal execution.
    None,
    /// Scanning forward for the close bracket matching a skipped open.
    SeekClose,
    /// Scanning backward for the open bracket matching a taken close.
    SeekOpen,
}

/// The tape machine.
///
/// Owns its tape and a run cursor over the program's code buffer; input and
/// output channels are supplied by the host. One instance is a single
/// sequential state machine with no internal parallelism.
pub struct Vm<I: InputSource, O: OutputSink> {
    cursor: RunCursor,
    tape: Tape,
    skip: Skip,
    depth: u64,
    wide_compare: bool,
    input: I,
    output: O,
}

impl<I: InputSource, O: OutputSink> Vm<I, O> {
    /// Builds a machine for the given program, allocating and seeding its
    /// tape.
    ///
    /// Loop conditions default to testing the full 32-bit cell; see
    /// [`set_wide_compare`](Self::set_wide_compare).
    pub fn new(program: &Program, input: I, output: O) -> Self {
        Self {
            cursor: RunCursor::new(program.code().clone(), program.nibble_len()),
            tape: Tape::new(program.tape_limit()),
            skip: Skip::None,
            depth: 0,
            wide_compare: true,
            input,
            output,
        }
    }

    /// Selects whether loop conditions test the full 32-bit cell (`true`) or
    /// only its low byte (`false`, source-notation compatible).
    pub fn set_wide_compare(&mut self, wide: bool) {
        self.wide_compare = wide;
    }

    /// Returns the tape for inspection.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// True when the cell under the pointer tests as zero for loop control.
    fn cell_is_zero(&self) -> bool {
        let cell = self.tape.cell();
        if self.wide_compare {
            cell == 0
        } else {
            cell & 0xFF == 0
        }
    }

    /// Decodes and processes exactly one run.
    ///
    /// Reaching the end of the stream under normal execution halts the
    /// machine; reaching it mid-scan means a bracket has no partner.
    pub fn step(&mut self) -> Result<Step, VmError> {
        if self.cursor.eof() {
            return match self.skip {
                Skip::None => Ok(Step::Halted),
                Skip::SeekClose | Skip::SeekOpen => Err(VmError::UnbalancedBrackets {
                    offset: self.cursor.pos(),
                }),
            };
        }
        let run = self.cursor.current()?;
        match self.skip {
            Skip::None => self.exec(run)?,
            Skip::SeekClose => self.seek_close(run)?,
            Skip::SeekOpen => self.seek_open(run)?,
        }
        Ok(Step::Continue)
    }

    /// Applies one run under normal execution.
    fn exec(&mut self, run: Run) -> Result<(), VmError> {
        match run.op {
            Opcode::Inc => self.tape.add(run.count),
            Opcode::Dec => self.tape.sub(run.count),
            Opcode::Right => self.tape.seek_right(run.count),
            Opcode::Left => self.tape.seek_left(run.count),
            Opcode::Output => {
                let byte = (self.tape.cell() & 0xFF) as u8;
                for _ in 0..run.count {
                    self.output.write_byte(byte);
                }
            }
            Opcode::Input => {
                for _ in 0..run.count {
                    let byte = self.input.read_byte().unwrap_or(0);
                    self.tape.set_cell(byte as u32);
                }
            }
            Opcode::LoopOpen => {
                if self.cell_is_zero() {
                    // the first open starts the skip; the rest of the run
                    // nests inside it
                    self.skip = Skip::SeekClose;
                    self.depth = run.count as u64 - 1;
                }
            }
            Opcode::LoopClose => {
                if !self.cell_is_zero() {
                    self.skip = Skip::SeekOpen;
                    self.depth = 0;
                    if !self.cursor.retreat() {
                        return Err(VmError::UnbalancedBrackets {
                            offset: self.cursor.pos(),
                        });
                    }
                    return Ok(());
                }
            }
        }
        self.cursor.advance()
    }

    /// Consumes one run while scanning forward for a matching close bracket.
    fn seek_close(&mut self, run: Run) -> Result<(), VmError> {
        match run.op {
            Opcode::LoopOpen => self.depth += run.count as u64,
            Opcode::LoopClose => {
                let count = run.count as u64;
                if count <= self.depth {
                    self.depth -= count;
                } else {
                    // match found partway through the run; the cell tested
                    // zero to start the skip and nothing mutates during it,
                    // so any leftover closers in the run exit as no-ops
                    self.depth = 0;
                    self.skip = Skip::None;
                }
            }
            _ => {}
        }
        self.cursor.advance()
    }

    /// Consumes one run while scanning backward for a matching open bracket.
    fn seek_open(&mut self, run: Run) -> Result<(), VmError> {
        match run.op {
            Opcode::LoopClose => self.depth += run.count as u64,
            Opcode::LoopOpen => {
                let count = run.count as u64;
                if count > self.depth {
                    // match found; stay on this run so execution re-enters
                    // it forward. The surviving opens re-run as no-ops
                    // because the cell tested non-zero to start the scan.
                    self.depth = 0;
                    self.skip = Skip::None;
                    return Ok(());
                }
                self.depth -= count;
            }
            _ => {}
        }
        if !self.cursor.retreat() {
            return Err(VmError::UnbalancedBrackets {
                offset: self.cursor.pos(),
            });
        }
        Ok(())
    }

    /// Runs until the stream is exhausted or a fatal error occurs.
    pub fn run(&mut self) -> Result<(), VmError> {
        loop {
            if let Step::Halted = self.step()? {
                return Ok(());
            }
        }
    }

    /// Runs like [`run`](Self::run), polling the cancel flag once per
    /// completed step.
    ///
    /// Cancellation is not honored mid-step: a single huge compressed run or
    /// one leg of a bracket scan finishes before the flag is seen. A flag
    /// raised before the first step leaves the tape untouched.
    pub fn run_cancellable(&mut self, cancel: &AtomicBool) -> Result<(), VmError> {
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(VmError::Interrupted);
            }
            if let Step::Halted = self.step()? {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests;
