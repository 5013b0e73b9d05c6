use super::*;
use crate::machine::io::tests::{TestInput, TestOutput};
use crate::machine::nibble::RunWriter;
use crate::machine::translate::translate_source;

fn program_with_limit(tape_limit: u32, runs: &[(Opcode, u32)]) -> Program {
    let mut writer = RunWriter::new();
    for &(op, count) in runs {
        writer.push_run(op, count);
    }
    Program::new(tape_limit, writer)
}

fn program_of(runs: &[(Opcode, u32)]) -> Program {
    program_with_limit(4, runs)
}

fn vm_for(program: &Program) -> Vm<TestInput, TestOutput> {
    Vm::new(program, TestInput::empty(), TestOutput::new())
}

fn run_ok(program: &Program) -> Vm<TestInput, TestOutput> {
    let mut vm = vm_for(program);
    vm.run().expect("vm run failed");
    vm
}

fn run_expect_err(program: &Program) -> VmError {
    let mut vm = vm_for(program);
    vm.run().expect_err("expected execution error")
}

// ==================== Arithmetic and I/O ====================

#[test]
fn three_incs_output_one_byte() {
    let program = program_with_limit(
        0,
        &[(Opcode::Inc, 1), (Opcode::Inc, 1), (Opcode::Inc, 1), (Opcode::Output, 1)],
    );
    let vm = run_ok(&program);
    assert_eq!(vm.output.bytes, vec![3]);
    assert_eq!(vm.tape.cell(), 3);
}

#[test]
fn compressed_run_applies_in_one_step() {
    let program = program_of(&[(Opcode::Inc, 65536)]);
    let mut vm = vm_for(&program);
    assert_eq!(vm.step().unwrap(), Step::Continue);
    assert_eq!(vm.tape.cell(), 65536);
    assert_eq!(vm.step().unwrap(), Step::Halted);
}

#[test]
fn dec_wraps_below_zero() {
    let program = program_of(&[(Opcode::Dec, 2)]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.cell(), u32::MAX - 1);
}

#[test]
fn output_honors_repeat_count() {
    let program = program_of(&[(Opcode::Inc, 65), (Opcode::Output, 3)]);
    let vm = run_ok(&program);
    assert_eq!(vm.output.bytes, b"AAA");
}

#[test]
fn output_writes_low_byte_only() {
    let program = program_of(&[(Opcode::Inc, 0x1FF), (Opcode::Output, 1)]);
    let vm = run_ok(&program);
    assert_eq!(vm.output.bytes, vec![0xFF]);
}

#[test]
fn input_repeats_keep_last_byte() {
    let program = program_of(&[(Opcode::Input, 2)]);
    let mut vm = Vm::new(&program, TestInput::new(vec![7, 9]), TestOutput::new());
    vm.run().unwrap();
    assert_eq!(vm.tape.cell(), 9);
}

#[test]
fn input_end_of_stream_stores_zero() {
    let program = program_of(&[(Opcode::Inc, 5), (Opcode::Input, 1)]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.cell(), 0);
}

#[test]
fn empty_program_halts_immediately() {
    let program = program_of(&[]);
    let mut vm = vm_for(&program);
    assert_eq!(vm.step().unwrap(), Step::Halted);
    assert!(vm.run().is_ok());
}

// ==================== Tape layout ====================

#[test]
fn seeded_lane_is_visible_to_programs() {
    // cell 3 holds 1 on a freshly seeded tape
    let program = program_of(&[(Opcode::Right, 3), (Opcode::Output, 1)]);
    let vm = run_ok(&program);
    assert_eq!(vm.output.bytes, vec![1]);
}

#[test]
fn pointer_wraps_around_either_edge() {
    let program = program_with_limit(0, &[(Opcode::Left, 1), (Opcode::Inc, 9)]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.get(2), 9);

    let program = program_with_limit(0, &[(Opcode::Right, 4), (Opcode::Inc, 9)]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.get(1), 9);
}

// ==================== Loop control ====================

#[test]
fn loop_over_zero_cell_is_skipped_entirely() {
    let program = program_of(&[
        (Opcode::LoopOpen, 1),
        (Opcode::Dec, 1),
        (Opcode::LoopClose, 1),
    ]);
    let vm = run_ok(&program);
    assert_eq!(*vm.tape(), Tape::new(4));
}

#[test]
fn loop_decrements_to_zero() {
    let program = program_of(&[
        (Opcode::Inc, 5),
        (Opcode::LoopOpen, 1),
        (Opcode::Dec, 1),
        (Opcode::LoopClose, 1),
    ]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.cell(), 0);
}

#[test]
fn nested_loops_clear_both_cells() {
    // ++[>+++[-]<-]
    let program = translate_source("++[>+++[-]<-]", 4);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.get(0), 0);
    assert_eq!(vm.tape.get(1), 0);
}

#[test]
fn compressed_bracket_runs_enter_and_exit() {
    // nine fused opens and closes stay paired through the rescans; runs of
    // nine force the length-prefixed encoding
    let program = program_of(&[
        (Opcode::Inc, 3),
        (Opcode::LoopOpen, 9),
        (Opcode::Dec, 1),
        (Opcode::LoopClose, 9),
    ]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.cell(), 0);
}

#[test]
fn compressed_bracket_runs_skip_over_zero_cell() {
    let program = program_of(&[
        (Opcode::LoopOpen, 9),
        (Opcode::Inc, 1),
        (Opcode::LoopClose, 9),
        (Opcode::Dec, 1),
    ]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.cell(), u32::MAX);
}

#[test]
fn skipped_region_applies_no_side_effects() {
    // [>+++.>] over a zero cell must not move the pointer, write the tape,
    // or emit output
    let program = translate_source("[>+++.>]", 4);
    let vm = run_ok(&program);
    assert!(vm.output.bytes.is_empty());
    assert_eq!(vm.tape.pointer(), 0);
    assert_eq!(*vm.tape(), Tape::new(4));
}

#[test]
fn loop_counts_iterations_through_rescan() {
    // ++++[->++<]>. doubles four into eight and prints it
    let program = translate_source("++++[->++<]>.", 4);
    let vm = run_ok(&program);
    assert_eq!(vm.output.bytes, vec![8]);
}

#[test]
fn extra_close_over_zero_cell_is_a_noop() {
    // +[-]] ends balanced-at-zero; the stray closer exits quietly
    let program = program_of(&[
        (Opcode::Inc, 1),
        (Opcode::LoopOpen, 1),
        (Opcode::Dec, 1),
        (Opcode::LoopClose, 2),
    ]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.cell(), 0);
}

// ==================== Compare width ====================

#[test]
fn wide_compare_sees_value_256_as_live() {
    let program = program_of(&[
        (Opcode::Inc, 256),
        (Opcode::LoopOpen, 1),
        (Opcode::Dec, 1),
        (Opcode::LoopClose, 1),
    ]);
    let vm = run_ok(&program);
    assert_eq!(vm.tape.cell(), 0);
}

#[test]
fn byte_compare_sees_value_256_as_zero() {
    let program = program_of(&[
        (Opcode::Inc, 256),
        (Opcode::LoopOpen, 1),
        (Opcode::Dec, 1),
        (Opcode::LoopClose, 1),
    ]);
    let mut vm = vm_for(&program);
    vm.set_wide_compare(false);
    vm.run().unwrap();
    assert_eq!(vm.tape.cell(), 256);
}

// ==================== Structural errors ====================

#[test]
fn unmatched_open_is_fatal() {
    let program = program_of(&[(Opcode::LoopOpen, 1), (Opcode::Inc, 1)]);
    assert!(matches!(
        run_expect_err(&program),
        VmError::UnbalancedBrackets { .. }
    ));
}

#[test]
fn unmatched_close_is_fatal() {
    let program = program_of(&[(Opcode::Inc, 1), (Opcode::LoopClose, 1)]);
    assert!(matches!(
        run_expect_err(&program),
        VmError::UnbalancedBrackets { .. }
    ));
}

#[test]
fn close_over_seeded_cell_with_no_opener_is_fatal() {
    // >>>] lands on seeded cell 3 (value 1), so the close rescans backward
    // and runs off the start of the stream
    let program = program_of(&[(Opcode::Right, 3), (Opcode::LoopClose, 1)]);
    assert!(matches!(
        run_expect_err(&program),
        VmError::UnbalancedBrackets { .. }
    ));
}

// ==================== End to end ====================

#[test]
fn translated_program_prints_hi() {
    // three cells: 8*9 = 72 'H', +33 = 105 'i', 33 '!'
    let source = format!(
        "++++++++[>+++++++++<-]>.{}.>{}.",
        "+".repeat(33),
        "+".repeat(33)
    );
    let program = translate_source(&source, 4);
    let vm = run_ok(&program);
    assert_eq!(vm.output.bytes, b"Hi!");
}

#[test]
fn serialized_container_executes_identically() {
    let program = translate_source("++++[->++<]>.", 4);
    let reparsed = Program::from_bytes(&program.to_bytes()).unwrap();
    let vm = run_ok(&reparsed);
    assert_eq!(vm.output.bytes, vec![8]);
}

// ==================== Cancellation ====================

#[test]
fn cancel_before_first_step_leaves_tape_untouched() {
    let program = program_of(&[(Opcode::Inc, 5), (Opcode::Output, 1)]);
    let mut vm = vm_for(&program);
    let cancel = AtomicBool::new(true);
    assert!(matches!(
        vm.run_cancellable(&cancel),
        Err(VmError::Interrupted)
    ));
    assert_eq!(*vm.tape(), Tape::new(4));
    assert!(vm.output.bytes.is_empty());
}

#[test]
fn uncancelled_run_completes() {
    let program = program_of(&[(Opcode::Inc, 2)]);
    let mut vm = vm_for(&program);
    let cancel = AtomicBool::new(false);
    assert!(vm.run_cancellable(&cancel).is_ok());
    assert_eq!(vm.tape.cell(), 2);
}
