//! VM benchmark binary.
//!
//! Measures execution time for representative programs.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use mfvm::machine::io::{InputSource, OutputSink};
use mfvm::machine::nibble::RunWriter;
use mfvm::machine::opcode::Opcode;
use mfvm::machine::program::Program;
use mfvm::machine::translate::translate_source;
use mfvm::machine::vm::Vm;

/// Swallows every byte the machine writes.
struct NullOutput;

impl OutputSink for NullOutput {
    fn write_byte(&mut self, _byte: u8) {}
}

/// Always at end of input.
struct NullInput;

impl InputSource for NullInput {
    fn read_byte(&mut self) -> Option<u8> {
        None
    }
}

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    /// Estimated number of runs decoded per execution (None to omit column).
    est_runs: Option<u64>,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let ns_per_op = avg.as_nanos();
        let ns_per_run = self
            .est_runs
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_op as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter  {} ns/run",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            ns_per_run,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(
    name: &'static str,
    min_duration: Duration,
    est_runs: Option<u64>,
    mut f: F,
) -> BenchResult
where
    F: FnMut(),
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        est_runs,
    }
}

fn execute(program: &Program) {
    let mut vm = Vm::new(program, NullInput, NullOutput);
    vm.run().expect("benchmark program failed");
}

fn main() {
    let min_duration = Duration::from_millis(300);

    println!("mfvm benchmarks ({}ms per case)", min_duration.as_millis());

    // One compressed run moving the pointer a million cells: container
    // decode plus a single bulk step.
    let mut writer = RunWriter::new();
    writer.push_run(Opcode::Right, 1_000_000);
    let sweep = Program::new(1 << 20, writer);
    bench("bulk pointer sweep", min_duration, Some(1), || {
        execute(&sweep)
    })
    .print();

    // A countdown loop rescanned once per iteration: 10_000 passes over
    // open, dec, close.
    let mut writer = RunWriter::new();
    writer.push_run(Opcode::Inc, 10_000);
    writer.push(Opcode::LoopOpen);
    writer.push(Opcode::Dec);
    writer.push(Opcode::LoopClose);
    let countdown = Program::new(4, writer);
    bench("countdown loop", min_duration, Some(1 + 5 * 10_000), || {
        execute(&countdown)
    })
    .print();

    // Nested translated loops exercising the backward scan through a body
    // of mixed runs.
    let nested = translate_source("++++++++[->++++++++[->++++<]<]", 4);
    bench("nested loops", min_duration, None, || execute(&nested)).print();
}
