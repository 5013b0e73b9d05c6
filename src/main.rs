//! MinFuck command-line toolkit.
//!
//! Translates source notation into the binary container format and runs
//! containers against stdin/stdout.
//!
//! # Usage
//! ```text
//! mfvm <command> [arguments]
//! ```
//!
//! # Commands
//! - `b2m <source>`: translate a source-notation file into a `.mf` container
//! - `run <program>`: execute a `.mf` container
//! - `help`: print usage
//!
//! A running program is cancelled cleanly with Ctrl+C: the machine stops at
//! the next step boundary and the process exits with status 130.

use mfvm::machine::errors::VmError;
use mfvm::machine::io::{ReadInput, WriteOutput};
use mfvm::machine::program::{DEFAULT_TAPE_LIMIT, MAX_TAPE_LIMIT, Program};
use mfvm::machine::runner;
use mfvm::machine::translate::translate_source;
use mfvm::machine::vm::Vm;
use mfvm::{error, info};
use std::env;
use std::fs;
use std::path::Path;
use std::process;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
            process::exit(0);
        }
        "b2m" => b2m(&args),
        "run" => run(&args).await,
        other => {
            error!("Unknown command: {}", other);
            print_usage(&args[0]);
            process::exit(1);
        }
    }
}

/// Translates a source-notation file into a container next to it.
fn b2m(args: &[String]) {
    if args.len() < 3 {
        error!("b2m requires a source file");
        print_usage(&args[0]);
        process::exit(1);
    }

    let input_path = &args[2];
    let mut output_path: Option<String> = None;
    let mut tape_limit = DEFAULT_TAPE_LIMIT;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--output" | "-o") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                output_path = Some(args[i].clone());
                i += 1;
            }
            "--mem" => {
                i += 1;
                if i >= args.len() {
                    error!("--mem requires an argument");
                    process::exit(1);
                }
                tape_limit = args[i].parse::<u32>().unwrap_or_else(|_| {
                    error!("Invalid tape limit: '{}' is not a valid number", args[i]);
                    process::exit(1);
                });
                if tape_limit > MAX_TAPE_LIMIT {
                    error!("Tape limit {} exceeds the maximum {}", tape_limit, MAX_TAPE_LIMIT);
                    process::exit(1);
                }
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let source = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to read {}: {}", input_path, e);
            process::exit(3);
        }
    };

    let output_path = output_path.unwrap_or_else(|| {
        let p = Path::new(input_path);
        let stem = p.file_stem().unwrap_or_default().to_string_lossy();
        let parent = p.parent().unwrap_or(Path::new("."));
        parent
            .join(format!("{}.mf", stem))
            .to_string_lossy()
            .into_owned()
    });

    let program = translate_source(&source, tape_limit);
    let bytes = program.to_bytes();

    if let Err(e) = fs::write(&output_path, bytes.to_vec()) {
        error!("Failed to write {}: {}", output_path, e);
        process::exit(3);
    }

    info!(
        "Translated {} -> {} ({} bytes, {} nibbles)",
        input_path,
        output_path,
        bytes.len(),
        program.nibble_len()
    );
}

/// Loads a container and runs it against stdin/stdout until it halts, fails,
/// or Ctrl+C cancels it.
async fn run(args: &[String]) {
    if args.len() < 3 {
        error!("run requires a program file");
        print_usage(&args[0]);
        process::exit(1);
    }

    let input_path = &args[2];
    let mut wide_compare = true;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--byte-compare" => {
                wide_compare = false;
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let bytes = match fs::read(input_path) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read {}: {}", input_path, e);
            process::exit(3);
        }
    };

    let program = match Program::from_bytes(&bytes) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to load {}: {}", input_path, e);
            process::exit(4);
        }
    };

    let mut vm = Vm::new(
        &program,
        ReadInput::new(std::io::stdin()),
        WriteOutput::new(std::io::stdout()),
    );
    vm.set_wide_compare(wide_compare);

    let (handle, mut result) = runner::spawn(vm);

    tokio::select! {
        outcome = &mut result => finish(outcome),
        _ = tokio::signal::ctrl_c() => {
            handle.cancel();
            finish(result.await);
        }
    }
}

/// Reports the machine's terminal result and exits.
fn finish(outcome: Result<Result<(), VmError>, oneshot::error::RecvError>) -> ! {
    match outcome {
        Ok(Ok(())) => {
            info!("Program finished");
            process::exit(0);
        }
        Ok(Err(VmError::Interrupted)) => {
            info!("Program interrupted");
            process::exit(130);
        }
        Ok(Err(e)) => {
            error!("Program failed: {}", e);
            process::exit(2);
        }
        Err(e) => {
            error!("Machine task dropped its result: {}", e);
            process::exit(2);
        }
    }
}

const USAGE: &str = "\
MinFuck Toolkit

USAGE:
    {program} <command> [arguments]

COMMANDS:
    b2m <source> [OPTIONS]    Translate source notation into a .mf container
    run <program> [OPTIONS]   Execute a .mf container against stdin/stdout
    help                      Print this help message

OPTIONS:
    -o, --output <file>   b2m: output path (defaults to <source>.mf)
    --mem <cells>         b2m: addressable tape limit (default 4096)
    --byte-compare        run: test loop conditions against each cell's low byte

EXIT CODES:
    0     program finished normally
    2     program failed during execution
    3     a file could not be read or written
    4     the container could not be loaded
    130   execution interrupted by Ctrl+C

EXAMPLES:
    # Translate hello.bf into hello.mf
    {program} b2m hello.bf

    # Run it with a bigger tape
    {program} b2m hello.bf --mem 65536
    {program} run hello.mf
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
