//! Cancellable execution harness.
//!
//! Runs a machine on a dedicated blocking task and hands back two things: a
//! [`CancelHandle`] that flips an atomic flag the engine polls once per
//! completed step, and a oneshot receiver that delivers exactly one terminal
//! result — success, a fatal execution error, or
//! [`VmError::Interrupted`](crate::machine::errors::VmError::Interrupted).
//!
//! The engine enforces no deadline of its own; a host wanting a wall-clock
//! budget arms a timer and cancels through the handle.

use crate::machine::errors::VmError;
use crate::machine::io::{InputSource, OutputSink};
use crate::machine::vm::Vm;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

/// Flips the cancel flag a running machine polls between steps.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation. Idempotent; the machine notices before its
    /// next step.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Moves the machine onto a blocking task and runs it to its terminal
/// result.
///
/// The result arrives on the returned receiver exactly once. Dropping the
/// receiver does not stop the machine; cancel through the handle for that.
pub fn spawn<I, O>(
    mut vm: Vm<I, O>,
) -> (CancelHandle, oneshot::Receiver<Result<(), VmError>>)
where
    I: InputSource + Send + 'static,
    O: OutputSink + Send + 'static,
{
    let flag = Arc::new(AtomicBool::new(false));
    let (result_tx, result_rx) = oneshot::channel();

    let poll = Arc::clone(&flag);
    tokio::task::spawn_blocking(move || {
        let _ = result_tx.send(vm.run_cancellable(&poll));
    });

    (CancelHandle { flag }, result_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::io::tests::{TestInput, TestOutput};
    use crate::machine::program::Program;
    use crate::machine::translate::translate_source;

    fn vm_of(program: &Program) -> Vm<TestInput, TestOutput> {
        Vm::new(program, TestInput::empty(), TestOutput::new())
    }

    #[tokio::test]
    async fn delivers_success_once() {
        let program = translate_source("+++", 4);
        let (_handle, result) = spawn(vm_of(&program));
        assert!(result.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn cancel_interrupts_a_spinning_machine() {
        // +[] never halts on its own
        let program = translate_source("+[]", 4);
        let (handle, result) = spawn(vm_of(&program));
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(matches!(result.await.unwrap(), Err(VmError::Interrupted)));
    }

    #[tokio::test]
    async fn delivers_fatal_errors() {
        let program = translate_source("+]", 4);
        let (_handle, result) = spawn(vm_of(&program));
        assert!(matches!(
            result.await.unwrap(),
            Err(VmError::UnbalancedBrackets { .. })
        ));
    }
}
