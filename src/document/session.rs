//! Shared documents for concurrent request flows
//!
//! Mutations of one document are serialized behind a mutex. Compiles are
//! queued to a single dedicated worker thread so that blocking external
//! processes never run on a thread that serves classification.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use super::assembler::DocumentAssembler;
use super::toolchain::{CompileError, CompileReport, Toolchain};
use crate::registry::{SymbolId, UnknownSymbolError};

type CompileResult = Result<CompileReport, CompileError>;

struct CompileJob {
    source: String,
    reply: Sender<CompileResult>,
}

/// Single-consumer compile queue backed by one thread
pub struct CompileWorker {
    sender: Option<Sender<CompileJob>>,
    handle: Option<JoinHandle<()>>,
}

impl CompileWorker {
    /// Start the worker thread
    pub fn spawn(toolchain: Toolchain) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<CompileJob>();
        let handle = thread::Builder::new()
            .name("inkmath-compile".to_string())
            .spawn(move || {
                for job in receiver {
                    let result = toolchain.compile(&job.source);
                    // The requester may have stopped waiting
                    let _ = job.reply.send(result);
                }
                log::debug!("event=compile_worker status=stopped");
            })?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a rendered document; jobs run in submission order
    pub fn submit(&self, source: String) -> CompileTicket {
        let (reply, receiver) = mpsc::channel();
        if let Some(sender) = &self.sender {
            // A send failure drops `reply`, which the ticket reports
            let _ = sender.send(CompileJob { source, reply });
        }
        CompileTicket { receiver }
    }
}

impl Drop for CompileWorker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Handle to a queued compile
#[must_use = "a compile ticket reports whether the external tools succeeded"]
pub struct CompileTicket {
    receiver: Receiver<CompileResult>,
}

impl CompileTicket {
    /// Block until the compile has finished
    pub fn wait(self) -> CompileResult {
        self.receiver.recv().unwrap_or(Err(CompileError::WorkerGone))
    }
}

/// A document shared between request flows
pub struct SharedDocument {
    assembler: Mutex<DocumentAssembler>,
    worker: CompileWorker,
}

impl SharedDocument {
    pub fn new(assembler: DocumentAssembler, worker: CompileWorker) -> Self {
        Self {
            assembler: Mutex::new(assembler),
            worker,
        }
    }

    // Every mutation is all-or-nothing, so a poisoned lock still guards a
    // consistent document.
    fn lock(&self) -> MutexGuard<'_, DocumentAssembler> {
        self.assembler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append symbols atomically with respect to other flows
    pub fn add_symbols(&self, ids: &[SymbolId]) -> Result<(), UnknownSymbolError> {
        self.lock().add_symbols(ids)
    }

    pub fn render(&self) -> String {
        self.lock().render()
    }

    /// A copy of the current document state
    pub fn snapshot(&self) -> DocumentAssembler {
        self.lock().clone()
    }

    /// Queue a compile of the current state.
    ///
    /// The document is rendered and queued under the lock, so compiles are
    /// ordered consistently with the appends around them.
    pub fn compile(&self) -> CompileTicket {
        let guard = self.lock();
        self.worker.submit(guard.render())
    }
}
