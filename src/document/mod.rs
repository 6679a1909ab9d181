//! Document assembly, rendering and compilation
//!
//! [`DocumentAssembler`] turns an ordered stream of symbol ids into document
//! source. [`Toolchain`] writes that source and runs the external compiler
//! and viewer. [`SharedDocument`] serializes access for concurrent callers
//! and hands compiles to a [`CompileWorker`].

pub mod assembler;
pub mod config;
pub mod session;
pub mod toolchain;

pub use assembler::{AssemblerState, DocumentAssembler};
pub use config::{DocumentConfig, ToolchainConfig};
pub use session::{CompileTicket, CompileWorker, SharedDocument};
pub use toolchain::{CompileError, CompileReport, ExternalToolError, ToolRun, Toolchain};
