//! Regression test runner for the genemu emulator
//!
//! Writes the manifest of expected screenshots for a [`Suite`] and then runs
//! the engine once per test case on a pool of worker threads.
//!
//! [`Suite`]: genemu_suite::Suite

pub mod cli;
mod harness;
pub mod invoker;
pub mod logging;
pub mod pool;

pub use harness::run_suite;
pub use invoker::{EngineInvoker, ExecutionError, Failure, Invoker};
pub use pool::{CaseOutcome, CaseState, ExecutionPool, PoolState, Report, RunError};
