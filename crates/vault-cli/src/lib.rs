//! # vault-cli: Report Publishing Task
//!
//! Library half of the `vault` binary. Argument definitions and the task
//! runner live here so they can be tested without spawning a process.

pub mod publish;
