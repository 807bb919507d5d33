//! Interactive and scripted console front-end over the shared ledger.

pub mod commands;
pub mod core;
mod help;
pub mod io;
pub mod output;
mod shell;
mod shell_context;

pub use shell::{run_cli, SCRIPT_ENV};
