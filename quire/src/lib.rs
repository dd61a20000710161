//! Library half of the `quire` binary, split out so the subcommands can be
//! tested without spawning a process.
pub mod cli;
pub mod commands;
