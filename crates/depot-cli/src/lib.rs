//! # depot-cli — Subcommand Handlers
//!
//! Library side of the `depot` binary: each subcommand lives in its
//! own module with a clap `Args` struct and a `run` entry point.

pub mod validate;
