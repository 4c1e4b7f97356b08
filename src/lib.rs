// ABOUTME: Library root for fastack - exposes the deploy pipeline for the binary and tests.
// ABOUTME: The main binary is in main.rs.

pub mod archive;
pub mod config;
pub mod credentials;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod remote;
pub mod types;
pub mod walk;
