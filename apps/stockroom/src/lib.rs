//! # Stockroom
//!
//! HTTP server and command-line front end for the stockroom ledger.
//!
//! ```text
//!   CLI (clap) ──┐
//!                ├──> stockroom-core::Ledger ──> redb file
//!   HTTP (axum) ─┘
//! ```
//!
//! Both front ends read the same [`config::Config`] and open the same
//! database file, so anything done on the command line is visible to
//! the server after a restart.

pub mod api;
pub mod cli;
pub mod config;
