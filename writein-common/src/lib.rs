//! # Write-in Voting Common Library
//!
//! Shared code for the write-in voting service:
//! - Error and result types
//! - Configuration loading (CLI > env > TOML > compiled defaults)
//! - Database bootstrap (pragmas, schema, storage-level guards)
//! - Row models for voters, candidates and votes
//! - Password hashing for the login stand-in

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
