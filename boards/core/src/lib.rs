//! Core traits and types for the aula-ctl crates.
//!
//! This crate provides:
//! - The `Transport` trait the transaction engine drives
//! - The shared `Error` type and `Result` alias
//! - Static board description used for detection

mod board;
mod error;

pub use board::{is_vendor_page, BoardInfo, Received, Transport, VENDOR_PAGE_START};
pub use error::{Error, Result};
