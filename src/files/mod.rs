//! Filesystem-backed request handling.
//!
//! This module implements the three operations the server exposes over
//! its root directory: downloads and directory listings (GET), uploads
//! (PUT), and removal (DELETE). Mutations require authentication.

pub mod handler;
pub mod listing;

pub use handler::FileHandler;
