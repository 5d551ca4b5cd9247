//! microserve - Minimal HTTP/1.x File Server
//!
//! Core library for request parsing, authentication, and filesystem-backed
//! request handling.

pub mod auth;
pub mod config;
pub mod files;
pub mod http;
pub mod server;
