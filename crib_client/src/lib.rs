//! Internal modules for the cribbage client.
//!
//! This library provides the HTTP API client, command parsing, the
//! controller that keeps a session in step with the server, and the text
//! rendering used by the crib_client binary.

pub mod api_client;
pub mod commands;
pub mod config;
pub mod display;
pub mod logging;
pub mod sync;
