//! Data models for relay connections
//!
//! This module contains the connection type owned by the registry and the
//! events connection tasks send to the relay loop.

pub mod client;
pub mod event;
