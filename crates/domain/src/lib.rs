//! Shared types for the medichat workspace.
//!
//! Everything here is transport- and UI-agnostic: the error type, the
//! configuration model, upstream conversation messages, provider stream
//! events, and structured trace events.

pub mod config;
pub mod error;
pub mod message;
pub mod stream;
pub mod trace;
