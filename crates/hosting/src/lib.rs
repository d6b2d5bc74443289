//! Session hosting infrastructure for chat mini-games.
//!
//! This crate sits between a platform adapter and the session runtime: it
//! converts structured inbound events into commands, routes them through a
//! worker pool, and tracks which session lives on which chat surface.
//!
//! ## Core Types
//!
//! - [`Floor`] — Live session registry and command router
//! - [`Pool`] — Fixed-size worker pool with per-command acknowledgments
//! - [`ButtonPress`] / [`OpenRequest`] — Inbound platform events
mod floor;
mod inbound;
mod pool;

pub use floor::*;
pub use inbound::*;
pub use pool::*;
