//! Async runtime for multiplayer mini-game sessions.
//!
//! This crate orchestrates turn-based game sessions living on shared chat
//! surfaces, coordinating the session store, the render dispatcher, and the
//! external collaborators (payout engine, economy ledger, profile gate).
//!
//! ## Architecture
//!
//! - [`Dealer`] — Imperative shell handling commands and spawning detached work
//! - [`Store`] — Authoritative session state behind short guarded operations
//! - [`Deadline`] — Registration-window timer that re-checks state when it fires
//!
//! ## Events
//!
//! - [`Command`] — Inbound actions from the platform edge
//! - [`Reply`] — Fast per-action acknowledgments
//! - [`View`] — Shared-surface renders, coalesced by the dispatcher
//!
//! ## Collaborators
//!
//! - [`Payout`] — Opaque per-turn outcome resolution
//! - [`Economy`] — Balances, stake holds, deltas, compensation
//! - [`ProfileGate`] — Ready-or-pending decision at join time
mod dealer;
mod event;
mod executor;
mod house;
mod message;
mod order;
mod participant;
mod payout;
mod protocol;
mod rematch;
mod session;
mod store;
mod timer;
mod turn;
mod vote;

pub use dealer::*;
pub use event::*;
pub use house::*;
pub use message::*;
pub use order::*;
pub use participant::*;
pub use payout::*;
pub use protocol::*;
pub use session::*;
pub use store::*;
pub use timer::*;
pub use turn::*;
pub use vote::*;
