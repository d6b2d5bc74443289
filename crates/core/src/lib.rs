//! Core type aliases, traits, and constants for parlay.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the parlay workspace.
#![allow(dead_code)]

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Balances, stakes, and payout deltas in house currency.
pub type Credits = i64;
/// Index into a round's turn order.
pub type Position = usize;
/// Round counter for marathon sessions (first round is 1).
pub type Round = u16;
/// Monotonically increasing identifier for enqueued render jobs.
pub type Sequence = u64;

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    /// Useful for converting between marker types.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// DISPATCH PACING
// Outbound surface edits share one transport-wide budget plus a per-surface
// budget. Gaps are floors, not rates: consecutive sends are never closer.
// ============================================================================
/// Minimum spacing between any two outbound sends.
pub const GLOBAL_GAP: std::time::Duration = std::time::Duration::from_millis(50);
/// Minimum spacing between two sends to the same surface.
pub const TARGET_GAP: std::time::Duration = std::time::Duration::from_millis(1000);
/// Safety margin added on top of a transport retry-after hint.
pub const RETRY_BUFFER: std::time::Duration = std::time::Duration::from_millis(250);

// ============================================================================
// SESSION LIFECYCLE
// ============================================================================
/// Default registration window for a fresh lobby.
pub const REGISTRATION_WINDOW: std::time::Duration = std::time::Duration::from_secs(60);
/// Extra time granted by the creator's one-shot extension.
pub const LOBBY_EXTENSION: std::time::Duration = std::time::Duration::from_secs(30);
/// Minimum ready participants required to start play.
pub const MIN_PLAYERS: usize = 2;
/// Headcount cap per session, pending confirmations included.
pub const MAX_PLAYERS: usize = 8;
/// Rounds played by a marathon session.
pub const MARATHON_ROUNDS: Round = 3;

// ============================================================================
// OUTCOME RESOLUTION
// ============================================================================
/// Animation frames rendered before a turn's final state.
pub const SPIN_TICKS: usize = 4;
/// Delay between animation frames.
pub const SPIN_TICK_GAP: std::time::Duration = std::time::Duration::from_millis(600);

// ============================================================================
// REMATCH
// ============================================================================
/// Yes votes required to spawn a successor session.
pub const REMATCH_QUORUM: usize = 2;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
