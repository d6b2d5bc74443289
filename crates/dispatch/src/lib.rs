//! Rate-limited render dispatcher for editable chat surfaces.
//!
//! Many producers ask for a surface to be re-rendered; exactly one consumer
//! task talks to the transport. The queue coalesces bursts per surface (only
//! the most recent payload is ever sent) and enforces a global plus a
//! per-surface pacing gap between sends.
//!
//! ## Architecture
//!
//! - [`DispatchQueue`] — Functional core: due-ordered heap, coalescing, pacing
//! - [`Dispatcher`] — Imperative shell: enqueue handle plus the consumer task
//! - [`Transport`] — Trait for the platform's edit-message primitive
//!
//! The dispatcher never surfaces transport failures to callers: retry-after
//! hints reschedule the job, anything else is dropped and logged. Rendered
//! surfaces are best-effort; session state stays authoritative elsewhere.
mod dispatcher;
mod job;
mod queue;
mod transport;

pub use dispatcher::*;
pub use job::*;
pub use queue::*;
pub use transport::*;
