//! # Interaction Graph Model
//!
//! Plain data types shared by the accumulator, the exporter and the stores:
//! post records on the way in, the author graph on the way out.
//!
//! Design rule: this module is pure data — no I/O, no logging, no policy.
//! Policy (what to do with a malformed record) belongs to the accumulator.

pub mod author;
pub mod record;
pub mod graph;

pub use author::AuthorId;
pub use record::{InteractionKind, PostRecord, Slot, TargetRef, UserRef};
pub use graph::{Edge, InteractionGraph};
