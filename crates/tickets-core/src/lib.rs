//! tickets-core library.
//!
//! The household model (tasks, people, completion and redemption logs), the
//! reducer that turns one snapshot into the next, the derived ticket
//! ledger, and the adapters that persist snapshots.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per concern; `anyhow::Result` at the edges.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod activity;
pub mod calendar;
pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod model;
pub mod persist;
pub mod seed;
pub mod session;
pub mod store;

pub use ledger::{TicketPolicy, tickets_for};
pub use model::{Person, Task, TaskId, TaskRegistry};
pub use session::Session;
pub use store::{Action, Effect, Rules, StateStore, Transition, TransitionError};
