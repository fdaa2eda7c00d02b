//! Operations façade over Azure Resource Manager.
//!
//! One `get_*` / `create_or_update_*` / `delete_*` per resource kind, all
//! routed through a [`NetworkOperations`] client context.

mod network;

pub use network::{NetworkOperations, PollSettings};
