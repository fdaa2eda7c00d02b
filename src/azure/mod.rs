//! Azure Resource Manager access.
//!
//! This module handles everything that leaves the process:
//! - [`cli`] - Command execution for Azure CLI
//! - [`cloud`] - Sovereign cloud endpoints
//! - [`transport`] - The request/response contract used by the operations layer
//! - [`az_rest`] - Transport through `az rest`
//! - [`rest`] - Transport through HTTPS with an `azure_identity` credential

mod az_rest;
mod cli;
mod cloud;
mod rest;
mod transport;

// Re-export public types and functions
pub use az_rest::AzCliTransport;
pub use cli::{run, run_args};
pub use cloud::Cloud;
pub use rest::RestTransport;
pub use transport::{ArmRequest, ArmResponse, ArmTransport, Method};
