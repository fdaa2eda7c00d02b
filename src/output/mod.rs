//! Output formatting for workflow results.
//!
//! This module handles formatting and printing the resources a workflow touched:
//! - [`summary`] - one text block per resource
//! - [`terminal`] - indentation and highlighting helpers

mod summary;
mod terminal;

pub use summary::{print_summary, render_resource, render_summary, SummaryStyle};
