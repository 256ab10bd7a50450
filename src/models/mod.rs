//! Core data models for the deployment cleanup run.
//!
//! Everything here is transient: computed once per run from bucket listings,
//! held in memory, and dropped when the process exits.

pub mod object;
pub mod policy;
pub mod prefix;
