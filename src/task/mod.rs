//! Task lifecycle management.
//!
//! A task groups the activities of one logical application flow. This module
//! covers the task aggregate and the window hierarchy around it, the
//! lifecycle service that resizes, reparents and removes tasks, and the codec
//! that writes tasks to durable records and restores them. It follows the
//! hexagonal layout:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Record format and schema upgrades in [`persistence`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod persistence;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
