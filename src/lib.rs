//! Atelier: the task container of a windowing system.
//!
//! The crate models the tasks a window manager arranges on screen: ordered
//! activity histories grouped into stacks on displays, their geometry, their
//! membership in recents and their durable records.
//!
//! # Architecture
//!
//! Atelier follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (storage, channels, etc.)
//!
//! # Modules
//!
//! - [`geometry`]: Rectangles, configurations and the bounds resolver
//! - [`container`]: Generic ownership tree and container capabilities
//! - [`task`]: Task entity, lifecycle service and persistence codec

pub mod container;
pub mod geometry;
pub mod task;
