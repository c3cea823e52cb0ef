//! Generic container node abstraction.
//!
//! A window hierarchy is an ownership tree keyed by identifiers. The topology
//! (who is parented to whom, and in which order) lives in [`ContainerTree`];
//! the per-node payload records live in their own keyed maps and are looked up
//! by the same identifiers. Configuration inheritance is handled by
//! [`ConfigurationContainer`], and behaviour that differs between node kinds is
//! exposed through the capability traits in [`capability`].

pub mod capability;
mod child_list;
mod node;
mod tree;

pub use capability::{
    ChildPosition, FrontPolicy, Persistable, ReparentRequest, Reparentable, ResizeRequest,
    Resizable,
};
pub use child_list::ChildList;
pub use node::{ConfigurationChange, ConfigurationContainer};
pub use tree::{ContainerError, ContainerTree};

#[cfg(test)]
mod tests;
