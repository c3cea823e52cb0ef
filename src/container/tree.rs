//! Keyed ownership tree holding the container topology.

use super::ChildList;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Errors returned by [`ContainerTree`] operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContainerError<K: fmt::Debug + fmt::Display> {
    /// The node is not present in the tree.
    #[error("unknown container node: {0}")]
    UnknownNode(K),

    /// The node is already registered.
    #[error("container node already exists: {0}")]
    DuplicateNode(K),

    /// The node already has a parent.
    #[error("container node {0} is already attached")]
    AlreadyAttached(K),

    /// Attaching would make a node its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle {
        /// Node being attached.
        child: K,
        /// Proposed parent.
        parent: K,
    },

    /// The node still owns children and cannot be removed.
    #[error("container node {0} still has children")]
    HasChildren(K),
}

#[derive(Debug, Clone)]
struct TreeNode<K> {
    parent: Option<K>,
    children: ChildList<K>,
}

/// Parent/child topology for a set of keyed nodes.
///
/// Every node has at most one parent, and each parent orders its children
/// bottom to top. Payloads are stored elsewhere and looked up by key.
#[derive(Debug, Clone)]
pub struct ContainerTree<K> {
    nodes: HashMap<K, TreeNode<K>>,
}

impl<K> Default for ContainerTree<K> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<K> ContainerTree<K>
where
    K: Copy + Eq + Hash + fmt::Debug + fmt::Display,
{
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a detached node.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DuplicateNode`] when the key is taken.
    pub fn insert(&mut self, key: K) -> Result<(), ContainerError<K>> {
        if self.nodes.contains_key(&key) {
            return Err(ContainerError::DuplicateNode(key));
        }
        self.nodes.insert(
            key,
            TreeNode {
                parent: None,
                children: ChildList::new(),
            },
        );
        Ok(())
    }

    /// Removes a detached, childless node.
    ///
    /// A node that is still attached is detached first.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownNode`] or
    /// [`ContainerError::HasChildren`].
    pub fn remove(&mut self, key: K) -> Result<(), ContainerError<K>> {
        let node = self.node(key)?;
        if !node.children.is_empty() {
            return Err(ContainerError::HasChildren(key));
        }
        self.detach(key)?;
        self.nodes.remove(&key);
        Ok(())
    }

    /// Returns `true` when `key` is registered.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Parent of `key`, if attached.
    #[must_use]
    pub fn parent(&self, key: K) -> Option<K> {
        self.nodes.get(&key).and_then(|node| node.parent)
    }

    /// Children of `key`, bottom to top. Unknown keys have no children.
    #[must_use]
    pub fn children(&self, key: K) -> &[K] {
        self.nodes
            .get(&key)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Position of `key` within its parent.
    #[must_use]
    pub fn position(&self, key: K) -> Option<usize> {
        let parent = self.parent(key)?;
        self.nodes.get(&parent)?.children.index_of(&key)
    }

    /// Walks from the parent of `key` up to the root.
    pub fn ancestors(&self, key: K) -> impl Iterator<Item = K> + '_ {
        std::iter::successors(self.parent(key), move |current| self.parent(*current))
    }

    /// Attaches a detached node under `parent` at `position` (clamped).
    ///
    /// Returns the index the child landed at.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::AlreadyAttached`] when `child` has a parent,
    /// [`ContainerError::Cycle`] when `parent` descends from `child`, or
    /// [`ContainerError::UnknownNode`] for unregistered keys.
    pub fn attach(
        &mut self,
        child: K,
        parent: K,
        position: usize,
    ) -> Result<usize, ContainerError<K>> {
        if self.node(child)?.parent.is_some() {
            return Err(ContainerError::AlreadyAttached(child));
        }
        self.check_acyclic(child, parent)?;
        let landed = self.node_mut(parent)?.children.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(landed)
    }

    /// Detaches `key` from its parent and returns the former parent.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownNode`] for unregistered keys.
    pub fn detach(&mut self, key: K) -> Result<Option<K>, ContainerError<K>> {
        let Some(parent) = self.node(key)?.parent else {
            return Ok(None);
        };
        self.node_mut(parent)?
            .children
            .remove_where(|candidate| *candidate == key);
        self.node_mut(key)?.parent = None;
        Ok(Some(parent))
    }

    /// Moves `child` under `new_parent` at `position` in one step.
    ///
    /// All checks run before anything is mutated, so a failed move leaves the
    /// tree untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownNode`] or [`ContainerError::Cycle`].
    pub fn reparent(
        &mut self,
        child: K,
        new_parent: K,
        position: usize,
    ) -> Result<usize, ContainerError<K>> {
        self.node(child)?;
        self.node(new_parent)?;
        self.check_acyclic(child, new_parent)?;
        self.detach(child)?;
        self.attach(child, new_parent, position)
    }

    /// Moves `key` within its current parent.
    ///
    /// Returns the new index, or `None` when `key` is detached.
    pub fn reposition(&mut self, key: K, position: usize) -> Option<usize> {
        let parent = self.parent(key)?;
        let node = self.nodes.get_mut(&parent)?;
        let from = node.children.index_of(&key)?;
        node.children.move_to(from, position)
    }

    fn check_acyclic(&self, child: K, parent: K) -> Result<(), ContainerError<K>> {
        self.node(parent)?;
        if parent == child || self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(ContainerError::Cycle { child, parent });
        }
        Ok(())
    }

    fn node(&self, key: K) -> Result<&TreeNode<K>, ContainerError<K>> {
        self.nodes.get(&key).ok_or(ContainerError::UnknownNode(key))
    }

    fn node_mut(&mut self, key: K) -> Result<&mut TreeNode<K>, ContainerError<K>> {
        self.nodes
            .get_mut(&key)
            .ok_or(ContainerError::UnknownNode(key))
    }
}
