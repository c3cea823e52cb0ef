//! Ordered child sequence shared by every container kind.

use serde::{Deserialize, Serialize};

/// Ordered children of a container, bottom first.
///
/// Index `0` is the bottom-most child and `len() - 1` the top-most. Insert
/// positions past the end are clamped to the top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildList<T> {
    items: Vec<T>,
}

impl<T> Default for ChildList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> ChildList<T> {
    /// Creates an empty child list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Children bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutable children bottom to top.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Children as a slice, bottom to top.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Child at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutable child at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Bottom-most child.
    #[must_use]
    pub fn bottom(&self) -> Option<&T> {
        self.items.first()
    }

    /// Top-most child.
    #[must_use]
    pub fn top(&self) -> Option<&T> {
        self.items.last()
    }

    /// Index of the first child matching `predicate`, searching from the bottom.
    pub fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    /// Inserts `item` at `index`, clamped to the top, and returns where it
    /// landed.
    pub fn insert(&mut self, index: usize, item: T) -> usize {
        let landed = index.min(self.items.len());
        self.items.insert(landed, item);
        landed
    }

    /// Places `item` on top.
    pub fn push_top(&mut self, item: T) -> usize {
        self.items.push(item);
        self.items.len().saturating_sub(1)
    }

    /// Removes and returns the child at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Removes the first child matching `predicate`.
    pub fn remove_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.position(predicate)?;
        self.remove_at(index)
    }

    /// Moves the child at `from` to `to` (clamped). Returns the final index.
    pub fn move_to(&mut self, from: usize, to: usize) -> Option<usize> {
        let item = self.remove_at(from)?;
        Some(self.insert(to, item))
    }
}

impl<T: PartialEq> ChildList<T> {
    /// Returns `true` when `item` is a child.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Index of `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }
}

impl<'a, T> IntoIterator for &'a ChildList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> FromIterator<T> for ChildList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
