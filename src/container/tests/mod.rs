//! Unit tests for the generic container abstraction.
