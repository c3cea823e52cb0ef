//! Unit tests for geometry values and the bounds resolver.

mod resolver_tests;
