//! Persistence engine implementations

pub mod in_memory;

pub use in_memory::{InMemoryDatabase, InMemorySession, IncludeResolver};
