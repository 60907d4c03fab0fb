//! API exposure modules
//!
//! Each exposure consumes the entity registry and produces a Router for its
//! protocol.

pub mod rest;

pub use rest::RestExposure;
