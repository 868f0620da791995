//! ghostnodes - keeps coincident endpoints of line features in sync
//!
//! Independently digitized lines often share an endpoint position without
//! sharing a vertex ("ghost nodes"). While an operator drags such an
//! endpoint, every other line ending at the same exact position is moved
//! with it, committed once and announced once.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod index;
pub mod observability;
pub mod source;
pub mod summary;
