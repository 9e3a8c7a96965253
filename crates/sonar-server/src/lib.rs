//! # sonar-server
//!
//! HTTP host for the sonar presentation arbiter.
//!
//! This library wires in-memory device collaborators to a running arbiter and
//! exposes triggers and rendered state over REST.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
