//! # lunexis-geo-server
//!
//! HTTP server library for the Lunexis geolocation unit.
//!
//! This library provides the API handlers, start-up wiring and state
//! management for the server binary.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod startup;
pub mod state;
