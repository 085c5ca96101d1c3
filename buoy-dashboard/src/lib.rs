//! Buoy dashboard server.
//!
//! Finds NDBC ocean buoys near an address and shows their latest tide,
//! wave and weather observations, fetched on demand through a download
//! worker reached over a message queue.

pub mod broker;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod geocode;
pub mod observation;
pub mod web;
