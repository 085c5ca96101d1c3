//! Web layer for the buoy dashboard.
//!
//! A JSON API exposing the coordinator operations a front end needs:
//! locating an address, searching stations and fetching readings.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
