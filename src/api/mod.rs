//! REST API module.
//!
//! Contains all API handlers following the frontend contract.

mod admin;
mod attendance;
mod courses;
mod departments;
mod schools;
mod slot_attendance;
mod students;
mod users;

pub use admin::*;
pub use attendance::*;
pub use courses::*;
pub use departments::*;
pub use schools::*;
pub use slot_attendance::*;
pub use students::*;
pub use users::*;

use serde::Serialize;

/// Confirmation body for write operations.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Confirmation body carrying the created row.
#[derive(Debug, Serialize)]
pub struct Created<T: Serialize> {
    pub message: String,
    pub data: T,
}
