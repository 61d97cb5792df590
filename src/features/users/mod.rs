//! Users and the binary attachments they own.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/` | List users with attachments |
//! | GET | `/user/{id}` | Get a user with attachments |
//! | POST | `/create` | Create a user and its attachments |
//! | DELETE | `/delete/{id}` | Delete a user and its attachments (idempotent) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;

pub use repositories::{SqliteUserRepository, UserRepository};
