//! Identity store: user records and role management.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/admin/users` | List users (super admin) |
//! | PUT | `/api/admin/users/{user_id}/role` | Change a user's role (super admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::UserService;
