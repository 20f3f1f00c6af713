//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the auth business logic and persistence concerns so
//! route handlers can stay focused on protocol translation and status
//! mapping.

pub mod credentials;
pub mod revocation;
pub mod roles;
pub mod token;
