//! Native client for the keygate identity service.
//!
//! SYSTEM CONTEXT
//! ==============
//! The server issues signed bearer tokens; this crate owns everything on the
//! client side of that contract: the HTTP transport, the single persisted
//! token slot, the session cache that tracks "who is signed in", and the
//! access gate that keeps protected views from rendering before
//! authorization is confirmed.

pub mod api;
pub mod gate;
pub mod session;
pub mod token_store;

pub use api::{ApiClient, ApiError, AuthTransport, User};
pub use gate::{AccessGate, GateDecision};
pub use session::{Session, SessionError, SessionState};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
