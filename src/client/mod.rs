//! The `client` module holds login identities and the per-identity session
//! that bridges the bus to a transport connection.

pub mod session;

pub use session::{Session, SessionRegistry};
