//! The `utils` module provides the shared building blocks of the bus: the
//! bounded container everything else is built on, the error taxonomy, and
//! logging setup.

pub mod bounded;
pub mod error;
pub mod logging;
