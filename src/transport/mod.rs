//! The `transport` module is the line-oriented TCP layer: it frames input
//! into lines, parses the command protocol, and maps commands onto the
//! session surface. The bus core only ever sees the [`sink::LineSink`]
//! behind the `DeliverySink` capability.

pub mod command;
pub mod server;
pub mod sink;
