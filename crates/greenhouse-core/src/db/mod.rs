//! Local libSQL database used by the SQL key-value backend

mod connection;
mod migrations;

pub use connection::Database;
