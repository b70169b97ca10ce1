pub mod config;
pub mod server;
pub mod shared;
pub mod tickets;
