//! Port traits at the I/O seams.

pub mod config_port;
pub mod http_port;
