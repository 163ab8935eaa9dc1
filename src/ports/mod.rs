//! Port traits the domain depends on. Adapters provide the implementations.

pub mod config_port;
pub mod data_port;
pub mod execution_port;
