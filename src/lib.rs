pub mod client;
pub mod config;
pub mod datatable;
pub mod error;
pub mod logging;
