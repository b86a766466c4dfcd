pub mod api;
pub mod config;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod presenter;
pub mod state;
pub mod worker;
