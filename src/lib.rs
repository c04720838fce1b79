pub mod api_connection;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod nutrition;
pub mod planner;
pub mod store;
