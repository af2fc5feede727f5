pub mod cli;
pub mod config;
pub mod cron;
pub mod http;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
