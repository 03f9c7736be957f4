pub mod config;
pub mod db;
pub mod server;
pub mod service;
pub mod time;
pub mod types;
