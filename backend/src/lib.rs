pub mod config;
pub mod db;
pub mod estimation;
pub mod http;
pub mod order;

pub mod error;
pub mod logger;
pub mod time;
