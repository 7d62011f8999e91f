pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod storage;
