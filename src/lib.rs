pub mod config;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod jwtoken;
pub mod loggers;
pub mod models;
pub mod render;
pub mod session;
pub mod storage;
