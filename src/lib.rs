pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod scrapers;
pub mod store;
