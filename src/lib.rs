pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod retry;
pub mod sheets;
pub mod video;
pub mod youtube;
