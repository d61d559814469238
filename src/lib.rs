pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod mapdb;
pub mod output;
