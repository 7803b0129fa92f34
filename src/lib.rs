pub mod api;
pub mod binder;
pub mod config;
pub mod demo_service;
pub mod error;
pub mod export;
pub mod http_client;
pub mod provider;
pub mod schema;
pub mod selector;
pub mod standings;
pub mod state;
