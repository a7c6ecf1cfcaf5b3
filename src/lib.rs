pub mod app_config;
pub mod bwee;
pub mod codec;
pub mod domain;
pub mod engine;
pub mod extensions;
pub mod store;
