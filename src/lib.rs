pub mod application;
pub mod asset;
pub mod commands;
pub mod context;
pub mod download;
pub mod error;
pub mod fetch;
pub mod github;
pub mod http;
pub mod runtime;
pub mod selection;
