//! inkblog: a markdown blog server with server-side rendering and a two-tier read cache.

pub mod application;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
