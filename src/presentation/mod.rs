//! Askama views and markdown rendering shared by the server and the hydrator.

pub mod markdown;
pub mod views;
