//! Application services: article CRUD, AI drafting and server-side rendering.

pub mod ai;
pub mod articles;
pub mod error;
pub mod repos;
pub mod ssr;
