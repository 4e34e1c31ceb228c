//! Public profile: the per-user visibility configuration and the read path
//! that turns it into the page anonymous visitors see at `/u/{slug}`.

pub mod assembler;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod page;
pub mod repository;
pub mod service;
