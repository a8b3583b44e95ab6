//! # Threadline Service
//!
//! Cache-aside service layer for Threadline: posts with nested comment
//! trees, read through Redis (or a process-local cache) and written to
//! PostgreSQL.

pub mod bootstrap;
pub mod cache;
pub mod dto;
pub mod r#impl;
mod mappers;
pub mod thread_service;
pub mod tree;

#[cfg(test)]
mod test_support;

pub use cache::*;
pub use dto::*;
pub use r#impl::ThreadServiceImpl;
pub use thread_service::*;
pub use tree::TreeAssembler;
