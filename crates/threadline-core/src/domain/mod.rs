//! # Threadline Domain
//!
//! Thread entities: posts and their self-referential comment trees.

pub mod entities;

pub use entities::*;
