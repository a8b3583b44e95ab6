//! # Threadline Core
//!
//! Core types, entities, and error definitions for Threadline.
//! This crate provides the thread data model (posts and their comment
//! trees) and the error taxonomy shared by the store, cache, and service
//! layers.

pub mod domain;
pub mod error;
pub mod id;
pub mod result;
pub mod traits;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use result::*;
pub use traits::*;
pub use validation::*;
