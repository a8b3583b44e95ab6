//! Thread service implementations.
//!
//! This module contains the concrete implementations of service traits.
//! Trait definitions live in the parent module (e.g. `thread_service.rs`).

pub mod thread_service_impl;

pub use thread_service_impl::ThreadServiceImpl;
