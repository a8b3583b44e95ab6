//! Data Transfer Objects (DTOs).

mod thread_dto;

pub use thread_dto::*;
