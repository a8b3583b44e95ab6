//! Result type aliases for Threadline.

use crate::ThreadlineError;

/// A specialized `Result` type for Threadline operations.
pub type ThreadlineResult<T> = Result<T, ThreadlineError>;
