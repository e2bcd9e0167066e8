// Internal modules
pub mod dates;
pub mod raw;
pub mod result;
pub mod validation;

// Re-export key types for library consumers
pub use raw::RawValue;
pub use result::{ConstantResult, ExecutionState};
pub use validation::validate;
