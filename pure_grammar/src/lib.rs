// Internal modules
pub mod context;
pub mod cst;
pub mod error;
pub mod island;
pub mod protocol;
pub mod source;
pub mod utils;
pub mod walker;

// Re-export key types for library consumers
pub use context::{EmbeddedParser, ParserContext};
pub use error::{EngineError, EngineErrorKind, EngineResult};
pub use source::{ParseTreeWalkerSourceInformation, SourceInformation};
pub use walker::DomainWalker;
