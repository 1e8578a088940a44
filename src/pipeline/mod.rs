// Request pipeline - an explicit, ordered list of stages threaded through one
// loop. Each stage either refines the request context or halts the request
// with a terminal error; nothing after a halted stage runs.
//
// Standard order: language -> routing -> auth. Dispatch happens after the
// pipeline returns.

pub mod context;
pub mod runner;
pub mod stages;
pub mod traits;

pub use context::{RequestContext, ResolvedIdentity};
pub use runner::{Halted, Pipeline};
pub use traits::Stage;
