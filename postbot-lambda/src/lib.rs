pub mod context;
pub mod jobs;
pub mod router;
pub mod runtime;

pub use context::JobContext;
pub use router::handle_invocation;
