pub mod dispatcher;
pub mod pipeline;

pub use dispatcher::ResilientDispatcher;
pub use pipeline::ExtractionPipeline;
