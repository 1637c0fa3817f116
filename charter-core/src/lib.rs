//! Charter core library: index loading, configuration, and the call graph pipeline.
//!
//! The main entry point is [`pipeline::CallGraphPipeline`], which runs the
//! Extract → Resolve → Filter → Build → Rank pipeline over a decoded
//! [`charter_graphs::Index`] loaded with [`load::load_index`].

pub mod config;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod progress;
