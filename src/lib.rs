//! # docpipe
//!
//! Validate and execute single-line document-transformation pipelines.
//!
//! A pipeline is a sequence of named stages separated by `|`, each with
//! optional keyed parameters:
//!
//! ```text
//! Load{source:"report.pdf"} | Select{where:"$page % 2 == 1"} | Render{dpi:200} | Save{name:"odd"}
//! ```
//!
//! ## Modules
//!
//! - `pipeline` - Parser, stage registry, validator, type-state stream
//!   model, run context, and the sequential execution engine
//! - `stages` - Built-in stage types (Load, Select, Concat, Render, Save)
//! - `expr` - Grammar-restricted page-set and condition evaluators
//! - `backend` - The Document capability trait plus an in-memory backend
//!   for tests and demonstration runs
//! - `error` - Crate-wide error taxonomy
//!
//! ```no_run
//! use docpipe::backend::MemoryBackend;
//! use docpipe::{run_pipeline, RunConfig, RunContext, StageRegistry};
//!
//! # async fn demo() -> docpipe::Result<()> {
//! let registry = StageRegistry::with_builtins();
//! let backend = MemoryBackend::new().with_document("report.pdf", 12);
//! let mut ctx = RunContext::new(RunConfig::default());
//! let stream = run_pipeline(
//!     r#"Load{source:"report.pdf"} | Select{pages:"1..3"} | Concat | Save"#,
//!     &registry,
//!     &backend,
//!     &mut ctx,
//! )
//! .await?;
//! println!("{}", stream.describe());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod expr;
pub mod pipeline;
pub mod stages;

pub use error::{Error, Result};
pub use pipeline::{
    run_pipeline, Capability, Engine, ParamValue, Params, RunConfig, RunContext, Stage,
    StageRegistry, Stream, StreamState,
};
