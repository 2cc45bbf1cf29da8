//! Concat: the aggregator stage. Merges a multi stream back into one unit.
//!
//! The merge strategy follows the content kind the stream currently
//! carries: plain documents are merged as documents, and as soon as any
//! unit has been rasterized the image sets are composited instead.

use async_trait::async_trait;
use tracing::debug;

use crate::backend::{DocumentBackend, DocumentHandle, ImageSet};
use crate::error::Result;
use crate::pipeline::context::RunContext;
use crate::pipeline::registry::StageExec;
use crate::pipeline::stream::{Stream, Unit};

pub struct ConcatStage;

#[async_trait]
impl StageExec for ConcatStage {
    async fn execute(
        &self,
        input: Option<Stream>,
        ctx: &mut RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Stream> {
        let Some(Stream::Multi(units)) = input else {
            return Err(ctx.param_error("requires a multi-document input stream"));
        };
        if units.is_empty() {
            return Err(ctx.param_error("cannot concatenate an empty stream"));
        }

        if units.iter().any(Unit::is_raster) {
            let sets: Vec<ImageSet> = units
                .into_iter()
                .filter_map(|unit| match unit {
                    Unit::Raster(set) => Some(set),
                    Unit::Document(_) => None,
                })
                .collect();
            debug!(count = sets.len(), "compositing rasterized units");
            let merged = backend
                .composite(&sets)
                .await
                .map_err(|e| ctx.capability_error(e))?;
            Ok(Stream::Single(Unit::Raster(merged)))
        } else {
            let docs: Vec<DocumentHandle> = units
                .into_iter()
                .filter_map(|unit| match unit {
                    Unit::Document(doc) => Some(doc),
                    Unit::Raster(_) => None,
                })
                .collect();
            debug!(count = docs.len(), "merging documents");
            let merged = backend
                .merge(&docs)
                .await
                .map_err(|e| ctx.capability_error(e))?;
            Ok(Stream::Single(Unit::Document(merged)))
        }
    }
}
