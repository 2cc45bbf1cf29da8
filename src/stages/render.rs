//! Render: rasterizes each document unit in place, preserving the stream
//! shape. Already-rasterized units pass through untouched.

use async_trait::async_trait;
use tracing::debug;

use crate::backend::DocumentBackend;
use crate::error::Result;
use crate::pipeline::context::RunContext;
use crate::pipeline::registry::StageExec;
use crate::pipeline::stream::{Stream, Unit};
use crate::pipeline::{ParamValue, Stage};

pub struct RenderStage {
    resolution: Option<ParamValue>,
    mode: Option<String>,
}

impl RenderStage {
    pub fn from_stage(stage: &Stage) -> Self {
        // `dpi` is an accepted alias for `resolution`.
        let resolution = stage
            .params
            .get("resolution")
            .or_else(|| stage.params.get("dpi"))
            .cloned();
        let mode = stage
            .params
            .get("mode")
            .and_then(|v| v.as_str())
            .map(String::from);
        Self { resolution, mode }
    }

    fn resolution(&self, ctx: &RunContext) -> Result<u32> {
        match &self.resolution {
            None => Ok(ctx.config.default_resolution),
            Some(value) => value
                .as_u32()
                .ok_or_else(|| ctx.param_error(format!("invalid resolution '{value}'"))),
        }
    }

    /// `multipage` keeps one image per page; `single` collapses the pages
    /// of each unit into one stacked image.
    fn single_mode(&self, ctx: &RunContext) -> Result<bool> {
        match self.mode.as_deref() {
            None | Some("multipage") => Ok(false),
            Some("single") => Ok(true),
            Some(other) => Err(ctx.param_error(format!("unsupported mode '{other}'"))),
        }
    }

    async fn render_unit(
        &self,
        unit: Unit,
        resolution: u32,
        single: bool,
        ctx: &RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Unit> {
        match unit {
            Unit::Document(doc) => {
                let mut images = backend
                    .rasterize(&doc, resolution)
                    .await
                    .map_err(|e| ctx.capability_error(e))?;
                if single {
                    images = backend
                        .composite(&[images])
                        .await
                        .map_err(|e| ctx.capability_error(e))?;
                }
                Ok(Unit::Raster(images))
            }
            raster @ Unit::Raster(_) => Ok(raster),
        }
    }
}

#[async_trait]
impl StageExec for RenderStage {
    async fn execute(
        &self,
        input: Option<Stream>,
        ctx: &mut RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Stream> {
        let Some(stream) = input else {
            return Err(ctx.param_error("requires an input stream"));
        };

        let resolution = self.resolution(ctx)?;
        let single = self.single_mode(ctx)?;
        debug!(resolution, single, "rasterizing");

        match stream {
            Stream::Single(unit) => {
                let rendered = self
                    .render_unit(unit, resolution, single, ctx, backend)
                    .await?;
                Ok(Stream::Single(rendered))
            }
            Stream::Multi(units) => {
                let mut rendered = Vec::with_capacity(units.len());
                for unit in units {
                    rendered.push(
                        self.render_unit(unit, resolution, single, ctx, backend)
                            .await?,
                    );
                }
                Ok(Stream::Multi(rendered))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::Error;
    use crate::pipeline::context::RunConfig;
    use crate::pipeline::parser::parse;
    use crate::pipeline::stream::StreamState;

    fn stage(pipeline: &str) -> RenderStage {
        RenderStage::from_stage(&parse(pipeline).unwrap()[0])
    }

    fn ctx() -> RunContext {
        let mut ctx = RunContext::new(RunConfig::default());
        ctx.enter_stage(1, "Render");
        ctx
    }

    #[tokio::test]
    async fn test_preserves_stream_shape() {
        let backend = MemoryBackend::new().with_document("a.pdf", 3);
        let doc = backend.load("a.pdf").await.unwrap();

        let single = stage("Render")
            .execute(Some(Stream::Single(Unit::Document(doc))), &mut ctx(), &backend)
            .await
            .unwrap();
        assert_eq!(single.state(), StreamState::Single);
        assert!(matches!(single, Stream::Single(Unit::Raster(_))));

        let p1 = backend.load("a.pdf").await.unwrap();
        let p2 = backend.load("a.pdf").await.unwrap();
        let multi = stage("Render{dpi:200}")
            .execute(
                Some(Stream::Multi(vec![Unit::Document(p1), Unit::Document(p2)])),
                &mut ctx(),
                &backend,
            )
            .await
            .unwrap();
        assert_eq!(multi.state(), StreamState::Multi);
    }

    #[tokio::test]
    async fn test_invalid_resolution_type() {
        let backend = MemoryBackend::new().with_document("a.pdf", 1);
        let doc = backend.load("a.pdf").await.unwrap();
        let err = stage(r#"Render{dpi:"high"}"#)
            .execute(Some(Stream::Single(Unit::Document(doc))), &mut ctx(), &backend)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }

    #[tokio::test]
    async fn test_rendered_units_pass_through() {
        let backend = MemoryBackend::new().with_document("a.pdf", 2);
        let doc = backend.load("a.pdf").await.unwrap();
        let images = backend.rasterize(&doc, 72).await.unwrap();
        let stream = stage("Render{dpi:300}")
            .execute(Some(Stream::Single(Unit::Raster(images))), &mut ctx(), &backend)
            .await
            .unwrap();
        assert!(matches!(stream, Stream::Single(Unit::Raster(set)) if set == images));
    }

    #[tokio::test]
    async fn test_single_mode_collapses_pages() {
        let backend = MemoryBackend::new().with_document("a.pdf", 3);
        let doc = backend.load("a.pdf").await.unwrap();
        let stream = stage(r#"Render{mode:"single"}"#)
            .execute(Some(Stream::Single(Unit::Document(doc))), &mut ctx(), &backend)
            .await
            .unwrap();
        let Stream::Single(Unit::Raster(set)) = stream else {
            panic!("expected rasterized unit");
        };
        let dir = tempfile::tempdir().unwrap();
        let paths = backend.save_images(&set, dir.path(), "x").await.unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_mode() {
        let backend = MemoryBackend::new().with_document("a.pdf", 1);
        let doc = backend.load("a.pdf").await.unwrap();
        let err = stage("Render{mode:sideways}")
            .execute(Some(Stream::Single(Unit::Document(doc))), &mut ctx(), &backend)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }
}
