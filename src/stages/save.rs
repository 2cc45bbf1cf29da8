//! Save: the sink stage. Writes every unit into the run's scoped temp
//! directory and passes the stream through unchanged. Packaging the files
//! into an archive and shipping them anywhere is external plumbing.

use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use crate::backend::DocumentBackend;
use crate::error::Result;
use crate::pipeline::context::RunContext;
use crate::pipeline::registry::StageExec;
use crate::pipeline::stream::{Stream, Unit};
use crate::pipeline::Stage;

pub struct SaveStage {
    name: String,
}

impl SaveStage {
    pub fn from_stage(stage: &Stage) -> Self {
        let name = stage
            .params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("output")
            .to_string();
        Self { name }
    }

    async fn save_unit(
        &self,
        unit: &Unit,
        dir: &std::path::Path,
        name: &str,
        ctx: &RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Vec<PathBuf>> {
        match unit {
            Unit::Document(doc) => {
                let path = backend
                    .save(doc, dir, name)
                    .await
                    .map_err(|e| ctx.capability_error(e))?;
                Ok(vec![path])
            }
            Unit::Raster(images) => backend
                .save_images(images, dir, name)
                .await
                .map_err(|e| ctx.capability_error(e)),
        }
    }
}

#[async_trait]
impl StageExec for SaveStage {
    async fn execute(
        &self,
        input: Option<Stream>,
        ctx: &mut RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Stream> {
        let Some(stream) = input else {
            return Err(ctx.param_error("requires an input stream"));
        };

        let dir = ctx.temp_dir()?;
        let mut written = Vec::new();

        match &stream {
            Stream::Single(unit) => {
                written.extend(
                    self.save_unit(unit, &dir, &self.name, ctx, backend)
                        .await?,
                );
            }
            Stream::Multi(units) => {
                for (i, unit) in units.iter().enumerate() {
                    let name = format!("{}_{:02}", self.name, i + 1);
                    written.extend(self.save_unit(unit, &dir, &name, ctx, backend).await?);
                }
            }
        }

        debug!(count = written.len(), dir = %dir.display(), "saved artifacts");

        // Record what was written; the files themselves live only as long
        // as the scoped temp directory.
        let paths: Vec<String> = written
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let entry = ctx
            .metadata
            .entry("saved_files".to_string())
            .or_insert_with(|| json!([]));
        if let Some(existing) = entry.as_array_mut() {
            existing.extend(paths.into_iter().map(serde_json::Value::String));
        }

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::pipeline::context::RunConfig;
    use crate::pipeline::parser::parse;

    fn stage(pipeline: &str) -> SaveStage {
        SaveStage::from_stage(&parse(pipeline).unwrap()[0])
    }

    fn ctx() -> RunContext {
        let mut ctx = RunContext::new(RunConfig::default());
        ctx.enter_stage(3, "Save");
        ctx
    }

    fn saved_files(ctx: &RunContext) -> Vec<String> {
        ctx.metadata["saved_files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_save_single_document() {
        let backend = MemoryBackend::new().with_document("a.pdf", 2);
        let doc = backend.load("a.pdf").await.unwrap();
        let mut ctx = ctx();

        let stream = stage(r#"Save{name:"result"}"#)
            .execute(Some(Stream::Single(Unit::Document(doc))), &mut ctx, &backend)
            .await
            .unwrap();

        // Pass-through: the stream keeps its shape and content kind.
        assert!(matches!(stream, Stream::Single(Unit::Document(_))));

        let files = saved_files(&ctx);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("result.doc"));
        assert!(std::path::Path::new(&files[0]).exists());
        ctx.cleanup();
    }

    #[tokio::test]
    async fn test_save_multi_stream_numbers_units() {
        let backend = MemoryBackend::new().with_document("a.pdf", 3);
        let doc = backend.load("a.pdf").await.unwrap();
        let p1 = backend.extract_page(&doc, 0).await.unwrap();
        let p2 = backend.extract_page(&doc, 1).await.unwrap();
        let mut ctx = ctx();

        stage("Save")
            .execute(
                Some(Stream::Multi(vec![Unit::Document(p1), Unit::Document(p2)])),
                &mut ctx,
                &backend,
            )
            .await
            .unwrap();

        let files = saved_files(&ctx);
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("output_01.doc"));
        assert!(files[1].ends_with("output_02.doc"));
        ctx.cleanup();
    }

    #[tokio::test]
    async fn test_save_rasterized_unit_writes_images() {
        let backend = MemoryBackend::new().with_document("a.pdf", 2);
        let doc = backend.load("a.pdf").await.unwrap();
        let images = backend.rasterize(&doc, 150).await.unwrap();
        let mut ctx = ctx();

        stage("Save")
            .execute(Some(Stream::Single(Unit::Raster(images))), &mut ctx, &backend)
            .await
            .unwrap();

        let files = saved_files(&ctx);
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("output_page_1.png"));
        ctx.cleanup();
    }

    #[tokio::test]
    async fn test_repeated_saves_append_metadata() {
        let backend = MemoryBackend::new().with_document("a.pdf", 1);
        let doc = backend.load("a.pdf").await.unwrap();
        let mut ctx = ctx();

        let stream = stage(r#"Save{name:"first"}"#)
            .execute(Some(Stream::Single(Unit::Document(doc))), &mut ctx, &backend)
            .await
            .unwrap();
        stage(r#"Save{name:"second"}"#)
            .execute(Some(stream), &mut ctx, &backend)
            .await
            .unwrap();

        assert_eq!(saved_files(&ctx).len(), 2);
        ctx.cleanup();
    }
}
