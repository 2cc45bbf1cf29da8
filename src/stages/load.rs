//! Load: the generator stage. Fetches a document through the Document
//! capability and opens the stream.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::backend::DocumentBackend;
use crate::error::Result;
use crate::pipeline::context::RunContext;
use crate::pipeline::registry::StageExec;
use crate::pipeline::stream::{Stream, Unit};
use crate::pipeline::Stage;

pub struct LoadStage {
    source: Option<String>,
}

impl LoadStage {
    pub fn from_stage(stage: &Stage) -> Self {
        // `url` is an accepted alias for `source`.
        let source = stage
            .params
            .get("source")
            .or_else(|| stage.params.get("url"))
            .and_then(|v| v.as_str())
            .map(String::from);
        Self { source }
    }
}

#[async_trait]
impl StageExec for LoadStage {
    async fn execute(
        &self,
        _input: Option<Stream>,
        ctx: &mut RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Stream> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| ctx.param_error("requires a string 'source' parameter"))?;

        debug!(%source, "loading document");
        let doc = backend
            .load(source)
            .await
            .map_err(|e| ctx.capability_error(e))?;

        ctx.metadata.insert("source".to_string(), json!(source));
        Ok(Stream::Single(Unit::Document(doc)))
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

    async fn run(pipeline: &str, backend: &MemoryBackend) -> Result<(Stream, RunContext)> {
        let stage = LoadStage::from_stage(&parse(pipeline).unwrap()[0]);
        let mut ctx = RunContext::new(RunConfig::default());
        ctx.enter_stage(0, "Load");
        let stream = stage.execute(None, &mut ctx, backend).await?;
        Ok((stream, ctx))
    }

    #[tokio::test]
    async fn test_load_emits_single_stream() {
        let backend = MemoryBackend::new().with_document("a.pdf", 3);
        let (stream, ctx) = run(r#"Load{source:"a.pdf"}"#, &backend).await.unwrap();
        assert_eq!(stream.state(), StreamState::Single);
        assert_eq!(ctx.metadata["source"], "a.pdf");
    }

    #[tokio::test]
    async fn test_url_alias() {
        let backend = MemoryBackend::new().with_document("http://x/a.pdf", 2);
        let (stream, _) = run(r#"Load{url:"http://x/a.pdf"}"#, &backend).await.unwrap();
        assert_eq!(stream.state(), StreamState::Single);
    }

    #[tokio::test]
    async fn test_missing_source_is_param_error() {
        let backend = MemoryBackend::new();
        let err = run("Load", &backend).await.unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }

    #[tokio::test]
    async fn test_non_string_source_is_param_error() {
        let backend = MemoryBackend::new();
        let err = run("Load{source:42}", &backend).await.unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }
}
