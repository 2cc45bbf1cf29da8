//! Select: splits a single document into an ordered collection of
//! single-page documents, chosen by `mode:each`, an explicit page-set
//! expression, or a per-page condition.

use async_trait::async_trait;
use tracing::debug;

use crate::backend::DocumentBackend;
use crate::error::Result;
use crate::expr::{condition, pages};
use crate::pipeline::context::RunContext;
use crate::pipeline::registry::StageExec;
use crate::pipeline::stream::{Stream, Unit};
use crate::pipeline::Stage;

enum Selector {
    Mode(String),
    Pages(String),
    Where(String),
}

pub struct SelectStage {
    selectors: Vec<Selector>,
}

impl SelectStage {
    pub fn from_stage(stage: &Stage) -> Self {
        let mut selectors = Vec::new();
        if let Some(v) = stage.params.get("mode").and_then(|v| v.as_str()) {
            selectors.push(Selector::Mode(v.to_string()));
        }
        if let Some(v) = stage.params.get("pages").and_then(|v| v.as_str()) {
            selectors.push(Selector::Pages(v.to_string()));
        }
        if let Some(v) = stage.params.get("where").and_then(|v| v.as_str()) {
            selectors.push(Selector::Where(v.to_string()));
        }
        Self { selectors }
    }

    fn selector(&self, ctx: &RunContext) -> Result<&Selector> {
        match self.selectors.as_slice() {
            [one] => Ok(one),
            [] => Err(ctx.param_error("requires a 'mode', 'pages', or 'where' parameter")),
            _ => Err(ctx.param_error("'mode', 'pages', and 'where' are mutually exclusive")),
        }
    }
}

#[async_trait]
impl StageExec for SelectStage {
    async fn execute(
        &self,
        input: Option<Stream>,
        ctx: &mut RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Stream> {
        let Some(Stream::Single(unit)) = input else {
            return Err(ctx.param_error("requires a single-document input stream"));
        };
        let Unit::Document(doc) = unit else {
            return Err(ctx.param_error("cannot select pages from rasterized content"));
        };

        let total = backend
            .page_count(&doc)
            .await
            .map_err(|e| ctx.capability_error(e))?;

        let indices: Vec<usize> = match self.selector(ctx)? {
            Selector::Mode(mode) if mode == "each" => {
                debug!(total, "selecting every page");
                (0..total).collect()
            }
            Selector::Mode(mode) => {
                return Err(ctx.param_error(format!("unsupported mode '{mode}'")));
            }
            Selector::Pages(expr) => {
                debug!(%expr, "selecting explicit pages");
                pages::parse_page_set(expr, total)
                    .map_err(|e| ctx.param_error(format!("invalid pages expression: {e}")))?
            }
            Selector::Where(expr) => {
                debug!(%expr, "selecting pages by condition");
                condition::select_pages(expr, total)
            }
        };

        let mut units = Vec::with_capacity(indices.len());
        for index in indices {
            let page = backend
                .extract_page(&doc, index)
                .await
                .map_err(|e| ctx.capability_error(e))?;
            units.push(Unit::Document(page));
        }

        Ok(Stream::Multi(units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::Error;
    use crate::pipeline::context::RunConfig;
    use crate::pipeline::parser::parse;

    async fn run(pipeline: &str, total_pages: usize) -> Result<Stream> {
        let backend = MemoryBackend::new().with_document("a.pdf", total_pages);
        let stage = SelectStage::from_stage(&parse(pipeline).unwrap()[0]);
        let mut ctx = RunContext::new(RunConfig::default());
        ctx.enter_stage(1, "Select");
        let doc = backend.load("a.pdf").await.unwrap();
        stage
            .execute(Some(Stream::Single(Unit::Document(doc))), &mut ctx, &backend)
            .await
    }

    fn unit_count(stream: &Stream) -> usize {
        match stream {
            Stream::Multi(units) => units.len(),
            Stream::Single(_) => 1,
        }
    }

    #[tokio::test]
    async fn test_mode_each_splits_every_page() {
        let stream = run("Select{mode:each}", 4).await.unwrap();
        assert_eq!(unit_count(&stream), 4);
    }

    #[tokio::test]
    async fn test_pages_expression() {
        let stream = run(r#"Select{pages:"1 3"}"#, 5).await.unwrap();
        assert_eq!(unit_count(&stream), 2);
    }

    #[tokio::test]
    async fn test_where_condition() {
        let stream = run(r#"Select{where:"$page % 2 == 0"}"#, 5).await.unwrap();
        assert_eq!(unit_count(&stream), 2);
    }

    #[tokio::test]
    async fn test_unsupported_mode() {
        let err = run("Select{mode:reverse}", 3).await.unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }

    #[tokio::test]
    async fn test_missing_selector() {
        let err = run("Select", 3).await.unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }

    #[tokio::test]
    async fn test_conflicting_selectors() {
        let err = run(r#"Select{mode:each,pages:"1"}"#, 3).await.unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }

    #[tokio::test]
    async fn test_bad_pages_expression() {
        let err = run(r#"Select{pages:"x..y"}"#, 3).await.unwrap_err();
        assert!(matches!(err, Error::Param { .. }));
    }
}
