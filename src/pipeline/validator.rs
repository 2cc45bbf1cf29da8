//! Structural validation of a resolved pipeline, run once before anything
//! executes. If validation fails the engine never starts, so no stage has
//! partial side effects.

use crate::error::{Error, Result};
use crate::pipeline::registry::BoundStage;
use crate::pipeline::Capability;

/// Checks the pipeline grammar invariants: non-empty, a generator first,
/// and generators nowhere else.
pub fn validate(stages: &[BoundStage]) -> Result<()> {
    let first = stages
        .first()
        .ok_or_else(|| Error::Structure("pipeline has no stages".to_string()))?;

    if first.capability != Capability::Generator {
        return Err(Error::Structure(format!(
            "first stage '{}' is a {}, but a pipeline must start with a generator",
            first.name, first.capability
        )));
    }

    for stage in &stages[1..] {
        if stage.capability == Capability::Generator {
            return Err(Error::Structure(format!(
                "generator stage '{}' at step {} can only appear first",
                stage.name,
                stage.index + 1
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::parse;
    use crate::pipeline::registry::StageRegistry;

    fn bind(pipeline: &str) -> Vec<BoundStage> {
        let registry = StageRegistry::with_builtins();
        registry.resolve_all(&parse(pipeline).unwrap()).unwrap()
    }

    #[test]
    fn test_valid_pipeline() {
        assert!(validate(&bind("Load | Select{mode:each} | Concat | Save")).is_ok());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = validate(&[]).unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_non_generator_first_rejected() {
        let err = validate(&bind("Save | Load")).unwrap_err();
        assert!(matches!(err, Error::Structure(msg) if msg.contains("Save")));
    }

    #[test]
    fn test_generator_after_first_rejected() {
        let err = validate(&bind("Load | Save | Load")).unwrap_err();
        assert!(matches!(err, Error::Structure(msg) if msg.contains("step 3")));
    }
}
