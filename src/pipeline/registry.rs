//! The stage-capability registry.
//!
//! Maps a stage name to a constructor, a capability tag, and an
//! input/output state contract. Registration is open: new stage types plug
//! in at setup time without touching the parser, validator, or engine.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::backend::DocumentBackend;
use crate::error::{Error, Result};
use crate::pipeline::context::RunContext;
use crate::pipeline::stream::{InputContract, OutputContract, Stream};
use crate::pipeline::{Capability, Stage};

/// A constructed stage ready to execute.
///
/// The input is `None` only for the generator at the head of the pipeline;
/// for every other stage the engine has already checked the stream against
/// the stage's input contract.
#[async_trait]
pub trait StageExec: Send + Sync {
    async fn execute(
        &self,
        input: Option<Stream>,
        ctx: &mut RunContext,
        backend: &dyn DocumentBackend,
    ) -> Result<Stream>;
}

type Constructor = Box<dyn Fn(&Stage) -> Result<Box<dyn StageExec>> + Send + Sync>;

/// Everything the registry knows about one stage type.
pub struct StageDescriptor {
    pub capability: Capability,
    pub accepts: InputContract,
    pub emits: OutputContract,
    constructor: Constructor,
}

impl StageDescriptor {
    pub fn new<F>(
        capability: Capability,
        accepts: InputContract,
        emits: OutputContract,
        constructor: F,
    ) -> Self
    where
        F: Fn(&Stage) -> Result<Box<dyn StageExec>> + Send + Sync + 'static,
    {
        Self {
            capability,
            accepts,
            emits,
            constructor: Box::new(constructor),
        }
    }
}

/// A stage bound to its descriptor and constructed executor, tagged with its
/// position in the pipeline.
pub struct BoundStage {
    pub index: usize,
    pub name: String,
    pub capability: Capability,
    pub accepts: InputContract,
    pub emits: OutputContract,
    pub exec: Box<dyn StageExec>,
}

impl std::fmt::Debug for BoundStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundStage")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("accepts", &self.accepts)
            .field("emits", &self.emits)
            .finish_non_exhaustive()
    }
}

/// Open mapping from stage name to descriptor.
pub struct StageRegistry {
    stages: HashMap<String, StageDescriptor>,
}

impl StageRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
        }
    }

    /// A registry with the built-in stages (Load, Select, Concat, Render,
    /// Save) registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::stages::register_builtins(&mut registry)
            .expect("built-in stage contracts are valid");
        registry
    }

    /// Registers a stage type. The declared contract must agree with the
    /// capability table: a generator accepts no input, a transformer or
    /// consumer requires one, and a consumer passes its stream through.
    pub fn register(&mut self, name: &str, descriptor: StageDescriptor) -> Result<()> {
        let contract_ok = match descriptor.capability {
            Capability::Generator => {
                descriptor.accepts == InputContract::None
                    && descriptor.emits != OutputContract::SameAsInput
            }
            Capability::Transformer => descriptor.accepts != InputContract::None,
            Capability::Consumer => {
                descriptor.accepts != InputContract::None
                    && descriptor.emits == OutputContract::SameAsInput
            }
        };
        if !contract_ok {
            return Err(Error::Structure(format!(
                "stage type '{}' declares a state contract incompatible with its {} capability",
                name, descriptor.capability
            )));
        }

        self.stages.insert(name.to_string(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StageDescriptor> {
        self.stages.get(name)
    }

    /// Registered stage names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Binds one parsed stage to its descriptor, constructing the executor.
    pub fn resolve(&self, index: usize, stage: &Stage) -> Result<BoundStage> {
        let descriptor = self
            .stages
            .get(&stage.name)
            .ok_or_else(|| Error::UnknownStage(stage.name.clone()))?;
        let exec = (descriptor.constructor)(stage)?;
        Ok(BoundStage {
            index,
            name: stage.name.clone(),
            capability: descriptor.capability,
            accepts: descriptor.accepts,
            emits: descriptor.emits,
            exec,
        })
    }

    /// Binds a whole parsed pipeline.
    pub fn resolve_all(&self, stages: &[Stage]) -> Result<Vec<BoundStage>> {
        stages
            .iter()
            .enumerate()
            .map(|(index, stage)| self.resolve(index, stage))
            .collect()
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
