//! Built-in stage types: Load, Select, Concat, Render, Save.
//!
//! Each stage is registered with its capability tag and state contract; the
//! engine enforces the contract before the stage body runs, so the
//! implementations here only deal with content, parameters, and the
//! Document capability.

mod concat;
mod load;
mod render;
mod save;
mod select;

pub use concat::ConcatStage;
pub use load::LoadStage;
pub use render::RenderStage;
pub use save::SaveStage;
pub use select::SelectStage;

use crate::error::Result;
use crate::pipeline::registry::{StageDescriptor, StageRegistry};
use crate::pipeline::stream::{InputContract, OutputContract};
use crate::pipeline::Capability;

/// Registers the built-in stages on `registry`.
pub fn register_builtins(registry: &mut StageRegistry) -> Result<()> {
    registry.register(
        "Load",
        StageDescriptor::new(
            Capability::Generator,
            InputContract::None,
            OutputContract::Single,
            |stage| Ok(Box::new(LoadStage::from_stage(stage))),
        ),
    )?;
    registry.register(
        "Select",
        StageDescriptor::new(
            Capability::Transformer,
            InputContract::Single,
            OutputContract::Multi,
            |stage| Ok(Box::new(SelectStage::from_stage(stage))),
        ),
    )?;
    registry.register(
        "Concat",
        StageDescriptor::new(
            Capability::Transformer,
            InputContract::Multi,
            OutputContract::Single,
            |_| Ok(Box::new(ConcatStage)),
        ),
    )?;
    registry.register(
        "Render",
        StageDescriptor::new(
            Capability::Transformer,
            InputContract::Any,
            OutputContract::SameAsInput,
            |stage| Ok(Box::new(RenderStage::from_stage(stage))),
        ),
    )?;
    registry.register(
        "Save",
        StageDescriptor::new(
            Capability::Consumer,
            InputContract::Any,
            OutputContract::SameAsInput,
            |stage| Ok(Box::new(SaveStage::from_stage(stage))),
        ),
    )?;
    Ok(())
}
