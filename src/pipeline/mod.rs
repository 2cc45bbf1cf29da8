//! The pipeline language front-end and execution engine.
//!
//! A pipeline is one line of text: named stages separated by `|`, each with
//! optional keyed parameters (`Load{source:"a.pdf"} | Select{mode:"each"}`).
//! Text flows through [`parser::parse`] into a stage list, the
//! [`registry::StageRegistry`] binds each stage to its implementation and
//! capability contract, [`validator::validate`] checks the structural
//! invariants, and the [`engine::Engine`] runs the stages sequentially,
//! threading a [`stream::Stream`] and a per-run [`context::RunContext`].

use std::fmt;

use serde::Serialize;

pub mod context;
pub mod engine;
pub mod parser;
pub mod registry;
pub mod stream;
pub mod validator;

pub use context::{RunConfig, RunContext};
pub use engine::{run_pipeline, Engine};
pub use registry::{BoundStage, StageDescriptor, StageExec, StageRegistry};
pub use stream::{InputContract, OutputContract, Stream, StreamState, Unit};

/// What a stage type is allowed to do, fixed per type in its registry
/// descriptor and never varied per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Creates the initial stream; must be the first stage and only there.
    Generator,
    /// Receives a stream, produces a new one.
    Transformer,
    /// Side effects only; passes its input stream through unchanged.
    Consumer,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Generator => write!(f, "generator"),
            Capability::Transformer => write!(f, "transformer"),
            Capability::Consumer => write!(f, "consumer"),
        }
    }
}

/// One parameter value as classified by the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Quoted string, quotes stripped.
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Unquoted token that is neither boolean nor numeric.
    Word(String),
}

impl ParamValue {
    /// String view of quoted strings and bare words.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) | ParamValue::Word(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ParamValue::Int(n) => u32::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "\"{s}\""),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Word(w) => write!(f, "{w}"),
        }
    }
}

/// Ordered key→value parameter map. A later duplicate key overwrites the
/// earlier one in place; that is defined behavior, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: ParamValue) {
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One parsed stage: a name and its parameters. Purely syntactic; binding to
/// an implementation happens through the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    pub name: String,
    pub params: Params,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_duplicate_key_overwrites() {
        let mut params = Params::new();
        params.insert("dpi".to_string(), ParamValue::Int(150));
        params.insert("mode".to_string(), ParamValue::Word("each".to_string()));
        params.insert("dpi".to_string(), ParamValue::Int(300));

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("dpi"), Some(&ParamValue::Int(300)));
        // Order of first insertion is preserved.
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["dpi", "mode"]);
    }

    #[test]
    fn test_param_value_accessors() {
        assert_eq!(ParamValue::Str("x".into()).as_str(), Some("x"));
        assert_eq!(ParamValue::Word("x".into()).as_str(), Some("x"));
        assert_eq!(ParamValue::Int(3).as_str(), None);
        assert_eq!(ParamValue::Int(300).as_u32(), Some(300));
        assert_eq!(ParamValue::Int(-1).as_u32(), None);
        assert_eq!(ParamValue::Bool(true).as_bool(), Some(true));
    }
}
