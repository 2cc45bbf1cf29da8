//! The typed value threaded between stages, and the state contracts that
//! govern which stages may follow which.

use std::fmt;

use serde::Serialize;

use crate::backend::{DocumentHandle, ImageSet};

/// The two stream shapes. `Single` is one complete document; `Multi` is an
/// ordered collection of independent document/page units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamState {
    Single,
    Multi,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamState::Single => write!(f, "single"),
            StreamState::Multi => write!(f, "multi"),
        }
    }
}

/// One unit of content. The document/raster distinction is what lets the
/// aggregator pick document-merge versus raster-merge.
#[derive(Debug, Clone)]
pub enum Unit {
    Document(DocumentHandle),
    Raster(ImageSet),
}

impl Unit {
    pub fn is_raster(&self) -> bool {
        matches!(self, Unit::Raster(_))
    }

    fn kind(&self) -> &'static str {
        match self {
            Unit::Document(_) => "document",
            Unit::Raster(_) => "raster",
        }
    }
}

/// Content and state travel together, so a stream can never claim a state
/// its content does not have. Ownership moves through each stage; a consumed
/// stream is gone.
#[derive(Debug)]
pub enum Stream {
    Single(Unit),
    Multi(Vec<Unit>),
}

impl Stream {
    pub fn state(&self) -> StreamState {
        match self {
            Stream::Single(_) => StreamState::Single,
            Stream::Multi(_) => StreamState::Multi,
        }
    }

    /// Short human-readable description for step logging.
    pub fn describe(&self) -> String {
        match self {
            Stream::Single(unit) => format!("single {}", unit.kind()),
            Stream::Multi(units) => format!("multi ({} units)", units.len()),
        }
    }
}

/// Input state(s) a stage type accepts, declared in its registry descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputContract {
    /// No input stream; the stage must run first.
    None,
    Single,
    Multi,
    /// Either stream state.
    Any,
}

impl InputContract {
    /// Whether a stream in `state` (or no stream at all) satisfies the
    /// contract. Checked by the engine before the stage body runs.
    pub fn admits(&self, state: Option<StreamState>) -> bool {
        match (self, state) {
            (InputContract::None, None) => true,
            (InputContract::Single, Some(StreamState::Single)) => true,
            (InputContract::Multi, Some(StreamState::Multi)) => true,
            (InputContract::Any, Some(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for InputContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputContract::None => write!(f, "no"),
            InputContract::Single => write!(f, "single"),
            InputContract::Multi => write!(f, "multi"),
            InputContract::Any => write!(f, "single or multi"),
        }
    }
}

/// Output state a stage type emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputContract {
    Single,
    Multi,
    /// Emits the same state it received (rasterizers, sinks).
    SameAsInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Unit {
        Unit::Document(DocumentHandle::new(1))
    }

    #[test]
    fn test_state_follows_content() {
        assert_eq!(Stream::Single(doc()).state(), StreamState::Single);
        assert_eq!(Stream::Multi(vec![doc(), doc()]).state(), StreamState::Multi);
    }

    #[test]
    fn test_input_contract_admission() {
        assert!(InputContract::None.admits(None));
        assert!(!InputContract::None.admits(Some(StreamState::Single)));
        assert!(InputContract::Single.admits(Some(StreamState::Single)));
        assert!(!InputContract::Single.admits(Some(StreamState::Multi)));
        assert!(!InputContract::Multi.admits(Some(StreamState::Single)));
        assert!(InputContract::Any.admits(Some(StreamState::Single)));
        assert!(InputContract::Any.admits(Some(StreamState::Multi)));
        assert!(!InputContract::Any.admits(None));
    }

    #[test]
    fn test_describe() {
        assert_eq!(Stream::Single(doc()).describe(), "single document");
        assert_eq!(
            Stream::Multi(vec![doc(), doc(), doc()]).describe(),
            "multi (3 units)"
        );
    }
}
