//! Scene errors

use strata_core::CoreError;
use strata_paint::PaintError;
use strata_text::TextError;
use thiserror::Error;

use crate::node::{NodeId, NodeKind};

/// Errors raised by scene-graph operations
///
/// Misuse of the graph (stale ids, cycles, wrong node kind) is reported at
/// the call site and leaves the graph untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Node {0:?} does not exist or has been disposed")]
    UnknownNode(NodeId),

    #[error("Adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("Node {id:?} is a {kind:?}, not a container")]
    NotAContainer { id: NodeId, kind: NodeKind },

    #[error("Node {id:?} is a {actual:?}, expected {expected:?}")]
    WrongKind {
        id: NodeId,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("The root container cannot be {0}")]
    RootNode(&'static str),

    #[error("Child index {index} out of range (container has {len} children)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Layer {0} does not exist")]
    UnknownLayer(i32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Text(#[from] TextError),

    #[error(transparent)]
    Paint(#[from] PaintError),
}

impl From<toml::de::Error> for SceneError {
    fn from(err: toml::de::Error) -> Self {
        SceneError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SceneError {
    fn from(err: toml::ser::Error) -> Self {
        SceneError::Config(err.to_string())
    }
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
