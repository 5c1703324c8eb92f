use crate::NodeId;

use thiserror::Error;

/// An error type indicating a failure
/// to evaluate a genome or network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The number of inputs passed does not match the
    /// number of non-bias input nodes.
    #[error("expected {expected} inputs, received {actual}")]
    InputLengthMismatch { expected: usize, actual: usize },
    /// An output node did not receive all of its declared inputs.
    /// Only possible for malformed genomes.
    #[error("output node {0} finished evaluation with missing inputs")]
    IncompleteOutput(NodeId),
}

/// An error type indicating a rejected genome import.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// The text did not start with a layer count.
    #[error("missing or invalid layer count header")]
    InvalidLayerCount,
    /// A node or connection entry was cut short
    /// or carried an unparseable field.
    #[error("malformed {kind} entry: {line:?}")]
    MalformedEntry { kind: &'static str, line: String },
    /// A section marker other than `N` or `C` was found.
    #[error("unexpected section marker {0:?}")]
    UnexpectedMarker(String),
    /// A node type other than `Input`, `Hidden` or `Output`.
    #[error("unknown node type {0:?}")]
    UnknownNodeType(String),
    /// Two nodes share an id.
    #[error("duplicate node with id {0}")]
    DuplicateNode(NodeId),
    /// Two connections share a historical marking.
    #[error("duplicate connection with marking {0}")]
    DuplicateConnection(usize),
    /// Two connections share the same endpoints.
    #[error("duplicate connection between nodes {0} -> {1}")]
    DuplicateEndpoints(NodeId, NodeId),
    /// A connection references a node not declared before it.
    #[error("connection references unknown node {0}")]
    UnknownNode(NodeId),
    /// The genome has no input or no output nodes.
    #[error("genome lacks input or output nodes")]
    MissingIoNodes,
    /// The declared layers break the ordering rules.
    #[error("inconsistent layers: {0}")]
    InconsistentLayers(String),
    /// A node's declared input count does not match its connections.
    #[error("node {node} declares {declared} inputs, but {actual} connections feed it")]
    InconsistentInputCount {
        node: NodeId,
        declared: usize,
        actual: usize,
    },
    /// The connections describe a cycle.
    #[error("connection {0} -> {1} closes a cycle")]
    Cycle(NodeId, NodeId),
}

/// An error type indicating a failure
/// to carry out a connection addition mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeneAdditionError {
    /// No origin/destination pair could be connected
    /// without duplicating a connection or closing a cycle.
    #[error("no viable origin-destination pair found for connection mutation")]
    NoViablePair,
}

/// An error type indicating a failure
/// to carry out a node addition mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NodeAdditionError {
    /// The genome had no enabled connection to split.
    #[error("node mutation on genome without enabled connections")]
    NoEnabledConnection,
}

/// An error type indicating an invalid
/// fixed-topology network shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Fewer than an input and an output layer were requested.
    #[error("a network needs at least 2 layers, {0} requested")]
    TooFewLayers(usize),
    /// The layer at the given position has no neurons.
    #[error("layer {0} is empty")]
    EmptyLayer(usize),
}
