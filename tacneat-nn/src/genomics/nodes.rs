use crate::NodeId;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// A NodeType indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes. The first one of a genome is the bias.
    Input,
    /// Hidden nodes, created by node addition mutations.
    Hidden,
    /// Output nodes.
    Output,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "Input",
            Self::Hidden => "Hidden",
            Self::Output => "Output",
        };
        f.write_str(name)
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<NodeType, String> {
        match s {
            "Input" => Ok(Self::Input),
            "Hidden" => Ok(Self::Hidden),
            "Output" => Ok(Self::Output),
            other => Err(other.to_string()),
        }
    }
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
///
/// A node's `layer` only orders evaluation: every node feeding
/// it sits on a strictly lower layer.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    node_type: NodeType,
    layer: usize,
    input_count: usize,
}

impl Node {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{Node, NodeType};
    ///
    /// let node = Node::new(5, NodeType::Hidden, 1, 0);
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.layer(), 1);
    /// ```
    pub fn new(id: NodeId, node_type: NodeType, layer: usize, input_count: usize) -> Node {
        Node {
            id,
            node_type,
            layer,
            input_count,
        }
    }

    /// Returns the node's identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the node's layer.
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Returns the number of contributions the node
    /// waits for before it can fire. Always 1 for inputs.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub(super) fn set_layer(&mut self, layer: usize) {
        self.layer = layer;
    }

    pub(super) fn set_input_count(&mut self, input_count: usize) {
        self.input_count = input_count;
    }

    pub(super) fn increment_input_count(&mut self) {
        self.input_count += 1;
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.id, self.node_type, self.layer, self.input_count
        )
    }
}
