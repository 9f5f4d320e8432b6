use crate::NodeId;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A NodeType indicates whether the node's network
/// equivalent computes an activation or merely
/// holds a loaded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Computing nodes (hidden and output).
    Neuron,
    /// Input and bias nodes.
    Sensor,
}

/// A NodePlace indicates the role a node plays
/// in the genome's topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodePlace {
    Input,
    Output,
    Bias,
    Hidden,
}

impl NodePlace {
    /// Returns the node type implied by the placement.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{NodePlace, NodeType};
    ///
    /// assert_eq!(NodePlace::Bias.node_type(), NodeType::Sensor);
    /// assert_eq!(NodePlace::Output.node_type(), NodeType::Neuron);
    /// ```
    pub fn node_type(self) -> NodeType {
        match self {
            NodePlace::Input | NodePlace::Bias => NodeType::Sensor,
            NodePlace::Output | NodePlace::Hidden => NodeType::Neuron,
        }
    }
}

/// Nodes are the structural elements of genomes
/// between which genes are created.
///
/// Only the genetic part of a node is stored in the
/// genome. Runtime state lives in the [`Network`]
/// built from it.
///
/// [`Network`]: crate::networks::Network
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    place: NodePlace,
}

impl Node {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use subneat_nn::genomics::{Node, NodePlace, NodeType};
    ///
    /// let node = Node::new(5, NodePlace::Hidden);
    ///
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.node_type(), NodeType::Neuron);
    /// ```
    pub fn new(id: NodeId, place: NodePlace) -> Node {
        Node { id, place }
    }

    /// Returns the node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's placement.
    pub fn place(&self) -> NodePlace {
        self.place
    }

    /// Returns the node's type.
    pub fn node_type(&self) -> NodeType {
        self.place.node_type()
    }

    /// Returns `true` for input and bias nodes.
    pub fn is_sensor(&self) -> bool {
        self.node_type() == NodeType::Sensor
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}, {:?})", self.id, self.place)
    }
}
