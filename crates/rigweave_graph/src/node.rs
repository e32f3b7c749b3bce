// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::graph::GraphError;
use crate::port::{Port, PortId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Input nodes fed by the host
    Input,
    /// Matrix/quaternion/scalar math
    Math,
    /// Curve definition and sampling
    Curve,
    /// Utility nodes
    Utility,
}

/// The pure computation a node performs.
///
/// Every op is a function of its current input values only; evaluation
/// order cannot change a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Pass-through for a host-fed world transform
    WorldMatrix,
    /// Matrix product `A * B`
    MultMatrix,
    /// Matrix inverse
    InverseMatrix,
    /// Orientation of a matrix as a unit quaternion (scale and
    /// translation discarded)
    DecomposeMatrix,
    /// Per-axis twist angles of a quaternion; each output uses that
    /// axis's component plus W only
    QuatToEuler,
    /// Scalar division
    Divide,
    /// Scalar product
    Multiply,
    /// Pass-through for a falloff curve constant
    FalloffRamp,
    /// Sample a curve at a position
    SampleCurve,
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique kind identifier
    pub kind: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Computation performed by instances of this type
    pub op: OpKind,
    /// Description
    pub description: String,
    /// Input port layout
    pub inputs: Vec<Port>,
    /// Output port layout
    pub outputs: Vec<Port>,
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node kind identifier
    pub kind: String,
    /// Computation performed by this node
    pub op: OpKind,
    /// Display name
    pub name: String,
    /// Input ports
    pub inputs: Vec<Port>,
    /// Output ports
    pub outputs: Vec<Port>,
}

impl Node {
    /// Create a new node from a type definition.
    ///
    /// Every instance gets fresh port IDs so connections address one node's
    /// ports, never the shared layout in the registry.
    pub fn new(node_type: &NodeType) -> Self {
        let instantiate = |ports: &[Port]| -> Vec<Port> {
            ports
                .iter()
                .map(|port| Port {
                    id: PortId::new(),
                    ..port.clone()
                })
                .collect()
        };
        Self {
            id: NodeId::new(),
            kind: node_type.kind.clone(),
            op: node_type.op,
            name: node_type.name.clone(),
            inputs: instantiate(&node_type.inputs),
            outputs: instantiate(&node_type.outputs),
        }
    }

    /// Get a port by ID
    pub fn port(&self, port_id: &PortId) -> Option<&Port> {
        self.inputs
            .iter()
            .find(|p| p.id == *port_id)
            .or_else(|| self.outputs.iter().find(|p| p.id == *port_id))
    }

    /// Get an input port by name
    pub fn input_named(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output_named(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }
}

/// Registry of available node kinds
pub struct NodeRegistry {
    /// Registered node types by kind
    types: indexmap::IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: indexmap::IndexMap::new(),
        }
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.kind.clone(), node_type);
    }

    /// Get a node type by kind
    pub fn get(&self, kind: &str) -> Option<&NodeType> {
        self.types.get(kind)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Create a node of the given kind
    pub fn create(&self, kind: &str) -> Result<Node, GraphError> {
        self.get(kind)
            .map(Node::new)
            .ok_or_else(|| GraphError::UnknownKind(kind.to_string()))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
