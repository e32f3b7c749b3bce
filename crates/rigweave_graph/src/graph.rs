// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.
//!
//! All invariants are enforced when the graph is built: type-checked
//! edges, single-writer inputs, and acyclicity. A graph that constructed
//! successfully cannot become invalid afterwards, so evaluation never has
//! to re-validate structure.

use crate::connection::{Connection, ConnectionId};
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortId, PortType, PortValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.connections.retain(|_, c| !c.involves_node(node_id));
        self.nodes.swap_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve an input port ID by name
    pub fn input_port(&self, node_id: NodeId, name: &str) -> Result<PortId, GraphError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.input_named(name)
            .map(|p| p.id)
            .ok_or_else(|| GraphError::PortNotFound(format!("{}.{name}", node.name)))
    }

    /// Resolve an output port ID by name
    pub fn output_port(&self, node_id: NodeId, name: &str) -> Result<PortId, GraphError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.output_named(name)
            .map(|p| p.id)
            .ok_or_else(|| GraphError::PortNotFound(format!("{}.{name}", node.name)))
    }

    /// Add a connection from an output port to an input port.
    ///
    /// Fails without creating an edge if either endpoint is missing, the
    /// directions or types do not line up, the input is already fed, or the
    /// edge would close a cycle.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<ConnectionId, GraphError> {
        let source_node = self
            .nodes
            .get(&from_node)
            .ok_or(GraphError::NodeNotFound(from_node))?;
        let target_node = self
            .nodes
            .get(&to_node)
            .ok_or(GraphError::NodeNotFound(to_node))?;

        let source_port = source_node
            .port(&from_port)
            .ok_or_else(|| GraphError::PortNotFound(from_port.to_string()))?;
        let target_port = target_node
            .port(&to_port)
            .ok_or_else(|| GraphError::PortNotFound(to_port.to_string()))?;

        if source_port.direction != PortDirection::Output {
            return Err(GraphError::NotAnOutput(source_port.name.clone()));
        }
        if target_port.direction != PortDirection::Input {
            return Err(GraphError::NotAnInput(target_port.name.clone()));
        }

        if !source_port.port_type.can_connect_to(target_port.port_type) {
            return Err(GraphError::TypeMismatch {
                from: source_port.port_type,
                to: target_port.port_type,
            });
        }

        // Inputs have a single writer; outputs fan out freely.
        if self.connections.values().any(|c| c.to_port == to_port) {
            return Err(GraphError::PortOccupied(target_port.name.clone()));
        }

        if from_node == to_node {
            return Err(GraphError::SelfLoop);
        }
        if self.reaches(to_node, from_node) {
            return Err(GraphError::CycleDetected);
        }

        let connection = Connection::new(from_node, from_port, to_node, to_port);
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Bind a literal value to an otherwise-unconnected input port
    pub fn set_constant(
        &mut self,
        node_id: NodeId,
        port_id: PortId,
        value: PortValue,
    ) -> Result<(), GraphError> {
        if self.connections.values().any(|c| c.to_port == port_id) {
            return Err(GraphError::PortOccupied(port_id.to_string()));
        }
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let port = node
            .inputs
            .iter_mut()
            .find(|p| p.id == port_id)
            .ok_or_else(|| GraphError::PortNotFound(port_id.to_string()))?;
        if !value.port_type().can_connect_to(port.port_type) {
            return Err(GraphError::TypeMismatch {
                from: value.port_type(),
                to: port.port_type,
            });
        }
        port.constant = Some(value);
        Ok(())
    }

    /// Read the constant bound to an input port
    pub fn constant(&self, node_id: NodeId, port_id: PortId) -> Option<&PortValue> {
        self.nodes
            .get(&node_id)?
            .inputs
            .iter()
            .find(|p| p.id == port_id)?
            .constant
            .as_ref()
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        self.connections.swap_remove(&connection_id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the connection feeding a specific input port
    pub fn connection_to(&self, port_id: PortId) -> Option<&Connection> {
        self.connections.values().find(|c| c.to_port == port_id)
    }

    /// Get connections from a specific port
    pub fn connections_from(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.from_port == port_id)
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether `target` is reachable from `start` along connection direction
    fn reaches(&self, start: NodeId, target: NodeId) -> bool {
        let mut pending = vec![start];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = pending.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            for connection in self.connections.values() {
                if connection.from_node == current {
                    pending.push(connection.to_node);
                }
            }
        }
        false
    }

    /// Get nodes in a valid topological order.
    ///
    /// Deterministic for a fixed graph: ties are broken by insertion order.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = std::collections::HashSet::new();
        let mut temp_mark = std::collections::HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        order.reverse();
        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut std::collections::HashSet<NodeId>,
        temp_mark: &mut std::collections::HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError);
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        for connection in self.connections_for_node(node_id) {
            if connection.from_node == node_id {
                self.visit(connection.to_node, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when constructing a graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Unrecognized node kind
    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    /// Node not found
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("port not found: {0}")]
    PortNotFound(String),

    /// Connection source is not an output port
    #[error("{0} is not an output port")]
    NotAnOutput(String),

    /// Connection target is not an input port
    #[error("{0} is not an input port")]
    NotAnInput(String),

    /// Incompatible port types
    #[error("incompatible port types: {from:?} -> {to:?}")]
    TypeMismatch {
        /// Source value type
        from: PortType,
        /// Target port type
        to: PortType,
    },

    /// Input port already has a writer
    #[error("input port already connected: {0}")]
    PortOccupied(String),

    /// Connection from a node to itself
    #[error("connection would form a self-loop")]
    SelfLoop,

    /// Connection would close a cycle
    #[error("connection would form a cycle")]
    CycleDetected,
}

/// Error when a graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("graph contains a cycle")]
pub struct CycleError;
