// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pull-based graph evaluation with memoization and dirty propagation.
//!
//! Nothing evaluates eagerly: reading an output resolves its upstream
//! dependencies recursively, computes only what is stale, and caches the
//! rest. Writing a constant invalidates the downstream closure, so the
//! next read recomputes exactly the affected nodes. Node ops are pure, so
//! every valid resolution order produces the same values.

use crate::curve::CurveError;
use crate::graph::Graph;
use crate::node::{Node, NodeId, OpKind};
use crate::port::{PortId, PortValue};
use glam::{Mat4, Quat};
use std::collections::{HashMap, HashSet};

/// Result of evaluating a node
#[derive(Debug, Clone, Default)]
pub struct NodeOutput {
    /// Output values by port ID
    pub values: HashMap<PortId, PortValue>,
}

impl NodeOutput {
    /// Create a new empty output
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set an output value
    pub fn set(&mut self, port_id: PortId, value: PortValue) {
        self.values.insert(port_id, value);
    }

    /// Get an output value
    pub fn get(&self, port_id: &PortId) -> Option<&PortValue> {
        self.values.get(port_id)
    }
}

/// Lazy evaluator for a [`Graph`].
///
/// Owns the memoized outputs and the dirty set; the graph itself stays
/// immutable during evaluation, so the host can keep handles into it.
#[derive(Debug, Default)]
pub struct Evaluator {
    cache: HashMap<NodeId, NodeOutput>,
    dirty: HashSet<NodeId>,
}

impl Evaluator {
    /// Create an evaluator with an empty cache; every node is stale until
    /// first read
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a node, resolving upstream dependencies as needed.
    ///
    /// Re-reading an unchanged node is a cache hit.
    pub fn evaluate(&mut self, graph: &Graph, node_id: NodeId) -> Result<&NodeOutput, EvaluationError> {
        let mut stack = Vec::new();
        self.resolve(graph, node_id, &mut stack)?;
        self.cache
            .get(&node_id)
            .ok_or(EvaluationError::NodeNotFound(node_id))
    }

    /// Evaluate a node and read one scalar-valued output port
    pub fn read_scalar(
        &mut self,
        graph: &Graph,
        node_id: NodeId,
        port_id: PortId,
    ) -> Result<f32, EvaluationError> {
        let output = self.evaluate(graph, node_id)?;
        match output.get(&port_id) {
            Some(PortValue::Scalar(v) | PortValue::EulerAngle(v)) => Ok(*v),
            Some(_) => Err(EvaluationError::TypeMismatch),
            None => Err(EvaluationError::PortNotFound(port_id.to_string())),
        }
    }

    /// Mark a node and its downstream closure stale.
    ///
    /// Call after rebinding one of the node's input constants; the next
    /// read of any affected output recomputes from this node onwards.
    pub fn invalidate(&mut self, graph: &Graph, node_id: NodeId) {
        let mut pending = vec![node_id];
        while let Some(current) = pending.pop() {
            if !self.dirty.insert(current) {
                continue;
            }
            for connection in graph.connections() {
                if connection.from_node == current {
                    pending.push(connection.to_node);
                }
            }
        }
    }

    /// Whether a node has a cached, up-to-date output
    pub fn is_current(&self, node_id: NodeId) -> bool {
        self.cache.contains_key(&node_id) && !self.dirty.contains(&node_id)
    }

    fn resolve(
        &mut self,
        graph: &Graph,
        node_id: NodeId,
        stack: &mut Vec<NodeId>,
    ) -> Result<(), EvaluationError> {
        if self.is_current(node_id) {
            return Ok(());
        }
        // Construction rejects cycles; this guard keeps misuse from hanging.
        if stack.contains(&node_id) {
            return Err(EvaluationError::CycleDetected);
        }
        stack.push(node_id);

        let node = graph
            .node(node_id)
            .ok_or(EvaluationError::NodeNotFound(node_id))?;

        let mut inputs = Vec::with_capacity(node.inputs.len());
        for port in &node.inputs {
            let value = if let Some(connection) = graph.connection_to(port.id) {
                self.resolve(graph, connection.from_node, stack)?;
                let upstream = self
                    .cache
                    .get(&connection.from_node)
                    .ok_or(EvaluationError::NodeNotFound(connection.from_node))?;
                upstream
                    .get(&connection.from_port)
                    .cloned()
                    .ok_or_else(|| EvaluationError::PortNotFound(connection.from_port.to_string()))?
            } else if let Some(constant) = &port.constant {
                constant.clone()
            } else {
                return Err(EvaluationError::MissingInput(port.name.clone()));
            };
            inputs.push(value);
        }

        let output = compute(node, &inputs)?;
        self.cache.insert(node_id, output);
        self.dirty.remove(&node_id);
        stack.pop();
        Ok(())
    }
}

/// Apply a node's op to its resolved input values
fn compute(node: &Node, inputs: &[PortValue]) -> Result<NodeOutput, EvaluationError> {
    let mut output = NodeOutput::new();
    match node.op {
        OpKind::WorldMatrix => {
            output.set(output_id(node, 0)?, PortValue::Matrix(matrix(input(node, inputs, 0)?)?));
        }
        OpKind::MultMatrix => {
            let a = matrix(input(node, inputs, 0)?)?;
            let b = matrix(input(node, inputs, 1)?)?;
            output.set(output_id(node, 0)?, PortValue::Matrix(a * b));
        }
        OpKind::InverseMatrix => {
            let m = matrix(input(node, inputs, 0)?)?;
            output.set(output_id(node, 0)?, PortValue::Matrix(m.inverse()));
        }
        OpKind::DecomposeMatrix => {
            let m = matrix(input(node, inputs, 0)?)?;
            let (_scale, rotation, _translation) = m.to_scale_rotation_translation();
            output.set(output_id(node, 0)?, PortValue::Quaternion(rotation));
        }
        OpKind::QuatToEuler => {
            let q = quaternion(input(node, inputs, 0)?)?;
            output.set(output_id(node, 0)?, PortValue::EulerAngle(twist(q.x, q.w)));
            output.set(output_id(node, 1)?, PortValue::EulerAngle(twist(q.y, q.w)));
            output.set(output_id(node, 2)?, PortValue::EulerAngle(twist(q.z, q.w)));
        }
        OpKind::Divide => {
            let value = scalar(input(node, inputs, 0)?)?;
            let divisor = scalar(input(node, inputs, 1)?)?;
            if divisor == 0.0 {
                return Err(EvaluationError::DivideByZero);
            }
            output.set(output_id(node, 0)?, PortValue::Scalar(value / divisor));
        }
        OpKind::Multiply => {
            let a = scalar(input(node, inputs, 0)?)?;
            let b = scalar(input(node, inputs, 1)?)?;
            output.set(output_id(node, 0)?, PortValue::Scalar(a * b));
        }
        OpKind::FalloffRamp => {
            let curve = curve(input(node, inputs, 0)?)?;
            output.set(output_id(node, 0)?, PortValue::Curve(curve.clone()));
        }
        OpKind::SampleCurve => {
            let curve = curve(input(node, inputs, 0)?)?;
            let position = scalar(input(node, inputs, 1)?)?;
            output.set(output_id(node, 0)?, PortValue::Scalar(curve.sample(position)?));
        }
    }
    Ok(output)
}

/// Rotation about one axis from that axis's quaternion component and W,
/// the other two components held at identity
fn twist(component: f32, w: f32) -> f32 {
    2.0 * component.atan2(w)
}

fn input<'a>(
    node: &Node,
    inputs: &'a [PortValue],
    index: usize,
) -> Result<&'a PortValue, EvaluationError> {
    inputs.get(index).ok_or_else(|| {
        EvaluationError::MissingInput(format!("{}[{index}]", node.name))
    })
}

fn output_id(node: &Node, index: usize) -> Result<PortId, EvaluationError> {
    node.outputs
        .get(index)
        .map(|p| p.id)
        .ok_or_else(|| EvaluationError::PortNotFound(format!("{}[{index}]", node.name)))
}

fn matrix(value: &PortValue) -> Result<Mat4, EvaluationError> {
    match value {
        PortValue::Matrix(m) => Ok(*m),
        _ => Err(EvaluationError::TypeMismatch),
    }
}

fn quaternion(value: &PortValue) -> Result<Quat, EvaluationError> {
    match value {
        PortValue::Quaternion(q) => Ok(*q),
        _ => Err(EvaluationError::TypeMismatch),
    }
}

fn scalar(value: &PortValue) -> Result<f32, EvaluationError> {
    match value {
        PortValue::Scalar(v) | PortValue::EulerAngle(v) => Ok(*v),
        _ => Err(EvaluationError::TypeMismatch),
    }
}

fn curve(value: &PortValue) -> Result<&crate::curve::FalloffCurve, EvaluationError> {
    match value {
        PortValue::Curve(c) => Ok(c),
        _ => Err(EvaluationError::TypeMismatch),
    }
}

/// Error during evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// Graph contains a cycle
    #[error("graph contains a cycle")]
    CycleDetected,

    /// Node not found
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("port not found: {0}")]
    PortNotFound(String),

    /// Input port has neither a connection nor a constant
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Value type does not match the op's expectation
    #[error("value type mismatch")]
    TypeMismatch,

    /// Scalar division by zero
    #[error("division by zero")]
    DivideByZero,

    /// Curve sampling failed
    #[error(transparent)]
    Curve(#[from] CurveError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::ops::create_transform_registry;
    use glam::Vec3;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn test_divide_and_multiply() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let divide = graph.add_node(registry.create("divide").unwrap());
        let value = graph.input_port(divide, "Value").unwrap();
        let divisor = graph.input_port(divide, "Divisor").unwrap();
        let result = graph.output_port(divide, "Result").unwrap();
        graph.set_constant(divide, value, PortValue::Scalar(9.0)).unwrap();
        graph.set_constant(divide, divisor, PortValue::Scalar(3.0)).unwrap();

        let mut evaluator = Evaluator::new();
        approx(evaluator.read_scalar(&graph, divide, result).unwrap(), 3.0);
    }

    #[test]
    fn test_divide_by_zero() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let divide = graph.add_node(registry.create("divide").unwrap());
        let value = graph.input_port(divide, "Value").unwrap();
        let divisor = graph.input_port(divide, "Divisor").unwrap();
        graph.set_constant(divide, value, PortValue::Scalar(1.0)).unwrap();
        graph.set_constant(divide, divisor, PortValue::Scalar(0.0)).unwrap();

        let mut evaluator = Evaluator::new();
        assert!(matches!(
            evaluator.evaluate(&graph, divide),
            Err(EvaluationError::DivideByZero)
        ));
    }

    #[test]
    fn test_missing_input() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let multiply = graph.add_node(registry.create("multiply").unwrap());
        let mut evaluator = Evaluator::new();
        assert!(matches!(
            evaluator.evaluate(&graph, multiply),
            Err(EvaluationError::MissingInput(_))
        ));
    }

    #[test]
    fn test_quat_to_euler_single_axis() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let euler = graph.add_node(registry.create("quat_to_euler").unwrap());
        let rotation = graph.input_port(euler, "Rotation").unwrap();
        let angle = 30f32.to_radians();
        graph
            .set_constant(
                euler,
                rotation,
                PortValue::Quaternion(Quat::from_rotation_x(angle)),
            )
            .unwrap();

        let mut evaluator = Evaluator::new();
        let x = graph.output_port(euler, "Rotate X").unwrap();
        let y = graph.output_port(euler, "Rotate Y").unwrap();
        approx(evaluator.read_scalar(&graph, euler, x).unwrap(), angle);
        approx(evaluator.read_scalar(&graph, euler, y).unwrap(), 0.0);
    }

    #[test]
    fn test_decompose_discards_scale_and_translation() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let decompose = graph.add_node(registry.create("decompose_matrix").unwrap());
        let euler = graph.add_node(registry.create("quat_to_euler").unwrap());
        let m_in = graph.input_port(decompose, "Matrix").unwrap();
        let q_out = graph.output_port(decompose, "Rotation").unwrap();
        let q_in = graph.input_port(euler, "Rotation").unwrap();
        graph.connect(decompose, q_out, euler, q_in).unwrap();

        let angle = 40f32.to_radians();
        let world = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(angle),
            Vec3::new(1.0, 2.0, 3.0),
        );
        graph.set_constant(decompose, m_in, PortValue::Matrix(world)).unwrap();

        let mut evaluator = Evaluator::new();
        let z = graph.output_port(euler, "Rotate Z").unwrap();
        let read = evaluator.read_scalar(&graph, euler, z).unwrap();
        assert!((read - angle).abs() < 1e-4, "{read} != {angle}");
    }

    #[test]
    fn test_cache_hits_until_invalidated() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let multiply = graph.add_node(registry.create("multiply").unwrap());
        let a = graph.input_port(multiply, "A").unwrap();
        let b = graph.input_port(multiply, "B").unwrap();
        let result = graph.output_port(multiply, "Result").unwrap();
        graph.set_constant(multiply, a, PortValue::Scalar(2.0)).unwrap();
        graph.set_constant(multiply, b, PortValue::Scalar(3.0)).unwrap();

        let mut evaluator = Evaluator::new();
        assert!(!evaluator.is_current(multiply));
        approx(evaluator.read_scalar(&graph, multiply, result).unwrap(), 6.0);
        assert!(evaluator.is_current(multiply));

        // A write without invalidation is not observed: the cache answers.
        graph.set_constant(multiply, a, PortValue::Scalar(10.0)).unwrap();
        approx(evaluator.read_scalar(&graph, multiply, result).unwrap(), 6.0);

        evaluator.invalidate(&graph, multiply);
        assert!(!evaluator.is_current(multiply));
        approx(evaluator.read_scalar(&graph, multiply, result).unwrap(), 30.0);
    }

    #[test]
    fn test_invalidation_reaches_downstream() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let divide = graph.add_node(registry.create("divide").unwrap());
        let multiply = graph.add_node(registry.create("multiply").unwrap());
        let value = graph.input_port(divide, "Value").unwrap();
        let divisor = graph.input_port(divide, "Divisor").unwrap();
        let div_out = graph.output_port(divide, "Result").unwrap();
        let a = graph.input_port(multiply, "A").unwrap();
        let b = graph.input_port(multiply, "B").unwrap();
        let mul_out = graph.output_port(multiply, "Result").unwrap();
        graph.set_constant(divide, value, PortValue::Scalar(8.0)).unwrap();
        graph.set_constant(divide, divisor, PortValue::Scalar(2.0)).unwrap();
        graph.connect(divide, div_out, multiply, a).unwrap();
        graph.set_constant(multiply, b, PortValue::Scalar(10.0)).unwrap();

        let mut evaluator = Evaluator::new();
        approx(evaluator.read_scalar(&graph, multiply, mul_out).unwrap(), 40.0);

        graph.set_constant(divide, value, PortValue::Scalar(2.0)).unwrap();
        evaluator.invalidate(&graph, divide);
        assert!(!evaluator.is_current(multiply));
        approx(evaluator.read_scalar(&graph, multiply, mul_out).unwrap(), 10.0);
    }

    #[test]
    fn test_sample_curve_through_graph() {
        let registry = create_transform_registry();
        let mut graph = Graph::new("test");
        let ramp = graph.add_node(registry.create("falloff_ramp").unwrap());
        let sampler = graph.add_node(registry.create("sample_curve").unwrap());
        let ramp_in = graph.input_port(ramp, "Curve").unwrap();
        let ramp_out = graph.output_port(ramp, "Curve").unwrap();
        let sampler_curve = graph.input_port(sampler, "Curve").unwrap();
        let sampler_pos = graph.input_port(sampler, "Position").unwrap();
        let sampler_out = graph.output_port(sampler, "Value").unwrap();
        graph
            .set_constant(
                ramp,
                ramp_in,
                PortValue::Curve(crate::curve::FalloffCurve::rotation_falloff(4)),
            )
            .unwrap();
        graph.connect(ramp, ramp_out, sampler, sampler_curve).unwrap();
        graph.set_constant(sampler, sampler_pos, PortValue::Scalar(2.0)).unwrap();

        let mut evaluator = Evaluator::new();
        approx(evaluator.read_scalar(&graph, sampler, sampler_out).unwrap(), 1.0);
    }
}
