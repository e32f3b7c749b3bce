// SPDX-License-Identifier: MIT OR Apache-2.0
//! The shared falloff knob.
//!
//! Every per-link sampler reads the same master ramp, so reshaping the
//! curve here live-updates every link's multiplier at once. This is the
//! one piece of the wired graph that stays deliberately mutable after
//! construction.

use crate::rig::RigError;
use rigweave_graph::{
    CurveInterpolation, Evaluator, FalloffCurve, Graph, GraphError, NodeId, NodeRegistry, PortId,
    PortValue,
};

/// Handle to the master falloff ramp of a distributed rotation
#[derive(Debug, Clone, Copy)]
pub struct FalloffControl {
    node: NodeId,
    constant: PortId,
    output: PortId,
}

impl FalloffControl {
    /// Create the master ramp node seeded with the symmetric rotation
    /// profile for `link_count` links
    pub(crate) fn build(
        graph: &mut Graph,
        registry: &NodeRegistry,
        link_count: usize,
    ) -> Result<Self, RigError> {
        let node = graph.add_node(registry.create("falloff_ramp")?);
        let constant = graph.input_port(node, "Curve")?;
        let output = graph.output_port(node, "Curve")?;
        graph.set_constant(
            node,
            constant,
            PortValue::Curve(FalloffCurve::rotation_falloff(link_count)),
        )?;
        Ok(Self {
            node,
            constant,
            output,
        })
    }

    /// The ramp's curve output, for wiring samplers
    pub(crate) fn source(&self) -> (NodeId, PortId) {
        (self.node, self.output)
    }

    /// The node carrying the ramp
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Read the current curve
    pub fn curve(&self, graph: &Graph) -> Result<FalloffCurve, RigError> {
        match graph.constant(self.node, self.constant) {
            Some(PortValue::Curve(curve)) => Ok(curve.clone()),
            _ => Err(GraphError::NodeNotFound(self.node).into()),
        }
    }

    /// Replace the curve wholesale and invalidate downstream samplers
    pub fn set_curve(
        &self,
        graph: &mut Graph,
        evaluator: &mut Evaluator,
        curve: FalloffCurve,
    ) -> Result<(), RigError> {
        graph.set_constant(self.node, self.constant, PortValue::Curve(curve))?;
        evaluator.invalidate(graph, self.node);
        Ok(())
    }

    /// Retune both control point values, keeping everything else
    pub fn set_values(
        &self,
        graph: &mut Graph,
        evaluator: &mut Evaluator,
        start: f32,
        end: f32,
    ) -> Result<(), RigError> {
        let mut curve = self.curve(graph)?;
        curve.set_values(start, end);
        self.set_curve(graph, evaluator, curve)
    }

    /// Switch the interpolation mode of both control points
    pub fn set_interpolation(
        &self,
        graph: &mut Graph,
        evaluator: &mut Evaluator,
        interpolation: CurveInterpolation,
    ) -> Result<(), RigError> {
        let mut curve = self.curve(graph)?;
        curve.set_interpolation(interpolation);
        self.set_curve(graph, evaluator, curve)
    }
}
