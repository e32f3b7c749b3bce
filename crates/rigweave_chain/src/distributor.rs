// SPDX-License-Identifier: MIT OR Apache-2.0
//! Spreading one extracted angle across the chain's links.
//!
//! The angle is divided by link count plus one - the reserved share stays
//! with the tip/base joint itself - and each link binds either that
//! uniform fraction or the fraction scaled by its falloff multiplier.

use crate::chain::{BodyId, Chain};
use crate::extractor::{Axis, LiveScalar};
use crate::falloff::FalloffControl;
use crate::rig::RigError;
use rigweave_graph::{Graph, NodeRegistry, PortType, PortValue};
use serde::{Deserialize, Serialize};

/// A link's bound rotation value.
///
/// The host applies `value` (read through the rig) to `body`'s rotation
/// attribute for `axis`; the other two rotation channels are untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationBinding {
    /// The link receiving the rotation
    pub body: BodyId,
    /// The rotation channel driven on that link
    pub axis: Axis,
    /// Live source of the rotation value, in radians
    pub value: LiveScalar,
}

/// The wired distribution network
#[derive(Debug, Clone)]
pub struct WeightDistributor {
    /// Per-link bindings, in chain link order
    pub bindings: Vec<RotationBinding>,
    /// The master falloff knob, when falloff is enabled
    pub falloff: Option<FalloffControl>,
}

impl WeightDistributor {
    /// Wire the distribution network into `graph`.
    ///
    /// `angle` must address a live scalar output already present in the
    /// graph (the extractor's), otherwise construction fails with
    /// [`RigError::NotReady`] before any node is created.
    pub fn build(
        graph: &mut Graph,
        registry: &NodeRegistry,
        angle: LiveScalar,
        chain: &Chain,
        axis: Axis,
        enable_falloff: bool,
    ) -> Result<Self, RigError> {
        let angle_ready = graph.node(angle.node).is_some_and(|node| {
            node.outputs.iter().any(|port| {
                port.id == angle.port
                    && matches!(port.port_type, PortType::Scalar | PortType::EulerAngle)
            })
        });
        if !angle_ready {
            return Err(RigError::NotReady);
        }

        let link_count = chain.link_count();
        if enable_falloff && link_count == 0 {
            return Err(RigError::InsufficientLinks);
        }

        // One share per link plus one reserved for the joint itself.
        let divide = graph.add_node(registry.create("divide")?);
        let divide_value = graph.input_port(divide, "Value")?;
        let divide_divisor = graph.input_port(divide, "Divisor")?;
        let divide_out = graph.output_port(divide, "Result")?;
        graph.connect(angle.node, angle.port, divide, divide_value)?;
        graph.set_constant(
            divide,
            divide_divisor,
            PortValue::Scalar((link_count + 1) as f32),
        )?;

        let base_fraction = LiveScalar {
            node: divide,
            port: divide_out,
        };

        let falloff = if enable_falloff {
            Some(FalloffControl::build(graph, registry, link_count)?)
        } else {
            None
        };

        let mut bindings = Vec::with_capacity(link_count);
        for (index, body) in chain.links().iter().enumerate() {
            let value = match &falloff {
                Some(control) => {
                    Self::wire_weighted_link(graph, registry, control, base_fraction, index)?
                }
                None => base_fraction,
            };
            bindings.push(RotationBinding {
                body: body.clone(),
                axis,
                value,
            });
        }

        Ok(Self { bindings, falloff })
    }

    /// One link's weighted branch: sample the shared ramp at the link's
    /// position and scale the uniform fraction by it
    fn wire_weighted_link(
        graph: &mut Graph,
        registry: &NodeRegistry,
        control: &FalloffControl,
        base_fraction: LiveScalar,
        index: usize,
    ) -> Result<LiveScalar, RigError> {
        let (ramp_node, ramp_out) = control.source();

        let sampler = graph.add_node(registry.create("sample_curve")?);
        let sampler_curve = graph.input_port(sampler, "Curve")?;
        let sampler_position = graph.input_port(sampler, "Position")?;
        let sampler_out = graph.output_port(sampler, "Value")?;
        graph.connect(ramp_node, ramp_out, sampler, sampler_curve)?;
        graph.set_constant(sampler, sampler_position, PortValue::Scalar(index as f32))?;

        let scale = graph.add_node(registry.create("multiply")?);
        let scale_a = graph.input_port(scale, "A")?;
        let scale_b = graph.input_port(scale, "B")?;
        let scale_out = graph.output_port(scale, "Result")?;
        graph.connect(sampler, sampler_out, scale, scale_a)?;
        graph.connect(base_fraction.node, base_fraction.port, scale, scale_b)?;

        Ok(LiveScalar {
            node: scale,
            port: scale_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::RotationExtractor;
    use glam::{Mat4, Quat};
    use rigweave_graph::{create_transform_registry, Evaluator, NodeId, PortId};

    fn chain(names: &[&str]) -> Chain {
        Chain::from_selection(names.iter().map(|n| BodyId::from(*n)).collect()).unwrap()
    }

    fn rigged(
        links: &[&str],
        enable_falloff: bool,
    ) -> (Graph, Evaluator, RotationExtractor, WeightDistributor) {
        let mut selection = vec!["wrist", "elbow"];
        selection.extend_from_slice(links);
        let chain = chain(&selection);
        let registry = create_transform_registry();
        let mut graph = Graph::new("distribution");
        let extractor = RotationExtractor::build(&mut graph, &registry, Axis::X).unwrap();
        let distributor = WeightDistributor::build(
            &mut graph,
            &registry,
            extractor.angle,
            &chain,
            Axis::X,
            enable_falloff,
        )
        .unwrap();
        (graph, Evaluator::new(), extractor, distributor)
    }

    fn twist_tip(graph: &mut Graph, evaluator: &mut Evaluator, extractor: &RotationExtractor, degrees: f32) {
        graph
            .set_constant(
                extractor.tip.node,
                extractor.tip.port,
                PortValue::Matrix(Mat4::from_quat(Quat::from_rotation_x(degrees.to_radians()))),
            )
            .unwrap();
        evaluator.invalidate(graph, extractor.tip.node);
    }

    #[test]
    fn test_uniform_distribution() {
        let (mut graph, mut evaluator, extractor, distributor) =
            rigged(&["forearm1", "forearm2"], false);
        twist_tip(&mut graph, &mut evaluator, &extractor, 30.0);

        assert_eq!(distributor.bindings.len(), 2);
        for binding in &distributor.bindings {
            let value = evaluator
                .read_scalar(&graph, binding.value.node, binding.value.port)
                .unwrap();
            assert!((value - 10f32.to_radians()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_symmetric_falloff_collapses_to_uniform_at_two_links() {
        let (mut graph, mut evaluator, extractor, distributor) =
            rigged(&["forearm1", "forearm2"], true);
        twist_tip(&mut graph, &mut evaluator, &extractor, 30.0);

        for binding in &distributor.bindings {
            let value = evaluator
                .read_scalar(&graph, binding.value.node, binding.value.port)
                .unwrap();
            assert!((value - 10f32.to_radians()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_falloff_multipliers_are_symmetric() {
        let (mut graph, mut evaluator, extractor, distributor) =
            rigged(&["a", "b", "c", "d", "e"], true);
        twist_tip(&mut graph, &mut evaluator, &extractor, 45.0);

        let values: Vec<f32> = distributor
            .bindings
            .iter()
            .map(|b| {
                evaluator
                    .read_scalar(&graph, b.value.node, b.value.port)
                    .unwrap()
            })
            .collect();
        let k = values.len();
        for i in 0..k {
            assert!((values[i] - values[k - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_only_selected_axis_is_bound() {
        let (_graph, _evaluator, _extractor, distributor) = rigged(&["forearm1"], false);
        assert!(distributor.bindings.iter().all(|b| b.axis == Axis::X));
    }

    #[test]
    fn test_zero_links_without_falloff_binds_nothing() {
        let (_graph, _evaluator, _extractor, distributor) = rigged(&[], false);
        assert!(distributor.bindings.is_empty());
        assert!(distributor.falloff.is_none());
    }

    #[test]
    fn test_insufficient_links() {
        let chain = chain(&["wrist", "elbow"]);
        let registry = create_transform_registry();
        let mut graph = Graph::new("distribution");
        let extractor = RotationExtractor::build(&mut graph, &registry, Axis::X).unwrap();
        assert!(matches!(
            WeightDistributor::build(&mut graph, &registry, extractor.angle, &chain, Axis::X, true),
            Err(RigError::InsufficientLinks)
        ));
    }

    #[test]
    fn test_not_ready_without_live_angle() {
        let chain = chain(&["wrist", "elbow", "forearm1"]);
        let registry = create_transform_registry();
        let mut graph = Graph::new("distribution");
        let stale = LiveScalar {
            node: NodeId::new(),
            port: PortId::new(),
        };
        let node_count = graph.node_count();
        assert!(matches!(
            WeightDistributor::build(&mut graph, &registry, stale, &chain, Axis::X, false),
            Err(RigError::NotReady)
        ));
        assert_eq!(graph.node_count(), node_count);
    }

    #[test]
    fn test_retuned_falloff_reshapes_links() {
        let (mut graph, mut evaluator, extractor, distributor) =
            rigged(&["forearm1", "forearm2"], true);
        twist_tip(&mut graph, &mut evaluator, &extractor, 30.0);

        let control = distributor.falloff.as_ref().unwrap();
        control
            .set_values(&mut graph, &mut evaluator, 0.0, 1.0)
            .unwrap();

        // positions 0 and 1 now sample multipliers 0 and 2
        let first = &distributor.bindings[0].value;
        let second = &distributor.bindings[1].value;
        let read_first = evaluator.read_scalar(&graph, first.node, first.port).unwrap();
        let read_second = evaluator
            .read_scalar(&graph, second.node, second.port)
            .unwrap();
        assert!(read_first.abs() < 1e-6);
        assert!((read_second - 20f32.to_radians()).abs() < 1e-5);
    }
}
