// SPDX-License-Identifier: MIT OR Apache-2.0
//! The relative-rotation extractor subgraph.
//!
//! Expresses "rotation of the tip as seen from the base's frame" as a live
//! angle: the base's world matrix is inverted and composed with the tip's,
//! the product's orientation is decomposed to a quaternion, and the twist
//! about one axis is read off. Both world matrices are graph inputs the
//! host keeps current; everything downstream recomputes on demand.

use crate::rig::RigError;
use glam::Mat4;
use rigweave_graph::{Graph, NodeId, NodeRegistry, PortId, PortValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The rotation channel extracted and distributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    /// Rotation about X
    #[default]
    X,
    /// Rotation about Y
    Y,
    /// Rotation about Z
    Z,
}

impl Axis {
    /// Name of the twist output port carrying this axis
    pub(crate) fn output_name(self) -> &'static str {
        match self {
            Self::X => "Rotate X",
            Self::Y => "Rotate Y",
            Self::Z => "Rotate Z",
        }
    }

    /// Name of the rotation attribute this axis drives on a link
    pub fn attribute(self) -> &'static str {
        match self {
            Self::X => "rotateX",
            Self::Y => "rotateY",
            Self::Z => "rotateZ",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        };
        f.write_str(name)
    }
}

impl FromStr for Axis {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "x" | "X" => Ok(Self::X),
            "y" | "Y" => Ok(Self::Y),
            "z" | "Z" => Ok(Self::Z),
            other => Err(RigError::InvalidAxis(other.to_string())),
        }
    }
}

/// Address of a live scalar output in a graph.
///
/// Reading it through an evaluator always reflects the current upstream
/// transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveScalar {
    /// Node owning the output
    pub node: NodeId,
    /// The output port
    pub port: PortId,
}

/// Address of a live matrix input constant in a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixInput {
    /// Node owning the input
    pub node: NodeId,
    /// The input port holding the constant
    pub port: PortId,
}

/// The wired extractor subgraph and its live addresses
#[derive(Debug, Clone, Copy)]
pub struct RotationExtractor {
    /// Input fed with the tip's world matrix
    pub tip: MatrixInput,
    /// Input fed with the base's world matrix
    pub base: MatrixInput,
    /// The extracted twist angle about the chosen axis, in radians
    pub angle: LiveScalar,
}

impl RotationExtractor {
    /// Wire the extractor into `graph`.
    ///
    /// Both world-matrix inputs start at identity, so the angle reads
    /// exactly zero until the host writes real transforms - coincident
    /// bodies are a valid pose, not an error.
    pub fn build(graph: &mut Graph, registry: &NodeRegistry, axis: Axis) -> Result<Self, RigError> {
        let tip_node = graph.add_node(registry.create("world_matrix")?);
        let base_node = graph.add_node(registry.create("world_matrix")?);
        let inverse = graph.add_node(registry.create("inverse_matrix")?);
        let relative = graph.add_node(registry.create("mult_matrix")?);
        let decompose = graph.add_node(registry.create("decompose_matrix")?);
        let to_euler = graph.add_node(registry.create("quat_to_euler")?);

        let tip_value = graph.input_port(tip_node, "Value")?;
        let base_value = graph.input_port(base_node, "Value")?;
        let tip_out = graph.output_port(tip_node, "Matrix")?;
        let base_out = graph.output_port(base_node, "Matrix")?;

        graph.set_constant(tip_node, tip_value, PortValue::Matrix(Mat4::IDENTITY))?;
        graph.set_constant(base_node, base_value, PortValue::Matrix(Mat4::IDENTITY))?;

        // Base frame is inverted and applied first: the product maps
        // tip-local coordinates into the base's frame.
        let inverse_in = graph.input_port(inverse, "Matrix")?;
        let inverse_out = graph.output_port(inverse, "Result")?;
        graph.connect(base_node, base_out, inverse, inverse_in)?;

        let relative_a = graph.input_port(relative, "A")?;
        let relative_b = graph.input_port(relative, "B")?;
        let relative_out = graph.output_port(relative, "Result")?;
        graph.connect(inverse, inverse_out, relative, relative_a)?;
        graph.connect(tip_node, tip_out, relative, relative_b)?;

        let decompose_in = graph.input_port(decompose, "Matrix")?;
        let decompose_out = graph.output_port(decompose, "Rotation")?;
        graph.connect(relative, relative_out, decompose, decompose_in)?;

        let euler_in = graph.input_port(to_euler, "Rotation")?;
        graph.connect(decompose, decompose_out, to_euler, euler_in)?;

        let angle_port = graph.output_port(to_euler, axis.output_name())?;

        Ok(Self {
            tip: MatrixInput {
                node: tip_node,
                port: tip_value,
            },
            base: MatrixInput {
                node: base_node,
                port: base_value,
            },
            angle: LiveScalar {
                node: to_euler,
                port: angle_port,
            },
        })
    }
}
