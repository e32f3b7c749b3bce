// SPDX-License-Identifier: MIT OR Apache-2.0
//! The standard node kinds for transform rigs.

use crate::node::{NodeCategory, NodeRegistry, NodeType, OpKind};
use crate::port::{Port, PortType, PortValue};
use glam::Mat4;

/// Create the transform-rig node registry.
///
/// Covers host transform inputs, matrix/quaternion algebra, scalar
/// arithmetic, and falloff-curve definition and sampling.
pub fn create_transform_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Transform inputs
    // ========================================================================

    registry.register(NodeType {
        kind: "world_matrix".to_string(),
        name: "World Matrix".to_string(),
        category: NodeCategory::Input,
        op: OpKind::WorldMatrix,
        description: "A rigid body's world transform, written by the host".to_string(),
        inputs: vec![
            Port::input("Value", PortType::Matrix).with_constant(PortValue::Matrix(Mat4::IDENTITY)),
        ],
        outputs: vec![Port::output("Matrix", PortType::Matrix)],
    });

    // ========================================================================
    // Matrix and quaternion algebra
    // ========================================================================

    registry.register(NodeType {
        kind: "mult_matrix".to_string(),
        name: "Mult Matrix".to_string(),
        category: NodeCategory::Math,
        op: OpKind::MultMatrix,
        description: "Product of two matrices, A * B".to_string(),
        inputs: vec![
            Port::input("A", PortType::Matrix),
            Port::input("B", PortType::Matrix),
        ],
        outputs: vec![Port::output("Result", PortType::Matrix)],
    });

    registry.register(NodeType {
        kind: "inverse_matrix".to_string(),
        name: "Inverse Matrix".to_string(),
        category: NodeCategory::Math,
        op: OpKind::InverseMatrix,
        description: "Inverse of a matrix".to_string(),
        inputs: vec![Port::input("Matrix", PortType::Matrix)],
        outputs: vec![Port::output("Result", PortType::Matrix)],
    });

    registry.register(NodeType {
        kind: "decompose_matrix".to_string(),
        name: "Decompose Matrix".to_string(),
        category: NodeCategory::Math,
        op: OpKind::DecomposeMatrix,
        description: "Orientation of a matrix as a unit quaternion".to_string(),
        inputs: vec![Port::input("Matrix", PortType::Matrix)],
        outputs: vec![Port::output("Rotation", PortType::Quaternion)],
    });

    registry.register(NodeType {
        kind: "quat_to_euler".to_string(),
        name: "Quat To Euler".to_string(),
        category: NodeCategory::Math,
        op: OpKind::QuatToEuler,
        description: "Per-axis twist angles of a quaternion".to_string(),
        inputs: vec![Port::input("Rotation", PortType::Quaternion)],
        outputs: vec![
            Port::output("Rotate X", PortType::EulerAngle),
            Port::output("Rotate Y", PortType::EulerAngle),
            Port::output("Rotate Z", PortType::EulerAngle),
        ],
    });

    // ========================================================================
    // Scalar arithmetic
    // ========================================================================

    registry.register(NodeType {
        kind: "divide".to_string(),
        name: "Divide".to_string(),
        category: NodeCategory::Math,
        op: OpKind::Divide,
        description: "Scalar division, Value / Divisor".to_string(),
        inputs: vec![
            Port::input("Value", PortType::Scalar),
            Port::input("Divisor", PortType::Scalar).with_constant(PortValue::Scalar(1.0)),
        ],
        outputs: vec![Port::output("Result", PortType::Scalar)],
    });

    registry.register(NodeType {
        kind: "multiply".to_string(),
        name: "Multiply".to_string(),
        category: NodeCategory::Math,
        op: OpKind::Multiply,
        description: "Scalar product, A * B".to_string(),
        inputs: vec![
            Port::input("A", PortType::Scalar),
            Port::input("B", PortType::Scalar).with_constant(PortValue::Scalar(1.0)),
        ],
        outputs: vec![Port::output("Result", PortType::Scalar)],
    });

    // ========================================================================
    // Falloff curves
    // ========================================================================

    registry.register(NodeType {
        kind: "falloff_ramp".to_string(),
        name: "Falloff Ramp".to_string(),
        category: NodeCategory::Curve,
        op: OpKind::FalloffRamp,
        description: "A shared falloff profile; feed its output to samplers".to_string(),
        inputs: vec![Port::input("Curve", PortType::Curve)],
        outputs: vec![Port::output("Curve", PortType::Curve)],
    });

    registry.register(NodeType {
        kind: "sample_curve".to_string(),
        name: "Sample Curve".to_string(),
        category: NodeCategory::Curve,
        op: OpKind::SampleCurve,
        description: "Sample a falloff curve at a fixed position".to_string(),
        inputs: vec![
            Port::input("Curve", PortType::Curve),
            Port::input("Position", PortType::Scalar),
        ],
        outputs: vec![Port::output("Value", PortType::Scalar)],
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_standard_kinds() {
        let registry = create_transform_registry();
        for kind in [
            "world_matrix",
            "mult_matrix",
            "inverse_matrix",
            "decompose_matrix",
            "quat_to_euler",
            "divide",
            "multiply",
            "falloff_ramp",
            "sample_curve",
        ] {
            assert!(registry.get(kind).is_some(), "missing kind {kind}");
        }
    }

    #[test]
    fn test_instances_get_fresh_port_ids() {
        let registry = create_transform_registry();
        let a = registry.create("multiply").unwrap();
        let b = registry.create("multiply").unwrap();
        assert_ne!(a.inputs[0].id, b.inputs[0].id);
        assert_ne!(a.outputs[0].id, b.outputs[0].id);
    }

    #[test]
    fn test_curve_kinds_in_category() {
        let registry = create_transform_registry();
        let curve_kinds: Vec<_> = registry
            .types_in_category(NodeCategory::Curve)
            .map(|t| t.kind.as_str())
            .collect();
        assert_eq!(curve_kinds, vec!["falloff_ramp", "sample_curve"]);
    }
}
