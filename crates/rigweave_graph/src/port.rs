// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::curve::FalloffCurve;
use glam::{Mat4, Quat};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Data type that can flow through ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortType {
    /// 4x4 homogeneous transform matrix
    Matrix,
    /// Unit quaternion orientation
    Quaternion,
    /// Rotation angle about a single axis, in radians
    EulerAngle,
    /// Plain scalar value
    Scalar,
    /// Two-point falloff curve
    Curve,
}

impl PortType {
    /// Check if a value of this type can feed a port of `other`'s type.
    ///
    /// Matching is strict except for the angle/scalar pair: an extracted
    /// angle is a scalar quantity and flows into arithmetic nodes (and a
    /// scalar result flows into a rotation attribute) without an explicit
    /// conversion node.
    pub fn can_connect_to(self, other: PortType) -> bool {
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Self::EulerAngle, Self::Scalar) | (Self::Scalar, Self::EulerAngle)
        )
    }
}

/// A port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Data type
    pub port_type: PortType,
    /// Literal value bound to an otherwise-unconnected input port
    pub constant: Option<PortValue>,
}

impl Port {
    /// Create a new input port
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Input,
            port_type,
            constant: None,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Output,
            port_type,
            constant: None,
        }
    }

    /// Set the constant value
    pub fn with_constant(mut self, value: PortValue) -> Self {
        self.constant = Some(value);
        self
    }
}

/// Value that can flow through a port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// 4x4 transform matrix
    Matrix(Mat4),
    /// Unit quaternion
    Quaternion(Quat),
    /// Angle in radians
    EulerAngle(f32),
    /// Scalar
    Scalar(f32),
    /// Falloff curve
    Curve(FalloffCurve),
}

impl PortValue {
    /// Get the port type for this value
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Matrix(_) => PortType::Matrix,
            Self::Quaternion(_) => PortType::Quaternion,
            Self::EulerAngle(_) => PortType::EulerAngle,
            Self::Scalar(_) => PortType::Scalar,
            Self::Curve(_) => PortType::Curve,
        }
    }
}
