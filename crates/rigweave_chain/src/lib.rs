// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live rotation distribution across kinematic chains.
//!
//! This crate turns the relative twist between two rigid bodies (say a
//! wrist and an elbow) into per-link rotation values spread along the
//! joints between them, so each link absorbs part of the twist instead of
//! the whole rotation landing on one joint.
//!
//! ## Architecture
//!
//! Built on [`rigweave_graph`]:
//! - [`Chain`] validates the host's ordered body selection
//! - [`RotationExtractor`] wires the subgraph that derives the tip's
//!   rotation in the base's frame as a live angle
//! - [`WeightDistributor`] fans that angle out across the links, uniformly
//!   or shaped by a shared [`FalloffControl`] curve
//! - [`TwistRig`] orchestrates construction from a [`RigConfig`] and a
//!   host [`SceneSource`], and owns the live graph afterwards

pub mod chain;
pub mod scene;
pub mod extractor;
pub mod distributor;
pub mod falloff;
pub mod rig;

pub use chain::{BodyId, Chain};
pub use scene::{BodyKind, MemoryScene, SceneSource};
pub use extractor::{Axis, LiveScalar, MatrixInput, RotationExtractor};
pub use distributor::{RotationBinding, WeightDistributor};
pub use falloff::FalloffControl;
pub use rig::{RigConfig, RigError, TwistRig};
