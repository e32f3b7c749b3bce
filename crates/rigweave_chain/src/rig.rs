// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rig orchestration: configuration, construction, and the live API.
//!
//! [`TwistRig::build`] validates the chain against the host scene, wires
//! the extractor and (optionally) the distribution network into one fresh
//! graph, and hands back the live handles. Construction is all-or-nothing:
//! any failure aborts before the host sees a partial rig.

use crate::chain::{BodyId, Chain};
use crate::distributor::{RotationBinding, WeightDistributor};
use crate::extractor::{Axis, LiveScalar, MatrixInput, RotationExtractor};
use crate::falloff::FalloffControl;
use crate::scene::{BodyKind, SceneSource};
use glam::Mat4;
use rigweave_graph::{
    create_transform_registry, CurveInterpolation, EvaluationError, Evaluator, FalloffCurve,
    Graph, GraphError, PortValue,
};
use serde::{Deserialize, Serialize};

/// Construction options, the policy half of the host's dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigConfig {
    /// The rotation channel to extract and distribute
    pub axis: Axis,
    /// Distribute the rotation across the links; when false only the
    /// extractor is built and its angle is exposed for inspection
    pub apply_rotation: bool,
    /// Shape the per-link weights with a shared falloff curve; only
    /// meaningful while `apply_rotation` is set
    pub enable_falloff: bool,
    /// Require every chain member to resolve to a skeletal joint before
    /// any node is created
    pub verify_bodies: bool,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            apply_rotation: true,
            enable_falloff: true,
            verify_bodies: false,
        }
    }
}

/// A live twist-distribution rig.
///
/// Owns the wired graph and its evaluator. The host pushes transform
/// updates through [`TwistRig::set_world_matrix`] and reads bound values
/// back; nothing recomputes until read.
#[derive(Debug)]
pub struct TwistRig {
    graph: Graph,
    evaluator: Evaluator,
    chain: Chain,
    config: RigConfig,
    extractor: RotationExtractor,
    bindings: Vec<RotationBinding>,
    falloff: Option<FalloffControl>,
    summary: String,
}

impl TwistRig {
    /// Build a rig for `chain` against the host scene.
    ///
    /// Fails without creating anything if verification or wiring rejects
    /// the request.
    pub fn build(
        chain: Chain,
        config: RigConfig,
        scene: &dyn SceneSource,
    ) -> Result<Self, RigError> {
        if config.verify_bodies {
            for body in chain.members() {
                if scene.body_kind(body) != Some(BodyKind::Joint) {
                    return Err(RigError::InvalidChainMember(body.clone()));
                }
            }
        }

        let tip_world = scene
            .world_matrix(chain.tip())
            .ok_or_else(|| RigError::InvalidChainMember(chain.tip().clone()))?;
        let base_world = scene
            .world_matrix(chain.base())
            .ok_or_else(|| RigError::InvalidChainMember(chain.base().clone()))?;

        let registry = create_transform_registry();
        let mut graph = Graph::new(format!("twist:{}:{}", chain.base(), chain.tip()));

        let extractor = RotationExtractor::build(&mut graph, &registry, config.axis)?;
        graph.set_constant(
            extractor.tip.node,
            extractor.tip.port,
            PortValue::Matrix(tip_world),
        )?;
        graph.set_constant(
            extractor.base.node,
            extractor.base.port,
            PortValue::Matrix(base_world),
        )?;

        let (bindings, falloff) = if config.apply_rotation {
            let distributor = WeightDistributor::build(
                &mut graph,
                &registry,
                extractor.angle,
                &chain,
                config.axis,
                config.enable_falloff,
            )?;
            (distributor.bindings, distributor.falloff)
        } else {
            if config.enable_falloff {
                tracing::warn!("falloff weighting skipped: rotation is not applied");
            }
            (Vec::new(), None)
        };

        let summary = summarize(&chain, &config, &bindings);
        tracing::info!("{summary}");

        Ok(Self {
            graph,
            evaluator: Evaluator::new(),
            chain,
            config,
            extractor,
            bindings,
            falloff,
            summary,
        })
    }

    /// Push a body's new world transform into the rig.
    ///
    /// Only the tip and base feed the graph; anything else is rejected.
    /// Writing an unchanged matrix is a no-op, so downstream caches
    /// survive redundant host syncs.
    pub fn set_world_matrix(&mut self, body: &BodyId, world: Mat4) -> Result<(), RigError> {
        let input = self.matrix_input(body)?;
        if self.graph.constant(input.node, input.port) == Some(&PortValue::Matrix(world)) {
            return Ok(());
        }
        self.graph
            .set_constant(input.node, input.port, PortValue::Matrix(world))?;
        self.evaluator.invalidate(&self.graph, input.node);
        Ok(())
    }

    /// Re-read the tip and base transforms from the host scene
    pub fn refresh_from(&mut self, scene: &dyn SceneSource) -> Result<(), RigError> {
        for body in [self.chain.tip().clone(), self.chain.base().clone()] {
            let world = scene
                .world_matrix(&body)
                .ok_or_else(|| RigError::InvalidChainMember(body.clone()))?;
            self.set_world_matrix(&body, world)?;
        }
        Ok(())
    }

    /// The current extracted twist angle, in radians
    pub fn extracted_angle(&mut self) -> Result<f32, RigError> {
        let angle = self.extractor.angle;
        self.read(angle)
    }

    /// Read any live scalar handle owned by this rig
    pub fn read(&mut self, value: LiveScalar) -> Result<f32, RigError> {
        Ok(self
            .evaluator
            .read_scalar(&self.graph, value.node, value.port)?)
    }

    /// A link's current rotation value, in radians
    pub fn link_rotation(&mut self, body: &BodyId) -> Result<f32, RigError> {
        let binding = self
            .bindings
            .iter()
            .find(|b| b.body == *body)
            .ok_or_else(|| RigError::UnknownBody(body.clone()))?;
        let value = binding.value;
        self.read(value)
    }

    /// Per-link bindings, in chain link order; empty when rotation is not
    /// applied
    pub fn bindings(&self) -> &[RotationBinding] {
        &self.bindings
    }

    /// The live angle handle, for hosts that wire it elsewhere
    pub fn angle(&self) -> LiveScalar {
        self.extractor.angle
    }

    /// The falloff knob, when the rig was built with falloff weighting
    pub fn falloff(&self) -> Option<&FalloffControl> {
        self.falloff.as_ref()
    }

    /// Retune the falloff control point values
    pub fn set_falloff_values(&mut self, start: f32, end: f32) -> Result<(), RigError> {
        let control = *self.falloff.as_ref().ok_or(RigError::FalloffDisabled)?;
        control.set_values(&mut self.graph, &mut self.evaluator, start, end)
    }

    /// Switch the falloff interpolation mode
    pub fn set_falloff_interpolation(
        &mut self,
        interpolation: CurveInterpolation,
    ) -> Result<(), RigError> {
        let control = *self.falloff.as_ref().ok_or(RigError::FalloffDisabled)?;
        control.set_interpolation(&mut self.graph, &mut self.evaluator, interpolation)
    }

    /// The current falloff curve, when one exists
    pub fn falloff_curve(&self) -> Option<FalloffCurve> {
        let control = self.falloff.as_ref()?;
        control.curve(&self.graph).ok()
    }

    /// Human-readable description of what was wired
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The rig's chain
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The rig's configuration
    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    /// The wired graph, for inspection or serialization
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn matrix_input(&self, body: &BodyId) -> Result<MatrixInput, RigError> {
        if body == self.chain.tip() {
            Ok(self.extractor.tip)
        } else if body == self.chain.base() {
            Ok(self.extractor.base)
        } else {
            Err(RigError::UnknownBody(body.clone()))
        }
    }
}

/// The console line the host logs: what was extracted, and which links
/// received which treatment
fn summarize(chain: &Chain, config: &RigConfig, bindings: &[RotationBinding]) -> String {
    let mut summary = format!(
        "extracted {} rotation from {} relative to {}",
        config.axis,
        chain.tip(),
        chain.base()
    );
    if bindings.is_empty() {
        summary.push_str("; rotation not applied, read the angle handle directly");
    } else {
        let targets: Vec<&str> = bindings.iter().map(|b| b.body.as_str()).collect();
        let weighting = if config.enable_falloff {
            "falloff-weighted"
        } else {
            "uniform"
        };
        summary.push_str(&format!(
            "; {} {} applied to: {}",
            weighting,
            config.axis.attribute(),
            targets.join(", ")
        ));
    }
    summary
}

/// Error building or driving a rig
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    /// Fewer than two bodies selected
    #[error("chain needs at least a tip and a base")]
    ChainTooShort,

    /// Chain members are not pairwise distinct
    #[error("chain bodies must be distinct")]
    DegenerateChain,

    /// Falloff weighting requested for a chain with no links
    #[error("falloff weighting requires at least one link")]
    InsufficientLinks,

    /// Unrecognized rotation axis
    #[error("unrecognized rotation axis: {0}")]
    InvalidAxis(String),

    /// A chain member does not resolve to a live joint
    #[error("chain member {0} does not resolve to a live joint")]
    InvalidChainMember(BodyId),

    /// The body is not part of this rig's inputs or bindings
    #[error("{0} is not driven by this rig")]
    UnknownBody(BodyId),

    /// Distribution requested without a live extracted angle
    #[error("rotation distribution requires a live extracted angle")]
    NotReady,

    /// Falloff tuning on a rig built without falloff
    #[error("this rig was built without a falloff control")]
    FalloffDisabled,

    /// Graph construction failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Graph evaluation failed
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
