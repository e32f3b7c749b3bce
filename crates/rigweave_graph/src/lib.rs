// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed node-graph framework for RigWeave.
//!
//! This crate provides the computation substrate the rig layer builds on:
//! - Typed input/output ports carrying matrices, quaternions, angles,
//!   scalars, and falloff curves
//! - Connection validation (type checks, single-writer inputs, cycle
//!   rejection) performed entirely at construction time
//! - Pull-based evaluation with memoization and dirty propagation, so a
//!   graph stays live across host edits without a scheduler of its own
//!
//! ## Architecture
//!
//! A [`Graph`] owns [`Node`]s and [`Connection`]s; nodes are stamped out of
//! a [`NodeRegistry`] by kind name. An [`Evaluator`] resolves outputs on
//! demand: reading an output walks its upstream dependencies, computes what
//! is stale, and caches everything else. Writing a constant invalidates the
//! downstream closure, nothing more.

pub mod node;
pub mod port;
pub mod connection;
pub mod graph;
pub mod evaluation;
pub mod curve;
pub mod ops;

pub use node::{Node, NodeCategory, NodeId, NodeRegistry, NodeType, OpKind};
pub use port::{Port, PortDirection, PortId, PortType, PortValue};
pub use connection::{Connection, ConnectionId};
pub use graph::{Graph, GraphError};
pub use evaluation::{EvaluationError, Evaluator, NodeOutput};
pub use curve::{ControlPoint, CurveError, CurveInterpolation, FalloffCurve};
pub use ops::create_transform_registry;
