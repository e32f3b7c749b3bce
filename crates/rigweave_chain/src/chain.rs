// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chain model: the host's ordered body selection.

use crate::rig::RigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Name of a rigid body in the host scene
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub String);

impl BodyId {
    /// Create a body ID from a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The body's name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BodyId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for BodyId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// An ordered kinematic chain: a tip, a base, and the links between them.
///
/// Links are ordered base-to-tip; they are the joints that will absorb a
/// share of the tip's twist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    tip: BodyId,
    base: BodyId,
    links: Vec<BodyId>,
}

impl Chain {
    /// Build a chain from a host selection ordered `[tip, base, links...]`.
    ///
    /// Mirrors the selection order a rigger uses: end joint first, then the
    /// parent it rotates against, then each joint to weight.
    pub fn from_selection(mut selection: Vec<BodyId>) -> Result<Self, RigError> {
        if selection.len() < 2 {
            return Err(RigError::ChainTooShort);
        }
        let links = selection.split_off(2);
        let base = selection.pop().ok_or(RigError::ChainTooShort)?;
        let tip = selection.pop().ok_or(RigError::ChainTooShort)?;
        Self::new(tip, base, links)
    }

    /// Build a chain from its parts, validating distinctness
    pub fn new(tip: BodyId, base: BodyId, links: Vec<BodyId>) -> Result<Self, RigError> {
        let mut seen = HashSet::new();
        seen.insert(&tip);
        if !seen.insert(&base) {
            return Err(RigError::DegenerateChain);
        }
        for link in &links {
            if !seen.insert(link) {
                return Err(RigError::DegenerateChain);
            }
        }
        Ok(Self { tip, base, links })
    }

    /// The end body whose rotation is extracted
    pub fn tip(&self) -> &BodyId {
        &self.tip
    }

    /// The body whose frame the rotation is measured in
    pub fn base(&self) -> &BodyId {
        &self.base
    }

    /// The links that absorb the distributed rotation, base-to-tip
    pub fn links(&self) -> &[BodyId] {
        &self.links
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// All chain members: tip, base, then links
    pub fn members(&self) -> impl Iterator<Item = &BodyId> {
        [&self.tip, &self.base].into_iter().chain(self.links.iter())
    }
}
