//! Render graph engine.
//!
//! A [`RenderGraph`] is an ordered list of typed [`RenderNode`]s. At the
//! serialization boundary it converts to and from the flat [`WireGraph`]
//! form; internally every node carries its own typed parameters, so once a
//! wire graph has decoded there is no cursor left to misalign.
//!
//! # Example
//!
//! ```ignore
//! let wire = WireGraph::new(vec![0, 1, 2], params);
//! let graph = RenderGraph::from_wire(&wire)?;
//! let report = graph.execute(&mut context)?;
//! ```

mod effects;
mod executor;
mod wire;

use glam::Vec4;

use crate::passes::{BlurParams, ColorAdjustParams, CompositeMode, Gradient, ShadowParams};
use crate::types::Region;

pub use effects::{Effect, EffectStack};
pub use executor::{ExecutionReport, GraphError};
pub use wire::{arity, DecodeError, WireGraph};

/// One operation of a render graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderNode {
    /// Fill the current target.
    Clear { color: Vec4 },
    /// Solid rectangle through the current blend state.
    DrawRect { region: Region, color: Vec4 },
    Blur(BlurParams),
    Shadow(ShadowParams),
    /// Blend pair for following draws.
    Composite(CompositeMode),
    ColorAdjust(ColorAdjustParams),
    /// Gradient-filled rectangle through the current blend state.
    GradientRect { region: Region, gradient: Gradient },
    /// Rectangle with corners rounded to `radius` pixels.
    RoundedRect {
        region: Region,
        color: Vec4,
        radius: f32,
    },
}

impl RenderNode {
    /// Wire tag of this node.
    pub fn tag(&self) -> i32 {
        match self {
            Self::Clear { .. } => wire::TAG_CLEAR,
            Self::DrawRect { .. } => wire::TAG_DRAW_RECT,
            Self::Blur(_) => wire::TAG_BLUR,
            Self::Shadow(_) => wire::TAG_SHADOW,
            Self::Composite(_) => wire::TAG_COMPOSITE,
            Self::ColorAdjust(_) => wire::TAG_COLOR_ADJUST,
            Self::GradientRect { .. } => wire::TAG_GRADIENT_RECT,
            Self::RoundedRect { .. } => wire::TAG_ROUNDED_RECT,
        }
    }

    /// The rectangle a shape node fills, `None` for every other node.
    pub fn shape(&self) -> Option<Region> {
        match self {
            Self::DrawRect { region, .. }
            | Self::GradientRect { region, .. }
            | Self::RoundedRect { region, .. } => Some(*region),
            _ => None,
        }
    }

    /// Whether the node works on a region of pixels already drawn.
    pub fn is_effect(&self) -> bool {
        matches!(self, Self::Blur(_) | Self::Shadow(_) | Self::ColorAdjust(_))
    }
}

/// Ordered compositing operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderGraph {
    nodes: Vec<RenderNode>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<RenderNode>) -> Self {
        Self { nodes }
    }

    /// Decode a wire graph. Nothing is returned unless every node decodes.
    pub fn from_wire(wire: &WireGraph) -> Result<Self, DecodeError> {
        wire.decode().map(Self::from_nodes)
    }

    pub fn to_wire(&self) -> WireGraph {
        WireGraph::encode(&self.nodes)
    }

    pub fn push(&mut self, node: RenderNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
