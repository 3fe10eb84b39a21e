//! Effect stacks: a higher-level way to describe one styled rectangle.

use glam::{Vec2, Vec4};

use crate::passes::{BlurParams, ColorAdjustParams, CompositeMode, Gradient, ShadowParams};
use crate::types::Region;

use super::{RenderGraph, RenderNode};

/// Default glow spread in pixels.
const GLOW_RADIUS: f32 = 8.0;

/// A visual effect applied to a UI element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Blur(BlurParams),
    Shadow(ShadowParams),
    /// Blurred light added with screen blending. `intensity` brightens the
    /// blurred pixels before they are blended.
    Glow { radius: f32, intensity: f32 },
    ColorAdjust(ColorAdjustParams),
    /// Fills the rectangle with a linear gradient instead of its color.
    Gradient(Gradient),
}

impl Effect {
    pub fn blur(radius: f32) -> Self {
        Self::Blur(BlurParams {
            radius,
            ..Default::default()
        })
    }

    pub fn shadow(offset: Vec2, color: Vec4, blur_radius: f32) -> Self {
        Self::Shadow(ShadowParams {
            offset,
            color,
            blur_radius,
            ..Default::default()
        })
    }

    pub fn glow(intensity: f32) -> Self {
        Self::Glow {
            radius: GLOW_RADIUS,
            intensity,
        }
    }

    pub fn brightness(value: f32) -> Self {
        Self::ColorAdjust(ColorAdjustParams {
            brightness: value,
            ..ColorAdjustParams::IDENTITY
        })
    }

    pub fn contrast(value: f32) -> Self {
        Self::ColorAdjust(ColorAdjustParams {
            contrast: value,
            ..ColorAdjustParams::IDENTITY
        })
    }

    pub fn saturation(value: f32) -> Self {
        Self::ColorAdjust(ColorAdjustParams {
            saturation: value,
            ..ColorAdjustParams::IDENTITY
        })
    }

    /// `angle` in degrees, 0 running left to right.
    pub fn gradient(start: Vec4, end: Vec4, angle: f32) -> Self {
        Self::Gradient(Gradient::new(start, end, angle))
    }

    fn append_nodes(&self, nodes: &mut Vec<RenderNode>) {
        match *self {
            Self::Blur(params) => nodes.push(RenderNode::Blur(params)),
            Self::Shadow(params) => nodes.push(RenderNode::Shadow(params)),
            Self::Glow { radius, intensity } => {
                nodes.push(RenderNode::Blur(BlurParams {
                    radius,
                    ..Default::default()
                }));
                if intensity != 1.0 {
                    nodes.push(RenderNode::ColorAdjust(ColorAdjustParams {
                        brightness: intensity,
                        ..ColorAdjustParams::IDENTITY
                    }));
                }
                nodes.push(RenderNode::Composite(CompositeMode::Screen));
            }
            Self::ColorAdjust(params) => nodes.push(RenderNode::ColorAdjust(params)),
            Self::Gradient(_) => {}
        }
    }
}

/// Effects applied in push order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectStack {
    effects: Vec<Effect>,
}

impl EffectStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn with(mut self, effect: Effect) -> Self {
        self.push(effect);
        self
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl RenderGraph {
    /// Graph drawing `rect` in `color` with `stack` applied.
    ///
    /// The effects come first, in stack order, and all scope to the
    /// rectangle drawn last. A gradient effect replaces the solid fill; the
    /// last one pushed wins.
    pub fn from_effects(rect: Region, color: Vec4, stack: &EffectStack) -> Self {
        let mut nodes = Vec::with_capacity(stack.len() * 2 + 1);
        let mut fill = RenderNode::DrawRect {
            region: rect,
            color,
        };
        for effect in stack.effects() {
            if let Effect::Gradient(gradient) = *effect {
                fill = RenderNode::GradientRect {
                    region: rect,
                    gradient,
                };
            }
            effect.append_nodes(&mut nodes);
        }
        nodes.push(fill);
        Self::from_nodes(nodes)
    }
}
