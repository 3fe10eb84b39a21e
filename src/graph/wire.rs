//! Flat wire format.
//!
//! A graph crosses process or language boundaries as two arrays: one
//! integer tag per node and a single float array holding every node's
//! parameters back to back. The arity of each tag is fixed:
//!
//! | Tag | Node | Arity | Parameters |
//! |-----|------|-------|------------|
//! | 0 | Clear | 4 | r, g, b, a |
//! | 1 | DrawRect | 8 | x, y, width, height, r, g, b, a |
//! | 2 | Blur | 2 | radius, samples |
//! | 3 | Shadow | 8 | offset x, offset y, r, g, b, a, blur radius, opacity |
//! | 4 | Composite | 1 | blend mode id |
//! | 5 | ColorAdjust | 3 | brightness, contrast, saturation |
//! | 6 | GradientRect | 13 | x, y, width, height, start rgba, end rgba, angle |
//! | 7 | RoundedRect | 9 | x, y, width, height, r, g, b, a, corner radius |
//!
//! Decoding is all or nothing: any unknown tag, short parameter slice,
//! leftover parameter or unrepresentable value fails the whole graph.
//!
//! Integers (coordinates, sizes, counts, ids) travel as `f32` and are exact
//! up to 2^24 in magnitude. The encoder rounds larger values to the nearest
//! representable float; the decoder rejects anything outside `i32`.

use glam::{Vec2, Vec4};
use thiserror::Error;

use crate::passes::{BlurParams, ColorAdjustParams, CompositeMode, Gradient, ShadowParams};
use crate::types::Region;

use super::RenderNode;

pub const TAG_CLEAR: i32 = 0;
pub const TAG_DRAW_RECT: i32 = 1;
pub const TAG_BLUR: i32 = 2;
pub const TAG_SHADOW: i32 = 3;
pub const TAG_COMPOSITE: i32 = 4;
pub const TAG_COLOR_ADJUST: i32 = 5;
pub const TAG_GRADIENT_RECT: i32 = 6;
pub const TAG_ROUNDED_RECT: i32 = 7;

/// Parameter count of a node tag, or `None` for an unknown tag.
pub fn arity(tag: i32) -> Option<usize> {
    match tag {
        TAG_CLEAR => Some(4),
        TAG_DRAW_RECT => Some(8),
        TAG_BLUR => Some(2),
        TAG_SHADOW => Some(8),
        TAG_COMPOSITE => Some(1),
        TAG_COLOR_ADJUST => Some(3),
        TAG_GRADIENT_RECT => Some(13),
        TAG_ROUNDED_RECT => Some(9),
        _ => None,
    }
}

/// Structural corruption of a wire graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("node {node}: unknown tag {tag}")]
    UnknownTag { node: usize, tag: i32 },
    #[error("node {node} (tag {tag}) needs {needed} parameters, only {available} left")]
    Truncated {
        node: usize,
        tag: i32,
        needed: usize,
        available: usize,
    },
    #[error("{len} parameters given but the nodes consume {consumed}")]
    TrailingParams { consumed: usize, len: usize },
    #[error("node {node}: blend mode {id} is not one of 0..=3")]
    InvalidBlendMode { node: usize, id: i32 },
    #[error("node {node}: invalid {name} {value}")]
    InvalidParam {
        node: usize,
        name: &'static str,
        value: f32,
    },
}

/// A graph in wire form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireGraph {
    pub tags: Vec<i32>,
    pub params: Vec<f32>,
}

impl WireGraph {
    pub fn new(tags: Vec<i32>, params: Vec<f32>) -> Self {
        Self { tags, params }
    }

    /// Flatten typed nodes. Region fields beyond 2^24 lose precision.
    pub fn encode(nodes: &[RenderNode]) -> Self {
        let mut wire = Self::default();
        for node in nodes {
            wire.tags.push(node.tag());
            encode_params(node, &mut wire.params);
        }
        wire
    }

    /// Walk the tags with a cursor into `params` and rebuild typed nodes.
    pub fn decode(&self) -> Result<Vec<RenderNode>, DecodeError> {
        let mut nodes = Vec::with_capacity(self.tags.len());
        let mut cursor = 0;

        for (node, &tag) in self.tags.iter().enumerate() {
            let needed = arity(tag).ok_or(DecodeError::UnknownTag { node, tag })?;
            let available = self.params.len() - cursor;
            if needed > available {
                return Err(DecodeError::Truncated {
                    node,
                    tag,
                    needed,
                    available,
                });
            }

            let slice = &self.params[cursor..cursor + needed];
            nodes.push(decode_node(node, tag, slice)?);
            cursor += needed;
        }

        if cursor != self.params.len() {
            return Err(DecodeError::TrailingParams {
                consumed: cursor,
                len: self.params.len(),
            });
        }
        Ok(nodes)
    }
}

fn encode_params(node: &RenderNode, out: &mut Vec<f32>) {
    match node {
        RenderNode::Clear { color } => out.extend(color.to_array()),
        RenderNode::DrawRect { region, color } => {
            encode_region(region, out);
            out.extend(color.to_array());
        }
        RenderNode::Blur(params) => out.extend([params.radius, params.samples as f32]),
        RenderNode::Shadow(params) => {
            out.extend(params.offset.to_array());
            out.extend(params.color.to_array());
            out.extend([params.blur_radius, params.opacity]);
        }
        RenderNode::Composite(mode) => out.push(mode.id() as f32),
        RenderNode::ColorAdjust(params) => {
            out.extend([params.brightness, params.contrast, params.saturation])
        }
        RenderNode::GradientRect { region, gradient } => {
            encode_region(region, out);
            out.extend(gradient.start.to_array());
            out.extend(gradient.end.to_array());
            out.push(gradient.angle);
        }
        RenderNode::RoundedRect {
            region,
            color,
            radius,
        } => {
            encode_region(region, out);
            out.extend(color.to_array());
            out.push(*radius);
        }
    }
}

fn encode_region(region: &Region, out: &mut Vec<f32>) {
    out.extend([
        region.x as f32,
        region.y as f32,
        region.width as f32,
        region.height as f32,
    ]);
}

/// Field reader over one node's parameter slice.
struct Params<'a> {
    node: usize,
    values: &'a [f32],
}

impl Params<'_> {
    fn float(&self, index: usize, name: &'static str) -> Result<f32, DecodeError> {
        let value = self.values[index];
        if !value.is_finite() {
            return Err(self.invalid(name, value));
        }
        Ok(value)
    }

    fn int(&self, index: usize, name: &'static str) -> Result<i32, DecodeError> {
        let value = self.float(index, name)?;
        // i32::MAX as f32 rounds up to 2^31, so compare in f64.
        let wide = f64::from(value);
        if value.fract() != 0.0 || wide < f64::from(i32::MIN) || wide > f64::from(i32::MAX) {
            return Err(self.invalid(name, value));
        }
        Ok(value as i32)
    }

    fn count(&self, index: usize, name: &'static str) -> Result<u32, DecodeError> {
        let value = self.int(index, name)?;
        u32::try_from(value).map_err(|_| self.invalid(name, value as f32))
    }

    fn region(&self, index: usize) -> Result<Region, DecodeError> {
        Ok(Region::new(
            self.int(index, "x")?,
            self.int(index + 1, "y")?,
            self.count(index + 2, "width")?,
            self.count(index + 3, "height")?,
        ))
    }

    fn vec4(&self, index: usize, name: &'static str) -> Result<Vec4, DecodeError> {
        Ok(Vec4::new(
            self.float(index, name)?,
            self.float(index + 1, name)?,
            self.float(index + 2, name)?,
            self.float(index + 3, name)?,
        ))
    }

    fn invalid(&self, name: &'static str, value: f32) -> DecodeError {
        DecodeError::InvalidParam {
            node: self.node,
            name,
            value,
        }
    }
}

fn decode_node(node: usize, tag: i32, values: &[f32]) -> Result<RenderNode, DecodeError> {
    let p = Params { node, values };
    let decoded = match tag {
        TAG_CLEAR => RenderNode::Clear {
            color: p.vec4(0, "color")?,
        },
        TAG_DRAW_RECT => RenderNode::DrawRect {
            region: p.region(0)?,
            color: p.vec4(4, "color")?,
        },
        TAG_BLUR => RenderNode::Blur(BlurParams {
            radius: p.float(0, "blur radius")?,
            samples: p.count(1, "samples")?,
        }),
        TAG_SHADOW => RenderNode::Shadow(ShadowParams {
            offset: Vec2::new(p.float(0, "offset")?, p.float(1, "offset")?),
            color: p.vec4(2, "color")?,
            blur_radius: p.float(6, "blur radius")?,
            opacity: p.float(7, "opacity")?,
        }),
        TAG_COMPOSITE => {
            let id = p.int(0, "blend mode")?;
            RenderNode::Composite(
                CompositeMode::from_id(id)
                    .map_err(|_| DecodeError::InvalidBlendMode { node, id })?,
            )
        }
        TAG_COLOR_ADJUST => RenderNode::ColorAdjust(ColorAdjustParams {
            brightness: p.float(0, "brightness")?,
            contrast: p.float(1, "contrast")?,
            saturation: p.float(2, "saturation")?,
        }),
        TAG_GRADIENT_RECT => RenderNode::GradientRect {
            region: p.region(0)?,
            gradient: Gradient {
                start: p.vec4(4, "start color")?,
                end: p.vec4(8, "end color")?,
                angle: p.float(12, "angle")?,
            },
        },
        TAG_ROUNDED_RECT => RenderNode::RoundedRect {
            region: p.region(0)?,
            color: p.vec4(4, "color")?,
            radius: p.float(8, "corner radius")?,
        },
        _ => return Err(DecodeError::UnknownTag { node, tag }),
    };
    Ok(decoded)
}
