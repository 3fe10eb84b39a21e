//! Built-in GLSL sources used by the pass library.
//!
//! | Source | Stage | Purpose |
//! |--------|-------|---------|
//! | `quad.vert` | vertex | pixel-space quads, shared by every pass |
//! | `flat.frag` | fragment | solid vertex color |
//! | `texture.frag` | fragment | sample slot 0 unchanged |
//! | `blur.frag` | fragment | one axis of a separable gaussian |
//! | `tint.frag` | fragment | alpha mask times a premultiplied color |
//! | `color_adjust.frag` | fragment | brightness, contrast, saturation |
//! | `gradient.frag` | fragment | two-color linear gradient at an angle |
//! | `rounded_rect.frag` | fragment | vertex color masked to rounded corners |

pub const QUAD_VERTEX: &str = include_str!("../../shaders/quad.vert");

pub const FLAT_FRAGMENT: &str = include_str!("../../shaders/flat.frag");

pub const TEXTURE_FRAGMENT: &str = include_str!("../../shaders/texture.frag");

pub const BLUR_FRAGMENT: &str = include_str!("../../shaders/blur.frag");

pub const TINT_FRAGMENT: &str = include_str!("../../shaders/tint.frag");

pub const COLOR_ADJUST_FRAGMENT: &str = include_str!("../../shaders/color_adjust.frag");

pub const GRADIENT_FRAGMENT: &str = include_str!("../../shaders/gradient.frag");

pub const ROUNDED_RECT_FRAGMENT: &str = include_str!("../../shaders/rounded_rect.frag");

/// Uniform naming the viewport rectangle in `quad.vert`.
pub const VIEWPORT_UNIFORM: &str = "u_viewport";
