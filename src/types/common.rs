//! Plain data shared by every layer: backend kinds, pixel regions,
//! blend state and primitive topology.

use std::fmt;

/// Native graphics API behind a device context.
///
/// `None` is the terminal state: a context that failed negotiation or was
/// destroyed reports it, and no resource operation reaches a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// No backend is active.
    #[default]
    None,
    /// Vulkan.
    Vulkan,
    /// Desktop OpenGL.
    OpenGL,
    /// OpenGL ES.
    OpenGLES,
}

impl BackendKind {
    /// Default negotiation order.
    pub const PRIORITY: [BackendKind; 3] = [Self::Vulkan, Self::OpenGL, Self::OpenGLES];

    /// Whether this kind names a real backend.
    pub fn is_available(self) -> bool {
        self != Self::None
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Vulkan => "Vulkan",
            Self::OpenGL => "OpenGL",
            Self::OpenGLES => "OpenGL ES",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis-aligned pixel rectangle with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The viewport is stored as a region of the current render target.
pub type Viewport = Region;

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region at the origin covering `width` x `height` pixels.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Overlap of two regions, or `None` when they do not intersect.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left as i64 || bottom <= top as i64 {
            return None;
        }

        Some(Region::new(
            left,
            top,
            (right - left as i64) as u32,
            (bottom - top as i64) as u32,
        ))
    }

    /// Grow the region by `padding` pixels on every side.
    pub fn expand(&self, padding: u32) -> Region {
        Region::new(
            self.x.saturating_sub(padding as i32),
            self.y.saturating_sub(padding as i32),
            self.width.saturating_add(padding.saturating_mul(2)),
            self.height.saturating_add(padding.saturating_mul(2)),
        )
    }

    /// Move the region by a pixel offset.
    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }
}

/// Blend factor applied to the source or destination color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// A (source-factor, destination-factor) pair used for color and alpha.
///
/// A device context with no pair set writes fragments unblended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFactors {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFactors {
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }

    /// Source-over for colors already multiplied by their alpha.
    pub const PREMULTIPLIED_OVER: Self =
        Self::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}
