//! Common utilities for integration tests.
//!
//! Every test names the backend it wants; GPU backends that cannot be
//! brought up on the machine running the tests are skipped, the dummy
//! backend is always there.

#![allow(dead_code)]

use gfx_compositor::{
    BackendKind, BackendProbe, DeviceContext, DummyProbe, Negotiator, PowerPreference, WgpuProbe,
};

/// Frame size used by the integration tests.
pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 64;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Backends the tests run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Recording backend, no GPU involved.
    Dummy,
    Vulkan,
    OpenGL,
    OpenGLES,
}

impl Backend {
    pub fn kind(self) -> BackendKind {
        match self {
            Backend::Dummy => BackendKind::Vulkan,
            Backend::Vulkan => BackendKind::Vulkan,
            Backend::OpenGL => BackendKind::OpenGL,
            Backend::OpenGLES => BackendKind::OpenGLES,
        }
    }

    fn probe(self) -> Box<dyn BackendProbe> {
        match self {
            Backend::Dummy => Box::new(DummyProbe::available(self.kind())),
            _ => Box::new(WgpuProbe::new(
                self.kind(),
                PowerPreference::LowPower,
                "gfx-compositor test device",
            )),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A device context for one backend, or nothing if it is unavailable.
pub struct TestContext {
    pub backend: Backend,
    pub device: DeviceContext,
}

impl TestContext {
    pub fn new(backend: Backend) -> Option<Self> {
        init_logging();
        let negotiator = Negotiator::new(vec![backend.probe()]);
        match negotiator.acquire(WIDTH, HEIGHT) {
            Ok(device) => Some(Self { backend, device }),
            Err(e) => {
                eprintln!("Backend {backend:?} not available: {e}");
                None
            }
        }
    }

    /// Whether pixels read back reflect real rendering.
    pub fn renders(&self) -> bool {
        self.backend != Backend::Dummy
    }
}

// ============================================================================
// Pixel Verification
// ============================================================================

/// Expected pixel color for verification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedPixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ExpectedPixel {
    pub const RED: Self = Self::new(255, 0, 0, 255);
    pub const GREEN: Self = Self::new(0, 255, 0, 255);
    pub const BLUE: Self = Self::new(0, 0, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn matches(&self, other: &Self, tolerance: u8) -> bool {
        self.r.abs_diff(other.r) <= tolerance
            && self.g.abs_diff(other.g) <= tolerance
            && self.b.abs_diff(other.b) <= tolerance
            && self.a.abs_diff(other.a) <= tolerance
    }
}

/// Pixel at (x, y) of tightly packed RGBA8 data.
pub fn get_pixel(data: &[u8], width: u32, x: u32, y: u32) -> Option<ExpectedPixel> {
    let offset = ((y * width + x) * 4) as usize;
    let texel = data.get(offset..offset + 4)?;
    Some(ExpectedPixel::new(texel[0], texel[1], texel[2], texel[3]))
}

pub fn verify_pixel(
    data: &[u8],
    width: u32,
    x: u32,
    y: u32,
    expected: ExpectedPixel,
    tolerance: u8,
) -> bool {
    match get_pixel(data, width, x, y) {
        Some(actual) => actual.matches(&expected, tolerance),
        None => false,
    }
}
