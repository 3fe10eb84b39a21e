//! Backend negotiation.
//!
//! A [`Negotiator`] holds a priority-ordered list of [`BackendProbe`]s and
//! hands out a [`DeviceContext`] built on the first probe that initializes.
//! Later probes are never touched once one succeeds. When every probe fails
//! the result is [`NegotiationError::Unavailable`], which carries each
//! attempt so a caller can fall back to a CPU path and say why.

use crate::backend::{Backend, BackendError};
#[cfg(feature = "wgpu-backend")]
use crate::backend::WgpuProbe;
use crate::config::ContextConfig;
use crate::error::NegotiationError;
use crate::types::BackendKind;
use crate::DeviceContext;

/// Something that can try to bring up one kind of backend.
pub trait BackendProbe: Send + Sync {
    /// The backend this probe initializes.
    fn kind(&self) -> BackendKind;

    /// Run the platform initialization for a `width` x `height` frame.
    fn try_init(&self, width: u32, height: u32) -> Result<Box<dyn Backend>, BackendError>;
}

/// Priority-ordered backend selection.
pub struct Negotiator {
    probes: Vec<Box<dyn BackendProbe>>,
}

impl std::fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator")
            .field("priority", &self.priority())
            .finish()
    }
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

impl Negotiator {
    /// Try `probes` in the given order.
    pub fn new(probes: Vec<Box<dyn BackendProbe>>) -> Self {
        Self { probes }
    }

    /// One wgpu probe per entry of the configured priority.
    #[cfg(feature = "wgpu-backend")]
    pub fn from_config(config: &ContextConfig) -> Self {
        let probes = config
            .backend_priority
            .iter()
            .filter(|kind| kind.is_available())
            .map(|&kind| {
                Box::new(WgpuProbe::new(kind, config.power_preference, &config.label))
                    as Box<dyn BackendProbe>
            })
            .collect();
        Self::new(probes)
    }

    /// Built without a native backend: nothing to try.
    #[cfg(not(feature = "wgpu-backend"))]
    pub fn from_config(config: &ContextConfig) -> Self {
        log::warn!(
            "built without the wgpu-backend feature, ignoring priority {:?}",
            config.backend_priority
        );
        Self::new(Vec::new())
    }

    /// Backend kinds in the order they will be tried.
    pub fn priority(&self) -> Vec<BackendKind> {
        self.probes.iter().map(|probe| probe.kind()).collect()
    }

    /// Bring up the first backend that initializes and wrap it in a context.
    pub fn acquire(&self, width: u32, height: u32) -> Result<DeviceContext, NegotiationError> {
        if width == 0 || height == 0 {
            return Err(NegotiationError::InvalidSize { width, height });
        }

        let mut attempts = Vec::new();
        for probe in &self.probes {
            let kind = probe.kind();
            log::debug!("trying {kind} backend");
            match probe.try_init(width, height) {
                Ok(backend) => {
                    let context = DeviceContext::new(backend);
                    log::info!(
                        "negotiated {kind} backend: {} ({})",
                        context.capabilities().name,
                        context.capabilities().vendor
                    );
                    return Ok(context);
                }
                Err(e) => {
                    log::warn!("{kind} backend unavailable: {e}");
                    attempts.push((kind, e));
                }
            }
        }

        log::warn!("no rendering backend could be initialized");
        Err(NegotiationError::Unavailable { attempts })
    }
}

/// Negotiate with the default priority.
pub fn acquire(width: u32, height: u32) -> Result<DeviceContext, NegotiationError> {
    Negotiator::default().acquire(width, height)
}
