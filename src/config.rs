//! Context creation settings.

use crate::types::BackendKind;

/// Which adapter to prefer when several can drive the requested backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerPreference {
    /// Integrated or software adapters first.
    LowPower,
    /// Discrete adapters first.
    #[default]
    HighPerformance,
}

/// Settings for negotiating a device context.
///
/// ```ignore
/// let config = ContextConfig::default()
///     .with_size(800, 600)
///     .with_backend_priority(vec![BackendKind::OpenGLES]);
/// let context = Negotiator::from_config(&config).acquire(config.width, config.height)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    pub width: u32,
    pub height: u32,
    /// Backends to try, first match wins.
    pub backend_priority: Vec<BackendKind>,
    pub power_preference: PowerPreference,
    /// Debug label for the native device.
    pub label: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            backend_priority: BackendKind::PRIORITY.to_vec(),
            power_preference: PowerPreference::HighPerformance,
            label: "gfx-compositor device".to_string(),
        }
    }
}

impl ContextConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_backend_priority(mut self, priority: Vec<BackendKind>) -> Self {
        self.backend_priority = priority;
        self
    }

    pub fn with_power_preference(mut self, preference: PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priority() {
        let config = ContextConfig::default();
        assert_eq!(
            config.backend_priority,
            vec![BackendKind::Vulkan, BackendKind::OpenGL, BackendKind::OpenGLES]
        );
    }

    #[test]
    fn test_builder() {
        let config = ContextConfig::default()
            .with_size(64, 32)
            .with_backend_priority(vec![BackendKind::OpenGLES])
            .with_power_preference(PowerPreference::LowPower)
            .with_label("test");
        assert_eq!((config.width, config.height), (64, 32));
        assert_eq!(config.power_preference, PowerPreference::LowPower);
        assert_eq!(config.backend_priority, vec![BackendKind::OpenGLES]);
        assert_eq!(config.label, "test");
    }
}
