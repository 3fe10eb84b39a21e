//! Device capability snapshot.

use crate::backend::CapabilityQuery;
use crate::types::BackendKind;

/// Immutable description of the negotiated device.
///
/// Captured once when the context is created. Fields the backend could not
/// report are empty strings or zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub backend: BackendKind,
    /// Renderer / adapter name.
    pub name: String,
    pub vendor: String,
    pub driver_version: String,
    /// Largest supported 2D texture dimension in pixels.
    pub max_texture_size: u32,
    pub supports_compute: bool,
}

impl DeviceCapabilities {
    pub(crate) fn from_query(backend: BackendKind, query: CapabilityQuery) -> Self {
        Self {
            backend,
            name: query.name.unwrap_or_default(),
            vendor: query.vendor.unwrap_or_default(),
            driver_version: query.driver_version.unwrap_or_default(),
            max_texture_size: query.max_texture_size.unwrap_or(0),
            supports_compute: query.supports_compute.unwrap_or(false),
        }
    }
}

/// Human readable name for a PCI vendor id.
pub fn vendor_name(vendor_id: u32) -> Option<&'static str> {
    match vendor_id {
        0x10DE => Some("NVIDIA"),
        0x1002 | 0x1022 => Some("AMD"),
        0x8086 => Some("Intel"),
        0x13B5 => Some("ARM"),
        0x5143 => Some("Qualcomm"),
        0x1010 => Some("Imagination Technologies"),
        0x106B => Some("Apple"),
        0x14E4 => Some("Broadcom"),
        0x10005 => Some("Mesa"),
        _ => None,
    }
}
