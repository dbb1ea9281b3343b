use serde::{Deserialize, Serialize};

/// Persisted display override for one public model id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ScaleOverride {
    pub fn scale(scale: f64) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scale.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// Named scale presets offered to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalePreset {
    pub key: &'static str,
    pub scale: f64,
    pub name: &'static str,
}

pub const SCALE_PRESETS: [ScalePreset; 5] = [
    ScalePreset { key: "tiny", scale: 0.3, name: "Tiny" },
    ScalePreset { key: "small", scale: 0.5, name: "Small" },
    ScalePreset { key: "normal", scale: 1.0, name: "Normal" },
    ScalePreset { key: "large", scale: 1.5, name: "Large" },
    ScalePreset { key: "huge", scale: 2.0, name: "Huge" },
];
