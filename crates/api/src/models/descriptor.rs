use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One entry of a motion group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MotionEntry {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A texture reference. Producers occasionally emit non-string values, which are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextureRef {
    Path(String),
    Other(Value),
}

/// Parsed model definition file (`index.json` / `*.model.json`).
///
/// Only the fields the engine inspects are typed; everything else is preserved
/// in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<Vec<TextureRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physics: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_motions"
    )]
    pub motions: Option<IndexMap<String, Vec<MotionEntry>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expressions: Option<Vec<ExpressionEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// A `null` group is read as an empty one.
fn deserialize_motions<'de, D>(
    deserializer: D,
) -> Result<Option<IndexMap<String, Vec<MotionEntry>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, Option<Vec<MotionEntry>>>> =
        Option::deserialize(deserializer)?;
    Ok(raw.map(|groups| {
        groups
            .into_iter()
            .map(|(name, entries)| (name, entries.unwrap_or_default()))
            .collect()
    }))
}

impl ResourceDescriptor {
    /// Every path-like reference, scalar fields included.
    pub fn references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::new();
        refs.extend(self.model.as_deref());
        refs.extend(self.pose.as_deref());
        refs.extend(self.physics.as_deref());
        if let Some(textures) = &self.textures {
            refs.extend(textures.iter().filter_map(|t| match t {
                TextureRef::Path(p) => Some(p.as_str()),
                TextureRef::Other(_) => None,
            }));
        }
        if let Some(motions) = &self.motions {
            for entry in motions.values().flatten() {
                refs.extend(entry.file.as_deref());
                refs.extend(entry.sound.as_deref());
            }
        }
        if let Some(expressions) = &self.expressions {
            refs.extend(expressions.iter().filter_map(|e| e.file.as_deref()));
        }
        refs
    }

    /// Apply `f` to every texture, motion and expression path.
    pub fn map_asset_references(&mut self, mut f: impl FnMut(&str) -> String) {
        if let Some(textures) = &mut self.textures {
            for texture in textures.iter_mut() {
                if let TextureRef::Path(path) = texture {
                    *path = f(path);
                }
            }
        }
        if let Some(motions) = &mut self.motions {
            for entry in motions.values_mut().flatten() {
                if let Some(file) = &mut entry.file {
                    *file = f(file);
                }
                if let Some(sound) = &mut entry.sound {
                    *sound = f(sound);
                }
            }
        }
        if let Some(expressions) = &mut self.expressions {
            for expression in expressions.iter_mut() {
                if let Some(file) = &mut expression.file {
                    *file = f(file);
                }
            }
        }
    }

    pub fn texture_paths(&self) -> Vec<&str> {
        self.textures
            .iter()
            .flatten()
            .filter_map(|t| match t {
                TextureRef::Path(p) => Some(p.as_str()),
                TextureRef::Other(_) => None,
            })
            .collect()
    }
}
