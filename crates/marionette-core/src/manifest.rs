//! Model manifest - the `model3.json` file references
//!
//! Only the parts Marionette needs are modelled: the expression list, the
//! motion groups (in declaration order) and the companion files a host may
//! want to preload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ExpressionDef, ExpressionList, MarionetteError, MarionetteResult, MotionGroupTable};

/// A motion file reference inside a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MotionFileRef {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in_time: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out_time: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExpressionFileRef {
    name: String,
    file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileReferences {
    #[serde(default)]
    moc: Option<String>,
    #[serde(default)]
    textures: Vec<String>,
    #[serde(default)]
    physics: Option<String>,
    #[serde(default)]
    pose: Option<String>,
    #[serde(default)]
    display_info: Option<String>,
    #[serde(default)]
    expressions: Vec<ExpressionFileRef>,
    // Kept as a raw map so group declaration order survives
    #[serde(default)]
    motions: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawManifest {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    file_references: FileReferences,
}

/// Parsed model manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ModelManifest {
    pub version: u32,
    pub moc: Option<String>,
    pub textures: Vec<String>,
    pub physics: Option<String>,
    pub pose: Option<String>,
    pub display_info: Option<String>,
    pub expressions: ExpressionList,
    pub motions: MotionGroupTable,
    /// Per-group file references with their fade times
    pub motion_files: Vec<(String, Vec<MotionFileRef>)>,
}

impl ModelManifest {
    /// Parse a `model3.json` document
    pub fn from_slice(bytes: &[u8], source_ref: &str) -> MarionetteResult<Self> {
        let raw: RawManifest =
            serde_json::from_slice(bytes).map_err(|e| MarionetteError::asset_parse(source_ref, e))?;
        let refs = raw.file_references;

        let expressions = refs
            .expressions
            .into_iter()
            .map(|e| {
                let display = display_name_for(&e.file);
                ExpressionDef::new(e.name, e.file).with_display_name(display)
            })
            .collect();

        let mut motions = MotionGroupTable::new();
        let mut motion_files = Vec::with_capacity(refs.motions.len());
        for (group, value) in refs.motions {
            let files: Vec<MotionFileRef> = serde_json::from_value(value).map_err(|e| {
                MarionetteError::asset_parse(source_ref, format!("motion group {group}: {e}"))
            })?;
            motions.insert_group(group.clone(), files.iter().map(|f| f.file.clone()));
            motion_files.push((group, files));
        }

        Ok(ModelManifest {
            version: raw.version.unwrap_or(3),
            moc: refs.moc,
            textures: refs.textures,
            physics: refs.physics,
            pose: refs.pose,
            display_info: refs.display_info,
            expressions,
            motions,
            motion_files,
        })
    }

    pub fn from_json_str(json: &str, source_ref: &str) -> MarionetteResult<Self> {
        Self::from_slice(json.as_bytes(), source_ref)
    }
}

/// Derive a display name from an asset file name:
/// `"huishou.motion3.json"` becomes `"huishou"`.
pub fn display_name_for(file: &str) -> String {
    let base = file.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file);
    base.split('.').next().unwrap_or(base).to_string()
}
