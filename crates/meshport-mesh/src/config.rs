use serde::{Deserialize, Serialize};

/// Vertex positions are scaled by this factor on export.
pub const DEFAULT_SCALE: f32 = 100.0;

/// OBJ export settings. Maps to the `[export]` table of the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Uniform scale applied to vertex positions.
    pub scale: f32,
    /// Negate X on positions and reverse triangle winding to match.
    pub mirror_x: bool,
    /// Write texture coordinates as `1 - v`.
    pub flip_v: bool,
    /// Text of the leading `#` comment.
    pub header: String,
    /// Repeat `g <material>` after every `usemtl`.
    pub duplicate_group_markers: bool,
    /// Maximum fractional digits written for floats.
    pub float_precision: usize,
    /// Output file extension, without the dot.
    pub extension: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            mirror_x: true,
            flip_v: true,
            header: format!("Created by meshport {}", env!("CARGO_PKG_VERSION")),
            duplicate_group_markers: true,
            float_precision: 6,
            extension: "obj".to_string(),
        }
    }
}
