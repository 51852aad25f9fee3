//! Wavefront OBJ export.
//!
//! The output is written in a single forward pass:
//!
//! ```text
//! # header
//! v x y z          positions, scaled and X-mirrored
//! vn x y z         normals, as stored
//! vt u v           active UV channel, V flipped
//!
//! g <mesh>
//! s 1
//! usemtl <material>
//! g <material>
//! f c/c/c b/b/b a/a/a
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::mesh::MeshModel;

/// Signal returned by a successful file export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportCompleted {
    pub mesh_name: String,
    pub path: PathBuf,
}

/// Writes [`MeshModel`]s as OBJ text. Holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct ObjExporter {
    config: ExportConfig,
}

impl ObjExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Output file name for a model: `<name>.<extension>`.
    pub fn file_name(&self, model: &MeshModel) -> String {
        format!("{}.{}", sanitize_file_stem(model.name()), self.config.extension)
    }

    /// Material name of submesh `index` out of `count`.
    pub fn material_name(mesh_name: &str, index: usize, count: usize) -> String {
        if count == 1 {
            mesh_name.to_string()
        } else {
            format!("{mesh_name}_{index}")
        }
    }

    /// Write `model` as OBJ text to `out`.
    pub fn write<W: Write>(&self, model: &MeshModel, out: &mut W) -> Result<(), ExportError> {
        if model.unsupported_compression() {
            return Err(ExportError::UnsupportedCompression(model.name().to_string()));
        }

        let precision = self.config.float_precision;
        let float = |value: f32| format_float(value, precision);

        writeln!(out, "# {}", self.config.header)?;
        if model.is_empty() {
            return Ok(());
        }

        for v in model.vertices() {
            let v = v.scale(self.config.scale);
            let v = if self.config.mirror_x { v.mirror_x() } else { v };
            writeln!(out, "v {} {} {}", float(v.x), float(v.y), float(v.z))?;
        }

        for vn in model.normals() {
            writeln!(out, "vn {} {} {}", float(vn.x), float(vn.y), float(vn.z))?;
        }

        let uvs = model.active_uv();
        for vt in uvs {
            let vt = if self.config.flip_v { vt.flip_v() } else { *vt };
            writeln!(out, "vt {} {}", float(vt.x), float(vt.y))?;
        }

        let group = sanitize_group_name(model.name());
        writeln!(out)?;
        writeln!(out, "g {group}")?;
        writeln!(out, "s 1")?;

        let corner = CornerFormat {
            uv: !uvs.is_empty(),
            normal: !model.normals().is_empty(),
        };
        let submesh_count = model.submeshes().len();
        let mut line = String::new();
        for (i, submesh) in model.submeshes().iter().enumerate() {
            let material = Self::material_name(&group, i, submesh_count);
            writeln!(out, "usemtl {material}")?;
            if self.config.duplicate_group_markers {
                writeln!(out, "g {material}")?;
            }

            for mut triangle in submesh.triangles() {
                if self.config.mirror_x {
                    triangle.reverse();
                }
                line.clear();
                line.push('f');
                for index in triangle {
                    line.push(' ');
                    corner.push(&mut line, index as usize + 1);
                }
                writeln!(out, "{line}")?;
            }

            writeln!(out)?;
        }

        Ok(())
    }

    /// Export `model` to `<dir>/<name>.<extension>`.
    ///
    /// The file is created before anything is written; a failure part way
    /// through can leave a partial file behind.
    pub fn export_to_dir(&self, model: &MeshModel, dir: &Path) -> Result<ExportCompleted, ExportError> {
        if model.unsupported_compression() {
            return Err(ExportError::UnsupportedCompression(model.name().to_string()));
        }

        let path = dir.join(self.file_name(model));
        let file = File::create(&path).map_err(|e| ExportError::Create(path.clone(), e))?;
        let mut writer = BufWriter::new(file);
        self.write(model, &mut writer)?;
        writer.flush()?;

        debug!(
            "Wrote mesh '{}': {} vertices, {} submeshes",
            model.name(),
            model.vertices().len(),
            model.submeshes().len()
        );
        info!("Exported {}", path.display());

        Ok(ExportCompleted {
            mesh_name: model.name().to_string(),
            path,
        })
    }
}

/// Which slots a face corner carries. One index is shared by all slots.
#[derive(Debug, Clone, Copy)]
struct CornerFormat {
    uv: bool,
    normal: bool,
}

impl CornerFormat {
    fn push(&self, line: &mut String, index: usize) {
        let index = index.to_string();
        line.push_str(&index);
        match (self.uv, self.normal) {
            (true, true) => {
                line.push('/');
                line.push_str(&index);
                line.push('/');
                line.push_str(&index);
            }
            (true, false) => {
                line.push('/');
                line.push_str(&index);
            }
            (false, true) => {
                line.push_str("//");
                line.push_str(&index);
            }
            (false, false) => {}
        }
    }
}

/// Fixed-precision float with trailing zeros trimmed; `-0` prints as `0`.
fn format_float(value: f32, precision: usize) -> String {
    let mut s = format!("{value:.precision$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}

/// Group and material names are single whitespace-free tokens.
fn sanitize_group_name(name: &str) -> String {
    let group: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect();
    if group.is_empty() {
        "unnamed".to_string()
    } else {
        group
    }
}

/// Replace characters that cannot appear in a file name.
fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() || stem == "." || stem == ".." {
        "unnamed".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Geometry, GeometrySource};
    use meshport_core::{Vector2, Vector3};

    fn export(model: &MeshModel) -> String {
        let mut out = Vec::new();
        ObjExporter::default().write(model, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn lines_starting_with<'a>(text: &'a str, prefix: &str) -> Vec<&'a str> {
        text.lines().filter(|l| l.starts_with(prefix)).collect()
    }

    fn triangle(geometry: Geometry, submeshes: Vec<Vec<u32>>) -> MeshModel {
        MeshModel::new("Tri", GeometrySource::Legacy, geometry, submeshes).unwrap()
    }

    fn three_vertices() -> Vec<Vector3> {
        vec![
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.5, 0.25, -1.0),
        ]
    }

    fn cube() -> MeshModel {
        let vertices = (0..8)
            .map(|i| {
                Vector3::new(
                    (i & 1) as f32,
                    ((i >> 1) & 1) as f32,
                    ((i >> 2) & 1) as f32,
                )
            })
            .collect();
        let indices = vec![
            0, 2, 1, 1, 2, 3, 4, 5, 6, 5, 7, 6, 0, 1, 4, 1, 5, 4, 2, 6, 3, 3, 6, 7, 0, 4, 2, 2, 4,
            6, 1, 3, 5, 3, 7, 5,
        ];
        MeshModel::new(
            "Cube",
            GeometrySource::Legacy,
            Geometry {
                vertices,
                ..Default::default()
            },
            vec![indices],
        )
        .unwrap()
    }

    #[test]
    fn vertex_is_scaled_and_mirrored() {
        let model = triangle(
            Geometry {
                vertices: three_vertices(),
                ..Default::default()
            },
            vec![],
        );
        let text = export(&model);
        let v = lines_starting_with(&text, "v ");
        assert_eq!(v[0], "v -100 200 300");
        assert_eq!(v[1], "v 0 0 0");
        assert_eq!(v[2], "v -50 25 -100");
    }

    #[test]
    fn normals_are_written_unchanged() {
        // Positions are X-mirrored but normals are not; keep it that way.
        let model = triangle(
            Geometry {
                vertices: three_vertices(),
                normals: vec![Vector3::new(1.0, 2.0, 3.0); 3],
                ..Default::default()
            },
            vec![],
        );
        let text = export(&model);
        assert_eq!(lines_starting_with(&text, "vn ")[0], "vn 1 2 3");
    }

    #[test]
    fn uv_is_flipped_vertically() {
        let model = triangle(
            Geometry {
                vertices: three_vertices(),
                uv0: vec![Vector2::new(0.3, 0.8); 3],
                ..Default::default()
            },
            vec![],
        );
        let text = export(&model);
        assert_eq!(lines_starting_with(&text, "vt ")[0], "vt 0.3 0.2");
    }

    #[test]
    fn secondary_uv_used_when_primary_empty() {
        let model = triangle(
            Geometry {
                vertices: three_vertices(),
                uv1: vec![Vector2::new(0.0, 0.0); 3],
                ..Default::default()
            },
            vec![vec![0, 1, 2]],
        );
        let text = export(&model);
        assert_eq!(lines_starting_with(&text, "vt ").len(), 3);
        assert_eq!(lines_starting_with(&text, "f ")[0], "f 3/3 2/2 1/1");
    }

    #[test]
    fn face_winding_is_reversed_and_one_based() {
        let model = triangle(
            Geometry {
                vertices: three_vertices(),
                ..Default::default()
            },
            vec![vec![0, 1, 2]],
        );
        let text = export(&model);
        assert_eq!(lines_starting_with(&text, "f "), vec!["f 3 2 1"]);
    }

    #[test]
    fn face_tokens_follow_available_attributes() {
        let geometry = Geometry {
            vertices: three_vertices(),
            normals: vec![Vector3::new(0.0, 1.0, 0.0); 3],
            uv0: vec![Vector2::new(0.0, 0.0); 3],
            ..Default::default()
        };
        let text = export(&triangle(geometry.clone(), vec![vec![0, 1, 2]]));
        assert_eq!(lines_starting_with(&text, "f ")[0], "f 3/3/3 2/2/2 1/1/1");

        let normals_only = Geometry {
            uv0: Vec::new(),
            ..geometry
        };
        let text = export(&triangle(normals_only, vec![vec![0, 1, 2]]));
        assert_eq!(lines_starting_with(&text, "f ")[0], "f 3//3 2//2 1//1");
    }

    #[test]
    fn cube_layout() {
        let text = export(&cube());
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("# "));
        assert_eq!(lines_starting_with(&text, "v ").len(), 8);
        assert_eq!(lines_starting_with(&text, "vn ").len(), 0);
        assert_eq!(lines_starting_with(&text, "vt ").len(), 0);
        assert_eq!(lines_starting_with(&text, "f ").len(), 12);
        assert_eq!(lines[9], "");
        assert_eq!(lines[10], "g Cube");
        assert_eq!(lines[11], "s 1");
        assert_eq!(lines[12], "usemtl Cube");
        assert_eq!(lines[13], "g Cube");
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn multiple_submeshes_get_indexed_materials() {
        let model = MeshModel::new(
            "Name",
            GeometrySource::Legacy,
            Geometry {
                vertices: three_vertices(),
                ..Default::default()
            },
            vec![vec![0, 1, 2], vec![2, 1, 0]],
        )
        .unwrap();
        let text = export(&model);
        assert_eq!(
            lines_starting_with(&text, "usemtl "),
            vec!["usemtl Name_0", "usemtl Name_1"]
        );
        assert_eq!(
            lines_starting_with(&text, "g "),
            vec!["g Name", "g Name_0", "g Name_1"]
        );
    }

    #[test]
    fn duplicate_group_markers_can_be_disabled() {
        let exporter = ObjExporter::new(ExportConfig {
            duplicate_group_markers: false,
            ..Default::default()
        });
        let mut out = Vec::new();
        exporter.write(&cube(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(lines_starting_with(&text, "g "), vec!["g Cube"]);
    }

    #[test]
    fn empty_model_writes_only_header() {
        let model =
            MeshModel::new("Empty", GeometrySource::Empty, Geometry::default(), vec![]).unwrap();
        let text = export(&model);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("# Created by meshport"));
    }

    #[test]
    fn export_is_deterministic() {
        let model = cube();
        assert_eq!(export(&model), export(&model));
    }

    #[test]
    fn compressed_model_is_rejected() {
        let mut out = Vec::new();
        let result = ObjExporter::default().write(&MeshModel::compressed("Packed"), &mut out);
        assert!(matches!(result, Err(ExportError::UnsupportedCompression(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn export_to_dir_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let completed = ObjExporter::default()
            .export_to_dir(&cube(), dir.path())
            .unwrap();
        assert_eq!(completed.mesh_name, "Cube");
        assert_eq!(completed.path, dir.path().join("Cube.obj"));
        let written = std::fs::read_to_string(&completed.path).unwrap();
        assert_eq!(written, export(&cube()));
    }

    #[test]
    fn export_to_missing_dir_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        match ObjExporter::default().export_to_dir(&cube(), &missing) {
            Err(ExportError::Create(path, _)) => assert_eq!(path, missing.join("Cube.obj")),
            other => panic!("expected Create error, got: {:?}", other),
        }
    }

    #[test]
    fn float_formatting() {
        assert_eq!(format_float(-100.0, 6), "-100");
        assert_eq!(format_float(1.0 - 0.8f32, 6), "0.2");
        assert_eq!(format_float(0.3, 6), "0.3");
        assert_eq!(format_float(-0.0, 6), "0");
        assert_eq!(format_float(-0.0000001, 6), "0");
        assert_eq!(format_float(12.7, 0), "13");
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_stem("body/arm:left"), "body_arm_left");
        assert_eq!(sanitize_file_stem(""), "unnamed");
        assert_eq!(sanitize_file_stem(".."), "unnamed");
        assert_eq!(sanitize_file_stem("Cube"), "Cube");
    }

    #[test]
    fn mesh_name_cannot_break_group_lines() {
        let geometry = Geometry {
            vertices: three_vertices(),
            ..Default::default()
        };
        let model = MeshModel::new(
            "Left arm\nv 9 9 9",
            GeometrySource::Legacy,
            geometry,
            vec![vec![0, 1, 2], vec![2, 1, 0]],
        )
        .unwrap();
        let text = export(&model);

        assert_eq!(lines_starting_with(&text, "v ").len(), 3);
        assert_eq!(
            lines_starting_with(&text, "g "),
            vec![
                "g Left_arm_v_9_9_9",
                "g Left_arm_v_9_9_9_0",
                "g Left_arm_v_9_9_9_1",
            ]
        );
        assert_eq!(
            lines_starting_with(&text, "usemtl "),
            vec!["usemtl Left_arm_v_9_9_9_0", "usemtl Left_arm_v_9_9_9_1"]
        );
        assert_eq!(sanitize_group_name(" \t "), "unnamed");
    }
}
