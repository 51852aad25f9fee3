use meshport_core::{Vector2, Vector3};

use crate::error::MeshError;

/// Where a model's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// Decoded from an interleaved vertex buffer.
    Bundled,
    /// Read from per-attribute arrays.
    Legacy,
    /// The source had no vertex data at all (e.g. collision-only assets).
    Empty,
    /// The source had vertex data this crate cannot decode. Geometry is left
    /// empty instead of being guessed.
    UnsupportedCompression,
}

/// Per-vertex attribute arrays. Every non-empty array is indexed by the
/// same vertex index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub uv0: Vec<Vector2>,
    pub uv1: Vec<Vector2>,
}

/// A group of triangles sharing one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMesh {
    indices: Vec<u32>,
}

impl SubMesh {
    /// Flat triangle list, three indices per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Canonical decoded mesh. Immutable once built; every submesh index is
/// guaranteed to be below the vertex count.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshModel {
    name: String,
    source: GeometrySource,
    geometry: Geometry,
    submeshes: Vec<SubMesh>,
}

impl MeshModel {
    /// Assemble a model, validating attribute counts and every submesh.
    pub fn new(
        name: impl Into<String>,
        source: GeometrySource,
        geometry: Geometry,
        submeshes: Vec<Vec<u32>>,
    ) -> Result<Self, MeshError> {
        let name = name.into();
        let vertex_count = geometry.vertices.len();

        check_attribute(&name, "normal", vertex_count, geometry.normals.len())?;
        check_attribute(&name, "uv0", vertex_count, geometry.uv0.len())?;
        check_attribute(&name, "uv1", vertex_count, geometry.uv1.len())?;

        let submeshes = submeshes
            .into_iter()
            .enumerate()
            .map(|(i, indices)| validate_submesh(&name, i, indices, vertex_count))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            source,
            geometry,
            submeshes,
        })
    }

    /// A model whose vertex data was present but could not be decoded.
    pub fn compressed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: GeometrySource::UnsupportedCompression,
            geometry: Geometry::default(),
            submeshes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> GeometrySource {
        self.source
    }

    pub fn unsupported_compression(&self) -> bool {
        self.source == GeometrySource::UnsupportedCompression
    }

    pub fn vertices(&self) -> &[Vector3] {
        &self.geometry.vertices
    }

    pub fn normals(&self) -> &[Vector3] {
        &self.geometry.normals
    }

    pub fn uv0(&self) -> &[Vector2] {
        &self.geometry.uv0
    }

    pub fn uv1(&self) -> &[Vector2] {
        &self.geometry.uv1
    }

    /// The UV channel used for export: the primary one, or the secondary one
    /// when the primary is empty. The two are never merged.
    pub fn active_uv(&self) -> &[Vector2] {
        if self.geometry.uv0.is_empty() {
            &self.geometry.uv1
        } else {
            &self.geometry.uv0
        }
    }

    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    /// Whether there is anything to draw.
    pub fn is_empty(&self) -> bool {
        self.geometry.vertices.is_empty() && self.submeshes.is_empty()
    }
}

fn check_attribute(
    mesh: &str,
    attribute: &'static str,
    vertex_count: usize,
    found: usize,
) -> Result<(), MeshError> {
    if found == 0 || found == vertex_count {
        Ok(())
    } else {
        Err(MeshError::AttributeCountMismatch {
            mesh: mesh.to_string(),
            attribute,
            expected: vertex_count,
            found,
        })
    }
}

fn validate_submesh(
    mesh: &str,
    submesh: usize,
    indices: Vec<u32>,
    vertex_count: usize,
) -> Result<SubMesh, MeshError> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::malformed(
            mesh,
            submesh,
            format!("index count {} is not a multiple of 3", indices.len()),
        ));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MeshError::malformed(
            mesh,
            submesh,
            format!("index {index} out of range for {vertex_count} vertices"),
        ));
    }
    Ok(SubMesh { indices })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_geometry() -> Geometry {
        Geometry {
            vertices: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn valid_model_exposes_triangles() {
        let model = MeshModel::new(
            "Quad",
            GeometrySource::Legacy,
            quad_geometry(),
            vec![vec![0, 1, 2, 0, 2, 3]],
        )
        .unwrap();
        let triangles: Vec<_> = model.submeshes()[0].triangles().collect();
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(model.submeshes()[0].triangle_count(), 2);
    }

    #[test]
    fn index_count_must_be_multiple_of_three() {
        let result = MeshModel::new(
            "Quad",
            GeometrySource::Legacy,
            quad_geometry(),
            vec![vec![0, 1, 2, 3]],
        );
        match result {
            Err(MeshError::MalformedSubmesh { submesh, .. }) => assert_eq!(submesh, 0),
            other => panic!("expected MalformedSubmesh, got: {:?}", other),
        }
    }

    #[test]
    fn index_must_be_below_vertex_count() {
        let result = MeshModel::new(
            "Quad",
            GeometrySource::Legacy,
            quad_geometry(),
            vec![vec![0, 1, 2], vec![0, 1, 4]],
        );
        match result {
            Err(MeshError::MalformedSubmesh { submesh, .. }) => assert_eq!(submesh, 1),
            other => panic!("expected MalformedSubmesh, got: {:?}", other),
        }
    }

    #[test]
    fn normal_count_must_match() {
        let mut geometry = quad_geometry();
        geometry.normals = vec![Vector3::new(0.0, 0.0, 1.0)];
        match MeshModel::new("Quad", GeometrySource::Legacy, geometry, vec![]) {
            Err(MeshError::AttributeCountMismatch {
                attribute, found, ..
            }) => {
                assert_eq!(attribute, "normal");
                assert_eq!(found, 1);
            }
            other => panic!("expected AttributeCountMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn active_uv_prefers_primary_channel() {
        let mut geometry = quad_geometry();
        geometry.uv0 = vec![Vector2::new(0.0, 0.0); 4];
        geometry.uv1 = vec![Vector2::new(1.0, 1.0); 4];
        let model = MeshModel::new("Quad", GeometrySource::Legacy, geometry, vec![]).unwrap();
        assert_eq!(model.active_uv()[0], Vector2::new(0.0, 0.0));
    }

    #[test]
    fn active_uv_falls_back_to_secondary_channel() {
        let mut geometry = quad_geometry();
        geometry.uv1 = vec![Vector2::new(1.0, 1.0); 4];
        let model = MeshModel::new("Quad", GeometrySource::Legacy, geometry, vec![]).unwrap();
        assert_eq!(model.active_uv().len(), 4);
        assert_eq!(model.active_uv()[0], Vector2::new(1.0, 1.0));
    }

    #[test]
    fn unsupported_compression_model_is_empty_and_flagged() {
        let model = MeshModel::compressed("Packed");
        assert!(model.unsupported_compression());
        assert!(model.vertices().is_empty());
        assert!(model.normals().is_empty());
        assert!(model.active_uv().is_empty());
        assert!(model.submeshes().is_empty());
    }
}
