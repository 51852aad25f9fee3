//! Typed view of a mesh source object.
//!
//! [`MeshSource::read`], together with the vertex buffer reader it calls, is
//! the only place that looks fields up by name. It probes the object once and
//! resolves which vertex layout it carries:
//!
//! 1. a decodable bundled buffer (`m_VertexData`)
//! 2. legacy parallel arrays (`m_Vertices`, `m_Normals`, `m_UV`, `m_UV1`)
//! 3. a compressed payload (`m_CompressedMesh`) or an undecodable bundled buffer
//! 4. nothing

use meshport_core::{Vector2, Vector3};

use crate::error::MeshError;
use crate::source::SourceObject;
use crate::vertex_data::VertexBuffer;

/// Name used when the source carries no `m_Name`.
pub const UNNAMED_MESH: &str = "unnamed";

/// Width of the entries in the shared index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFormat {
    #[default]
    Uint16,
    Uint32,
}

impl IndexFormat {
    /// Size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// Submesh descriptor: a slice of the shared index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubMeshDescriptor {
    pub first_byte: usize,
    pub index_count: usize,
    /// 0 = triangle list. Other topologies are not decoded.
    pub topology: u64,
    pub base_vertex: u32,
}

/// Legacy layout: one array per attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyArrays {
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub uv0: Vec<Vector2>,
    pub uv1: Vec<Vector2>,
}

impl LegacyArrays {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.normals.is_empty()
            && self.uv0.is_empty()
            && self.uv1.is_empty()
    }
}

/// The vertex layout a source resolved to.
#[derive(Debug, Clone)]
pub enum VertexLayout {
    Bundled(VertexBuffer),
    Legacy(LegacyArrays),
    /// Vertex data is present but packed in a form this crate cannot decode.
    Compressed,
    Empty,
}

/// Strongly-typed intermediate read from a source object.
#[derive(Debug, Clone)]
pub struct MeshSource {
    pub name: String,
    pub layout: VertexLayout,
    pub submeshes: Vec<SubMeshDescriptor>,
    pub index_buffer: Vec<u8>,
    pub index_format: IndexFormat,
    /// Compression level recorded by the asset (`m_MeshCompression`), 0 if absent.
    pub mesh_compression: u64,
}

impl MeshSource {
    pub fn read<S: SourceObject>(obj: &S) -> Result<Self, MeshError> {
        let name = obj
            .get_value("m_Name")
            .and_then(|v| v.as_scalar())
            .and_then(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(UNNAMED_MESH)
            .to_string();

        let submeshes = read_submeshes(obj, &name)?;
        let index_buffer = read_bytes(obj, "m_IndexBuffer", &name)?;
        let index_format = match read_u64(obj, "m_IndexFormat", &name)? {
            None | Some(0) => IndexFormat::Uint16,
            Some(1) => IndexFormat::Uint32,
            Some(_) => return Err(MeshError::invalid(&name, "m_IndexFormat", "0 or 1")),
        };
        let mesh_compression = read_u64(obj, "m_MeshCompression", &name)?.unwrap_or(0);
        let layout = resolve_layout(obj, &name)?;

        Ok(Self {
            name,
            layout,
            submeshes,
            index_buffer,
            index_format,
            mesh_compression,
        })
    }
}

fn resolve_layout<S: SourceObject>(obj: &S, mesh: &str) -> Result<VertexLayout, MeshError> {
    let bundled = match obj.get_object("m_VertexData") {
        Some(vertex_data) => VertexBuffer::read(vertex_data, mesh)?,
        None => None,
    };
    let bundled_present = match bundled {
        Some(buffer) if buffer.is_decodable() => return Ok(VertexLayout::Bundled(buffer)),
        Some(_) => true,
        None => false,
    };

    let legacy = read_legacy_arrays(obj, mesh)?;
    if !legacy.is_empty() {
        return Ok(VertexLayout::Legacy(legacy));
    }

    if bundled_present || has_compressed_payload(obj, mesh)? {
        return Ok(VertexLayout::Compressed);
    }
    Ok(VertexLayout::Empty)
}

fn has_compressed_payload<S: SourceObject>(obj: &S, mesh: &str) -> Result<bool, MeshError> {
    let Some(vertices) = obj
        .get_object("m_CompressedMesh")
        .and_then(|compressed| compressed.get_object("m_Vertices"))
    else {
        return Ok(false);
    };
    Ok(read_u64(vertices, "m_NumItems", mesh)?.unwrap_or(0) > 0)
}

fn read_submeshes<S: SourceObject>(
    obj: &S,
    mesh: &str,
) -> Result<Vec<SubMeshDescriptor>, MeshError> {
    let entries = read_list(obj, "m_SubMeshes", mesh)?.ok_or_else(|| MeshError::MissingField {
        mesh: mesh.to_string(),
        field: "m_SubMeshes".to_string(),
    })?;

    let mut submeshes = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let index_count = read_u64(entry, "indexCount", mesh)?
            .ok_or_else(|| MeshError::malformed(mesh, i, "missing indexCount"))?;
        let base_vertex = read_u64(entry, "baseVertex", mesh)?.unwrap_or(0);
        submeshes.push(SubMeshDescriptor {
            first_byte: read_u64(entry, "firstByte", mesh)?.unwrap_or(0) as usize,
            index_count: index_count as usize,
            topology: read_u64(entry, "topology", mesh)?.unwrap_or(0),
            base_vertex: u32::try_from(base_vertex)
                .map_err(|_| MeshError::malformed(mesh, i, "baseVertex out of range"))?,
        });
    }
    Ok(submeshes)
}

fn read_legacy_arrays<S: SourceObject>(obj: &S, mesh: &str) -> Result<LegacyArrays, MeshError> {
    Ok(LegacyArrays {
        vertices: read_vector3_list(obj, "m_Vertices", mesh)?,
        normals: read_vector3_list(obj, "m_Normals", mesh)?,
        uv0: read_vector2_list(obj, "m_UV", mesh)?,
        uv1: read_vector2_list(obj, "m_UV1", mesh)?,
    })
}

fn read_component<S: SourceObject>(
    element: &S,
    field: &str,
    index: usize,
    component: &str,
    mesh: &str,
) -> Result<f32, MeshError> {
    element
        .get_value(component)
        .and_then(|v| v.as_scalar())
        .and_then(|s| s.as_f32())
        .ok_or_else(|| MeshError::invalid(mesh, format!("{field}[{index}].{component}"), "a number"))
}

fn read_vector3_list<S: SourceObject>(
    obj: &S,
    field: &str,
    mesh: &str,
) -> Result<Vec<Vector3>, MeshError> {
    let Some(elements) = read_list(obj, field, mesh)? else {
        return Ok(Vec::new());
    };
    elements
        .into_iter()
        .enumerate()
        .map(|(i, e)| -> Result<Vector3, MeshError> {
            Ok(Vector3::new(
                read_component(e, field, i, "x", mesh)?,
                read_component(e, field, i, "y", mesh)?,
                read_component(e, field, i, "z", mesh)?,
            ))
        })
        .collect()
}

fn read_vector2_list<S: SourceObject>(
    obj: &S,
    field: &str,
    mesh: &str,
) -> Result<Vec<Vector2>, MeshError> {
    let Some(elements) = read_list(obj, field, mesh)? else {
        return Ok(Vec::new());
    };
    elements
        .into_iter()
        .enumerate()
        .map(|(i, e)| -> Result<Vector2, MeshError> {
            Ok(Vector2::new(
                read_component(e, field, i, "x", mesh)?,
                read_component(e, field, i, "y", mesh)?,
            ))
        })
        .collect()
}

/// Optional non-negative integer field.
pub(crate) fn read_u64<S: SourceObject>(
    obj: &S,
    field: &str,
    mesh: &str,
) -> Result<Option<u64>, MeshError> {
    match obj.get_value(field) {
        None => Ok(None),
        Some(value) => value
            .as_scalar()
            .and_then(|s| s.as_u64())
            .map(Some)
            .ok_or_else(|| MeshError::invalid(mesh, field, "a non-negative integer")),
    }
}

/// Optional list field. A present scalar is an error.
pub(crate) fn read_list<'s, S: SourceObject>(
    obj: &'s S,
    field: &str,
    mesh: &str,
) -> Result<Option<Vec<&'s S>>, MeshError> {
    match obj.get_value(field) {
        None => Ok(None),
        Some(value) => value
            .into_list()
            .map(Some)
            .ok_or_else(|| MeshError::invalid(mesh, field, "a list")),
    }
}

/// Optional byte-array field, stored as a list of integers. Absent means empty.
pub(crate) fn read_bytes<S: SourceObject>(
    obj: &S,
    field: &str,
    mesh: &str,
) -> Result<Vec<u8>, MeshError> {
    let Some(items) = read_list(obj, field, mesh)? else {
        return Ok(Vec::new());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_scalar()
                .and_then(|s| s.as_u64())
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| MeshError::invalid(mesh, format!("{field}[{i}]"), "a byte"))
        })
        .collect()
}
