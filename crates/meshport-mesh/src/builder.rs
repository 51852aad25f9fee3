use tracing::{debug, warn};

use crate::error::MeshError;
use crate::layout::{IndexFormat, MeshSource, SubMeshDescriptor, VertexLayout};
use crate::mesh::{Geometry, GeometrySource, MeshModel};
use crate::source::SourceObject;

/// Converts source objects into [`MeshModel`]s.
///
/// Holds no state between calls, so one builder can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshModelBuilder;

impl MeshModelBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build a model from a source object.
    ///
    /// Missing or undecodable vertex data yields an empty model; only
    /// structurally invalid data is an error.
    pub fn build<S: SourceObject>(&self, source: &S) -> Result<MeshModel, MeshError> {
        self.build_from(MeshSource::read(source)?)
    }

    /// Build a model from an already-read [`MeshSource`].
    pub fn build_from(&self, source: MeshSource) -> Result<MeshModel, MeshError> {
        let MeshSource {
            name,
            layout,
            submeshes,
            index_buffer,
            index_format,
            mesh_compression,
        } = source;

        let (geometry_source, geometry) = match layout {
            VertexLayout::Bundled(buffer) => {
                let decoded = buffer.decode(&name)?;
                let geometry = Geometry {
                    vertices: decoded.vertices,
                    normals: decoded.normals,
                    uv0: decoded.uv0,
                    uv1: decoded.uv1,
                };
                (GeometrySource::Bundled, geometry)
            }
            VertexLayout::Legacy(arrays) => {
                let geometry = Geometry {
                    vertices: arrays.vertices,
                    normals: arrays.normals,
                    uv0: arrays.uv0,
                    uv1: arrays.uv1,
                };
                (GeometrySource::Legacy, geometry)
            }
            VertexLayout::Compressed => {
                warn!(
                    "Mesh '{}' has compressed vertex data (compression level {}), skipping",
                    name, mesh_compression
                );
                return Ok(MeshModel::compressed(name));
            }
            VertexLayout::Empty => {
                warn!("Mesh '{}' has no mesh data", name);
                if !submeshes.is_empty() {
                    debug!(
                        "Dropping {} submeshes of '{}' without vertices",
                        submeshes.len(),
                        name
                    );
                }
                return MeshModel::new(name, GeometrySource::Empty, Geometry::default(), Vec::new());
            }
        };

        let submesh_indices = submeshes
            .iter()
            .enumerate()
            .map(|(i, descriptor)| {
                extract_indices(&name, i, descriptor, &index_buffer, index_format)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let model = MeshModel::new(name, geometry_source, geometry, submesh_indices)?;
        debug!(
            "Built mesh '{}' from {:?} layout: {} vertices, {} submeshes",
            model.name(),
            geometry_source,
            model.vertices().len(),
            model.submeshes().len()
        );
        Ok(model)
    }
}

/// Slice one submesh's triangle list out of the shared index buffer.
fn extract_indices(
    mesh: &str,
    submesh: usize,
    descriptor: &SubMeshDescriptor,
    index_buffer: &[u8],
    index_format: IndexFormat,
) -> Result<Vec<u32>, MeshError> {
    if descriptor.topology != 0 {
        return Err(MeshError::malformed(
            mesh,
            submesh,
            format!("topology {} is not a triangle list", descriptor.topology),
        ));
    }
    if descriptor.index_count % 3 != 0 {
        return Err(MeshError::malformed(
            mesh,
            submesh,
            format!("index count {} is not a multiple of 3", descriptor.index_count),
        ));
    }

    let width = index_format.size();
    if descriptor.first_byte % width != 0 {
        return Err(MeshError::malformed(
            mesh,
            submesh,
            format!("first byte {} is not aligned to {width}", descriptor.first_byte),
        ));
    }
    let bytes = descriptor
        .index_count
        .checked_mul(width)
        .and_then(|len| descriptor.first_byte.checked_add(len))
        .and_then(|end| index_buffer.get(descriptor.first_byte..end))
        .ok_or_else(|| {
            MeshError::malformed(
                mesh,
                submesh,
                format!(
                    "{} indices from byte {} exceed the {}-byte index buffer",
                    descriptor.index_count,
                    descriptor.first_byte,
                    index_buffer.len()
                ),
            )
        })?;

    bytes
        .chunks_exact(width)
        .map(|chunk| {
            let raw = match index_format {
                IndexFormat::Uint16 => u32::from(u16::from_le_bytes([chunk[0], chunk[1]])),
                IndexFormat::Uint32 => u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            };
            raw.checked_add(descriptor.base_vertex)
                .ok_or_else(|| MeshError::malformed(mesh, submesh, "baseVertex overflows index"))
        })
        .collect()
}
