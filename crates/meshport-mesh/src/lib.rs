//! Meshport Mesh - Mesh decoding and OBJ export
//!
//! Turns a versioned asset object into an immutable [`MeshModel`] and writes
//! it as Wavefront OBJ text.
//!
//! ```text
//! SourceObject -> MeshSource -> MeshModelBuilder -> MeshModel -> ObjExporter
//! ```

mod batch;
mod builder;
mod config;
mod error;
mod hook;
mod layout;
mod mesh;
mod obj;
mod source;
mod vertex_data;

pub use batch::{AssetOutcome, AssetReport, BatchReport, MeshBatch, SkipReason, Stage};
pub use builder::MeshModelBuilder;
pub use config::{ExportConfig, DEFAULT_SCALE};
pub use error::{ExportError, MeshError};
pub use hook::PostExportHook;
pub use layout::{
    IndexFormat, LegacyArrays, MeshSource, SubMeshDescriptor, VertexLayout, UNNAMED_MESH,
};
pub use mesh::{Geometry, GeometrySource, MeshModel, SubMesh};
pub use obj::{ExportCompleted, ObjExporter};
pub use source::{Scalar, SourceObject, Value};
pub use vertex_data::{
    ChannelFormat, ChannelInfo, DecodedVertices, StreamInfo, VertexAttribute, VertexBuffer,
};
