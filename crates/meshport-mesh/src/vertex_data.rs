//! Interleaved vertex buffer (`m_VertexData`) layout and decoding.
//!
//! A buffer holds up to six channels spread over one or more streams. Each
//! stream stores `vertex_count` records of `stride` bytes starting at its
//! offset; a channel lives at a fixed offset inside the records of its stream.

use half::f16;
use meshport_core::{Vector2, Vector3};

use crate::error::MeshError;
use crate::layout::{read_bytes, read_list, read_u64};
use crate::source::SourceObject;

/// Stream offsets derived from channel sizes are aligned to this many bytes.
const STREAM_ALIGNMENT: usize = 16;

/// Per-vertex attribute stored in a channel. The discriminant is the channel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttribute {
    Position = 0,
    Normal = 1,
    Color = 2,
    Uv0 = 3,
    Uv1 = 4,
    Tangent = 5,
}

/// Component encoding of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFormat {
    Float32,
    Float16,
    Other(u8),
}

impl ChannelFormat {
    fn from_raw(raw: u64) -> Self {
        match raw {
            0 => ChannelFormat::Float32,
            1 => ChannelFormat::Float16,
            other => ChannelFormat::Other(other.min(u8::MAX as u64) as u8),
        }
    }

    /// Size of one component in bytes.
    pub fn component_size(&self) -> usize {
        match self {
            ChannelFormat::Float32 => 4,
            ChannelFormat::Float16 => 2,
            ChannelFormat::Other(_) => 1,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ChannelFormat::Float32 | ChannelFormat::Float16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub stream: usize,
    pub offset: usize,
    pub format: ChannelFormat,
    pub dimension: usize,
}

impl ChannelInfo {
    pub fn is_present(&self) -> bool {
        self.dimension > 0
    }

    /// Bytes occupied by this channel inside one vertex record.
    pub fn size(&self) -> usize {
        self.format.component_size().saturating_mul(self.dimension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub offset: usize,
    pub stride: usize,
}

/// Attributes decoded from a bundled buffer.
#[derive(Debug, Clone, Default)]
pub struct DecodedVertices {
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub uv0: Vec<Vector2>,
    pub uv1: Vec<Vector2>,
}

/// Raw bundled vertex buffer, as read from the source object.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    vertex_count: usize,
    channels: Vec<ChannelInfo>,
    streams: Vec<StreamInfo>,
    data: Vec<u8>,
}

impl VertexBuffer {
    pub fn new(
        vertex_count: usize,
        channels: Vec<ChannelInfo>,
        streams: Option<Vec<StreamInfo>>,
        data: Vec<u8>,
    ) -> Self {
        let streams = streams.unwrap_or_else(|| derive_streams(&channels, vertex_count));
        Self {
            vertex_count,
            channels,
            streams,
            data,
        }
    }

    /// Read `m_VertexData`. Returns `None` when the buffer holds no vertices.
    pub(crate) fn read<S: SourceObject>(obj: &S, mesh: &str) -> Result<Option<Self>, MeshError> {
        let vertex_count = read_u64(obj, "m_VertexCount", mesh)?.unwrap_or(0) as usize;
        if vertex_count == 0 {
            return Ok(None);
        }

        let channel_objects = read_list(obj, "m_Channels", mesh)?
            .ok_or_else(|| MeshError::invalid(mesh, "m_VertexData.m_Channels", "a channel list"))?;
        let mut channels = Vec::with_capacity(channel_objects.len());
        for (i, channel) in channel_objects.into_iter().enumerate() {
            let field = |name: &str| format!("m_Channels[{i}].{name}");
            let get = |name: &str| -> Result<usize, MeshError> {
                Ok(read_u64(channel, name, mesh)
                    .map_err(|_| MeshError::invalid(mesh, field(name), "a non-negative integer"))?
                    .unwrap_or(0) as usize)
            };
            channels.push(ChannelInfo {
                stream: get("stream")?,
                offset: get("offset")?,
                format: ChannelFormat::from_raw(get("format")? as u64),
                dimension: get("dimension")?,
            });
        }

        let streams = match read_list(obj, "m_Streams", mesh)? {
            Some(stream_objects) => {
                let mut streams = Vec::with_capacity(stream_objects.len());
                for stream in stream_objects {
                    streams.push(StreamInfo {
                        offset: read_u64(stream, "offset", mesh)?.unwrap_or(0) as usize,
                        stride: read_u64(stream, "stride", mesh)?.unwrap_or(0) as usize,
                    });
                }
                Some(streams)
            }
            None => None,
        };

        let stream_limit = streams.as_ref().map_or(channels.len(), Vec::len);
        if let Some(i) = channels
            .iter()
            .position(|channel| channel.is_present() && channel.stream >= stream_limit)
        {
            return Err(MeshError::invalid(
                mesh,
                format!("m_Channels[{i}].stream"),
                &format!("a stream index below {stream_limit}"),
            ));
        }

        let data = read_bytes(obj, "m_DataSize", mesh)?;
        Ok(Some(Self::new(vertex_count, channels, streams, data)))
    }

    pub fn channel(&self, attribute: VertexAttribute) -> Option<&ChannelInfo> {
        self.channels
            .get(attribute as usize)
            .filter(|channel| channel.is_present())
    }

    /// Whether [`decode`](Self::decode) understands every channel it would read.
    pub fn is_decodable(&self) -> bool {
        let readable = |attribute, min_dimension| match self.channel(attribute) {
            None => true,
            Some(channel) => {
                channel.format.is_float()
                    && channel.dimension >= min_dimension
                    && channel.stream < self.streams.len()
            }
        };

        self.channel(VertexAttribute::Position).is_some()
            && readable(VertexAttribute::Position, 3)
            && readable(VertexAttribute::Normal, 3)
            && readable(VertexAttribute::Uv0, 2)
            && readable(VertexAttribute::Uv1, 2)
    }

    /// Decode positions, normals and both UV channels.
    pub fn decode(&self, mesh: &str) -> Result<DecodedVertices, MeshError> {
        Ok(DecodedVertices {
            vertices: self
                .read_attribute::<3>(VertexAttribute::Position, mesh)?
                .into_iter()
                .map(Vector3::from)
                .collect(),
            normals: self
                .read_attribute::<3>(VertexAttribute::Normal, mesh)?
                .into_iter()
                .map(Vector3::from)
                .collect(),
            uv0: self
                .read_attribute::<2>(VertexAttribute::Uv0, mesh)?
                .into_iter()
                .map(Vector2::from)
                .collect(),
            uv1: self
                .read_attribute::<2>(VertexAttribute::Uv1, mesh)?
                .into_iter()
                .map(Vector2::from)
                .collect(),
        })
    }

    /// Read the first `N` components of a channel for every vertex.
    /// An absent channel yields an empty list.
    fn read_attribute<const N: usize>(
        &self,
        attribute: VertexAttribute,
        mesh: &str,
    ) -> Result<Vec<[f32; N]>, MeshError> {
        let Some(channel) = self.channel(attribute) else {
            return Ok(Vec::new());
        };
        let out_of_range = || {
            MeshError::invalid(
                mesh,
                "m_VertexData.m_DataSize",
                &format!("enough bytes for {attribute:?} of {} vertices", self.vertex_count),
            )
        };
        if !channel.format.is_float() || channel.dimension < N {
            return Err(MeshError::invalid(
                mesh,
                format!("m_Channels[{}]", attribute as usize),
                &format!("a float channel with at least {N} components"),
            ));
        }
        let stream = self.streams.get(channel.stream).ok_or_else(out_of_range)?;
        let component_size = channel.format.component_size();
        let size = component_size * N;

        // A record holds the whole channel, which also bounds the vertex
        // count by the data length.
        let channel_end = channel
            .offset
            .checked_add(size)
            .filter(|&end| end <= stream.stride)
            .ok_or_else(|| {
                MeshError::invalid(
                    mesh,
                    format!("m_Streams[{}].stride", channel.stream),
                    &format!("a stride holding {attribute:?} at offset {}", channel.offset),
                )
            })?;

        let Some(last) = self.vertex_count.checked_sub(1) else {
            return Ok(Vec::new());
        };
        let end = last
            .checked_mul(stream.stride)
            .and_then(|n| n.checked_add(stream.offset))
            .and_then(|n| n.checked_add(channel_end))
            .ok_or_else(out_of_range)?;
        if end > self.data.len() {
            return Err(out_of_range());
        }

        let mut values = Vec::with_capacity(self.vertex_count);
        for vertex in 0..self.vertex_count {
            let start = stream.offset + vertex * stream.stride + channel.offset;
            let bytes = self.data.get(start..start + size).ok_or_else(out_of_range)?;

            let mut value = [0.0f32; N];
            for (component, chunk) in value.iter_mut().zip(bytes.chunks_exact(component_size)) {
                *component = match channel.format {
                    ChannelFormat::Float16 => f16::from_le_bytes([chunk[0], chunk[1]]).to_f32(),
                    _ => f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
                };
            }
            values.push(value);
        }
        Ok(values)
    }
}

/// Lay out streams back to back when the source does not describe them.
///
/// Offsets that would overflow saturate at `usize::MAX`, which no buffer can
/// reach, so decoding reports them as a short buffer.
fn derive_streams(channels: &[ChannelInfo], vertex_count: usize) -> Vec<StreamInfo> {
    let stream_count = channels
        .iter()
        .filter(|channel| channel.is_present())
        .map(|channel| channel.stream.saturating_add(1))
        .max()
        .unwrap_or(0)
        .min(channels.len());

    let mut streams = Vec::with_capacity(stream_count);
    let mut offset = 0usize;
    for stream in 0..stream_count {
        let stride = channels
            .iter()
            .filter(|channel| channel.is_present() && channel.stream == stream)
            .map(ChannelInfo::size)
            .fold(0usize, usize::saturating_add);
        streams.push(StreamInfo { offset, stride });
        offset = stride
            .checked_mul(vertex_count)
            .and_then(|n| n.checked_add(offset))
            .and_then(|n| n.checked_next_multiple_of(STREAM_ALIGNMENT))
            .unwrap_or(usize::MAX);
    }
    streams
}
