use anyhow::Result;

use super::{BufferId, ProgramId, TextureId, VertexArrayId};
use crate::texture::{ColorMode, DataType, FilterMode};

/// Role of a device buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

/// Expected update frequency of uploaded data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum UploadHint {
    /// Written once, drawn many times.
    #[default]
    Static,
    /// Rewritten frequently.
    Dynamic,
}

/// One vertex attribute, sourced from its own tightly packed `f32` buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Components per vertex (1..=4).
    pub components: u32,
    pub buffer: BufferId,
}

/// A uniform declared by a program, resolved by reflection.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformBinding {
    pub name: String,
    /// Binding index within group 0. This is the uniform's location.
    pub binding: u32,
    /// Size of the uniform's type in bytes.
    pub size: u32,
}

/// Validated program sources handed to a backend.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub vertex_source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_source: &'a str,
    pub fragment_entry: &'a str,
    pub uniforms: &'a [UniformBinding],
}

/// Image format and dimensions of a texture upload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
    pub data_type: DataType,
    pub filter: FilterMode,
}

/// A single indexed triangle-list draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
    pub index_buffer: BufferId,
    pub index_count: u32,
    pub depth_test: bool,
}

/// Device contract implemented by rendering backends.
///
/// A backend is bound to one device and used from one thread. Methods take
/// `&self`; implementations keep their tables behind interior mutability.
///
/// Unknown handles are ignored (with a log message) rather than rejected.
pub trait Backend {
    fn name(&self) -> &str;

    fn create_buffer(&self, kind: BufferKind) -> BufferId;

    /// Replaces the whole contents of `buffer` with `data`.
    fn upload_buffer(&self, buffer: BufferId, data: &[u8], hint: UploadHint);

    /// Reads back the current contents of `buffer`.
    fn read_buffer(&self, buffer: BufferId) -> Result<Vec<u8>>;

    fn delete_buffer(&self, buffer: BufferId);

    fn create_vertex_array(&self, attributes: &[VertexAttribute]) -> VertexArrayId;

    fn delete_vertex_array(&self, vertex_array: VertexArrayId);

    fn create_program(&self, desc: &ProgramDesc<'_>) -> ProgramId;

    fn delete_program(&self, program: ProgramId);

    /// Writes the raw value of the uniform at `location` of `program`.
    fn set_uniform(&self, program: ProgramId, location: u32, data: &[u8]);

    fn create_texture(&self, desc: &TextureDesc, data: &[u8]) -> TextureId;

    fn delete_texture(&self, texture: TextureId);

    /// Clears the color target to `color` and depth to the far plane.
    fn clear(&self, color: [f32; 4]);

    fn draw_indexed(&self, call: &DrawCall);
}
