use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{Result, anyhow};

use super::handle::HandleCounter;
use super::{
    Backend, BufferId, BufferKind, DrawCall, ProgramDesc, ProgramId, TextureDesc, TextureId,
    UniformBinding, UploadHint, VertexArrayId, VertexAttribute,
};

/// A draw as observed by the [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub call: DrawCall,
    /// Index values referenced by the draw, in submission order.
    pub indices: Vec<u32>,
}

#[derive(Debug)]
struct HeadlessBuffer {
    kind: BufferKind,
    data: Vec<u8>,
    hint: Option<UploadHint>,
}

#[derive(Debug)]
struct HeadlessProgram {
    uniforms: Vec<UniformBinding>,
    values: HashMap<u32, Vec<u8>>,
}

#[derive(Debug, Default)]
struct State {
    buffers: HashMap<BufferId, HeadlessBuffer>,
    vertex_arrays: HashMap<VertexArrayId, Vec<VertexAttribute>>,
    programs: HashMap<ProgramId, HeadlessProgram>,
    textures: HashMap<TextureId, (TextureDesc, usize)>,
    clears: Vec<[f32; 4]>,
    draws: Vec<DrawRecord>,
}

/// In-memory backend with no GPU behind it.
///
/// Every call is recorded so the resource layer can be inspected: buffer
/// contents round-trip exactly, draws resolve their index lists, and deleted
/// handles disappear from the live counts.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    ids: HandleCounter,
    state: RefCell<State>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn buffer_kind(&self, buffer: BufferId) -> Option<BufferKind> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.kind)
    }

    /// Hint passed with the last upload, `None` if never uploaded.
    pub fn buffer_hint(&self, buffer: BufferId) -> Option<UploadHint> {
        self.state.borrow().buffers.get(&buffer).and_then(|b| b.hint)
    }

    pub fn vertex_array_layout(&self, vertex_array: VertexArrayId) -> Option<Vec<VertexAttribute>> {
        self.state.borrow().vertex_arrays.get(&vertex_array).cloned()
    }

    pub fn program_uniforms(&self, program: ProgramId) -> Option<Vec<UniformBinding>> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.uniforms.clone())
    }

    /// Last value written to the uniform at `location`.
    pub fn uniform_value(&self, program: ProgramId, location: u32) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.values.get(&location).cloned())
    }

    /// Byte length of the image uploaded for `texture`.
    pub fn texture_size(&self, texture: TextureId) -> Option<usize> {
        self.state.borrow().textures.get(&texture).map(|(_, len)| *len)
    }

    pub fn clears(&self) -> Vec<[f32; 4]> {
        self.state.borrow().clears.clone()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.borrow().draws.clone()
    }

    /// Drains the recorded clears and draws.
    pub fn reset_frame_log(&self) {
        let mut state = self.state.borrow_mut();
        state.clears.clear();
        state.draws.clear();
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_buffer(&self, kind: BufferKind) -> BufferId {
        let id = self.ids.issue();
        self.state.borrow_mut().buffers.insert(
            id,
            HeadlessBuffer {
                kind,
                data: Vec::new(),
                hint: None,
            },
        );
        id
    }

    fn upload_buffer(&self, buffer: BufferId, data: &[u8], hint: UploadHint) {
        match self.state.borrow_mut().buffers.get_mut(&buffer) {
            Some(b) => {
                b.data.clear();
                b.data.extend_from_slice(data);
                b.hint = Some(hint);
            }
            None => log::warn!("headless: upload to unknown buffer {buffer:?}"),
        }
    }

    fn read_buffer(&self, buffer: BufferId) -> Result<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&buffer)
            .map(|b| b.data.clone())
            .ok_or_else(|| anyhow!("unknown buffer {buffer:?}"))
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.state.borrow_mut().buffers.remove(&buffer);
    }

    fn create_vertex_array(&self, attributes: &[VertexAttribute]) -> VertexArrayId {
        let id = self.ids.issue();
        self.state
            .borrow_mut()
            .vertex_arrays
            .insert(id, attributes.to_vec());
        id
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        self.state.borrow_mut().vertex_arrays.remove(&vertex_array);
    }

    fn create_program(&self, desc: &ProgramDesc<'_>) -> ProgramId {
        let id = self.ids.issue();
        self.state.borrow_mut().programs.insert(
            id,
            HeadlessProgram {
                uniforms: desc.uniforms.to_vec(),
                values: HashMap::new(),
            },
        );
        id
    }

    fn delete_program(&self, program: ProgramId) {
        self.state.borrow_mut().programs.remove(&program);
    }

    fn set_uniform(&self, program: ProgramId, location: u32, data: &[u8]) {
        match self.state.borrow_mut().programs.get_mut(&program) {
            Some(p) => {
                p.values.insert(location, data.to_vec());
            }
            None => log::warn!("headless: uniform write to unknown program {program:?}"),
        }
    }

    fn create_texture(&self, desc: &TextureDesc, data: &[u8]) -> TextureId {
        let id = self.ids.issue();
        self.state
            .borrow_mut()
            .textures
            .insert(id, (*desc, data.len()));
        id
    }

    fn delete_texture(&self, texture: TextureId) {
        self.state.borrow_mut().textures.remove(&texture);
    }

    fn clear(&self, color: [f32; 4]) {
        self.state.borrow_mut().clears.push(color);
    }

    fn draw_indexed(&self, call: &DrawCall) {
        let mut state = self.state.borrow_mut();

        if !state.programs.contains_key(&call.program)
            || !state.vertex_arrays.contains_key(&call.vertex_array)
        {
            log::warn!("headless: draw with unknown program or vertex array: {call:?}");
            return;
        }

        let Some(index_buffer) = state.buffers.get(&call.index_buffer) else {
            log::warn!("headless: draw with unknown index buffer {:?}", call.index_buffer);
            return;
        };

        let indices: Vec<u32> = index_buffer
            .data
            .chunks_exact(4)
            .take(call.index_count as usize)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        state.draws.push(DrawRecord {
            call: *call,
            indices,
        });
    }
}
