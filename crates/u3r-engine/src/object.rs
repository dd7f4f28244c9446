use std::collections::BTreeMap;

use anyhow::{Result, ensure};

use crate::device::{
    BufferId, BufferKind, Context, UploadHint, VertexArrayId, VertexAttribute,
};
use crate::math::{Array, Shared};
use crate::pass::{UniformLocation, VertexInput};
use crate::texture::Texture;

/// Largest per-vertex component count of one attribute slot.
pub const MAX_SLOT_STRIDE: u32 = 4;

#[derive(Debug)]
struct InputSlot {
    stride: u32,
    data: Array,
    buffer: BufferId,
}

#[derive(Debug, Default)]
struct UniformSlot {
    data: Array,
    buffer: Option<BufferId>,
}

/// Device handles allocated by [`RenderObject::set_input_structure`].
#[derive(Debug)]
struct Geometry {
    vertex_array: VertexArrayId,
    index_buffer: BufferId,
}

/// CPU mirrors and device handles for one drawable mesh.
///
/// Typical lifecycle:
/// 1. [`set_input_structure`](Self::set_input_structure) declares the attribute slots
/// 2. [`input_mut`](Self::input_mut) / [`indices_mut`](Self::indices_mut) fill geometry
/// 3. [`load_input`](Self::load_input) uploads it; repeat 2-3 after edits
///
/// Slot *i* feeds vertex input `@location(i)`. Every slot has its own tightly
/// packed buffer (no interleaving). Indices form a triangle list and are not
/// range-checked.
///
/// The object exclusively owns its buffers and vertex array and releases them
/// on drop. Textures bound with [`set_sampler`](Self::set_sampler) are shared
/// and outlive the object as long as another holder keeps them.
#[derive(Debug)]
pub struct RenderObject {
    ctx: Context,
    inputs: Vec<InputSlot>,
    indices: Vec<u32>,
    geometry: Option<Geometry>,
    uploaded_indices: u32,
    uniforms: BTreeMap<UniformLocation, UniformSlot>,
    samplers: BTreeMap<u32, Shared<Texture>>,
}

impl RenderObject {
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            inputs: Vec::new(),
            indices: Vec::new(),
            geometry: None,
            uploaded_indices: 0,
            uniforms: BTreeMap::new(),
            samplers: BTreeMap::new(),
        }
    }

    /// Allocates one buffer per slot, the vertex array and the index buffer.
    ///
    /// `sizes[i]` is the component count of slot *i* (1..=4). Reconfiguring
    /// releases the previous handles and clears all CPU-side geometry.
    pub fn set_input_structure(&mut self, sizes: &[u32]) -> Result<()> {
        for (slot, &stride) in sizes.iter().enumerate() {
            ensure!(
                (1..=MAX_SLOT_STRIDE).contains(&stride),
                "slot {slot} has stride {stride}; expected 1..={MAX_SLOT_STRIDE}"
            );
        }

        if self.geometry.is_some() {
            log::debug!("render object reconfigured; releasing previous geometry");
        }
        self.release_geometry();

        let backend = self.ctx.backend();

        self.inputs = sizes
            .iter()
            .map(|&stride| InputSlot {
                stride,
                data: Array::new(),
                buffer: backend.create_buffer(BufferKind::Vertex),
            })
            .collect();

        let attributes: Vec<VertexAttribute> = self
            .inputs
            .iter()
            .enumerate()
            .map(|(location, slot)| VertexAttribute {
                location: location as u32,
                components: slot.stride,
                buffer: slot.buffer,
            })
            .collect();

        self.geometry = Some(Geometry {
            vertex_array: backend.create_vertex_array(&attributes),
            index_buffer: backend.create_buffer(BufferKind::Index),
        });

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn slot_count(&self) -> usize {
        self.inputs.len()
    }

    /// Components per vertex of `slot`.
    ///
    /// # Panics
    /// If `slot` is not below [`slot_count`](Self::slot_count).
    pub fn stride(&self, slot: usize) -> u32 {
        self.inputs[slot].stride
    }

    /// CPU-side data of `slot`.
    ///
    /// # Panics
    /// If `slot` is not below [`slot_count`](Self::slot_count).
    pub fn input_mut(&mut self, slot: usize) -> &mut Array {
        &mut self.inputs[slot].data
    }

    /// # Panics
    /// If `slot` is not below [`slot_count`](Self::slot_count).
    pub fn input(&self, slot: usize) -> &Array {
        &self.inputs[slot].data
    }

    pub fn indices_mut(&mut self) -> &mut Vec<u32> {
        &mut self.indices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Declares a uniform value keyed by `location`. Existing values are kept.
    pub fn add_uniform(&mut self, location: UniformLocation) {
        self.uniforms.entry(location).or_default();
    }

    /// CPU-side value of a declared uniform.
    pub fn uniform_mut(&mut self, location: UniformLocation) -> Option<&mut Array> {
        self.uniforms.get_mut(&location).map(|u| &mut u.data)
    }

    pub fn uniform(&self, location: UniformLocation) -> Option<&Array> {
        self.uniforms.get(&location).map(|u| &u.data)
    }

    pub fn uniform_locations(&self) -> impl Iterator<Item = UniformLocation> + '_ {
        self.uniforms.keys().copied()
    }

    /// Binds `texture` to `unit`, replacing any texture already there.
    pub fn set_sampler(&mut self, unit: u32, texture: Shared<Texture>) {
        self.samplers.insert(unit, texture);
    }

    pub fn sampler(&self, unit: u32) -> Option<&Shared<Texture>> {
        self.samplers.get(&unit)
    }

    /// Uploads every slot and the index list, replacing previous contents.
    pub fn load_input(&mut self) -> Result<()> {
        let Some(geometry) = self.geometry.as_ref() else {
            anyhow::bail!("load_input called before set_input_structure");
        };

        self.check_layout();

        let backend = self.ctx.backend();
        for slot in &self.inputs {
            backend.upload_buffer(
                slot.buffer,
                bytemuck::cast_slice(&slot.data),
                UploadHint::Static,
            );
        }
        backend.upload_buffer(
            geometry.index_buffer,
            bytemuck::cast_slice(&self.indices),
            UploadHint::Static,
        );
        self.uploaded_indices = self.indices.len() as u32;

        log::debug!(
            "render object uploaded: {} slot(s), {} index(es)",
            self.inputs.len(),
            self.uploaded_indices
        );
        Ok(())
    }

    /// Uploads each declared uniform into its own device uniform buffer.
    ///
    /// The buffers are owned by the object; [`Instance::render`](crate::Instance::render)
    /// does not bind them.
    pub fn load_uniform(&mut self) {
        let backend = self.ctx.backend();
        for slot in self.uniforms.values_mut() {
            let buffer = *slot
                .buffer
                .get_or_insert_with(|| backend.create_buffer(BufferKind::Uniform));
            backend.upload_buffer(buffer, bytemuck::cast_slice(&slot.data), UploadHint::Static);
        }
    }

    /// Number of indices drawn per frame: the length at the last [`load_input`](Self::load_input).
    pub fn index_count(&self) -> u32 {
        self.uploaded_indices
    }

    pub(crate) fn vertex_array(&self) -> Option<VertexArrayId> {
        self.geometry.as_ref().map(|g| g.vertex_array)
    }

    pub(crate) fn index_buffer(&self) -> Option<BufferId> {
        self.geometry.as_ref().map(|g| g.index_buffer)
    }

    /// Whether every vertex input of a program is fed by a slot of matching stride.
    pub(crate) fn satisfies(&self, inputs: &[VertexInput]) -> bool {
        inputs.iter().all(|input| {
            self.inputs
                .get(input.location as usize)
                .is_some_and(|slot| input.components == Some(slot.stride))
        })
    }

    fn check_layout(&self) {
        let mut vertex_count = None;
        for (i, slot) in self.inputs.iter().enumerate() {
            let len = slot.data.len();
            if len % slot.stride as usize != 0 {
                log::warn!(
                    "slot {i}: {len} values is not a multiple of stride {}",
                    slot.stride
                );
            }

            let count = len / slot.stride as usize;
            match vertex_count {
                None => vertex_count = Some(count),
                Some(n) if n != count => {
                    log::warn!("slot {i} holds {count} vertices, slot 0 holds {n}");
                }
                Some(_) => {}
            }
        }
    }

    fn release_geometry(&mut self) {
        let backend = self.ctx.backend();
        for slot in self.inputs.drain(..) {
            backend.delete_buffer(slot.buffer);
        }
        if let Some(geometry) = self.geometry.take() {
            backend.delete_vertex_array(geometry.vertex_array);
            backend.delete_buffer(geometry.index_buffer);
        }
        self.indices.clear();
        self.uploaded_indices = 0;
    }

    #[cfg(test)]
    pub(crate) fn slot_buffer(&self, slot: usize) -> BufferId {
        self.inputs[slot].buffer
    }
}

impl Drop for RenderObject {
    fn drop(&mut self) {
        self.release_geometry();
        let backend = self.ctx.backend();
        for slot in self.uniforms.values() {
            if let Some(buffer) = slot.buffer {
                backend.delete_buffer(buffer);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::device::{Backend, BufferKind, HeadlessBackend};
    use crate::math::shared;
    use crate::texture::{ColorMode, DataType};

    pub(crate) const CUBE_VERTICES: [f32; 24] = [
        0.5, 0.5, -0.5, //
        -0.5, 0.5, -0.5, //
        -0.5, 0.5, 0.5, //
        0.5, 0.5, 0.5, //
        0.5, -0.5, -0.5, //
        -0.5, -0.5, -0.5, //
        -0.5, -0.5, 0.5, //
        0.5, -0.5, 0.5,
    ];

    pub(crate) const CUBE_INDICES: [u32; 24] = [
        0, 1, 4, 1, 4, 5, 1, 2, 5, 2, 5, 6, 2, 3, 6, 3, 6, 7, 3, 4, 7, 4, 0, 3,
    ];

    pub(crate) fn headless() -> (Rc<HeadlessBackend>, Context) {
        let backend = Rc::new(HeadlessBackend::new());
        let ctx = Context::from_shared(backend.clone());
        (backend, ctx)
    }

    pub(crate) fn cube(ctx: &Context) -> RenderObject {
        let mut obj = RenderObject::new(ctx);
        obj.set_input_structure(&[3]).unwrap();
        obj.input_mut(0).extend_from_slice(&CUBE_VERTICES);
        obj.indices_mut().extend_from_slice(&CUBE_INDICES);
        obj.load_input().unwrap();
        obj
    }

    #[test]
    fn one_buffer_per_slot_with_declared_strides() {
        for sizes in [&[3][..], &[3, 2], &[4, 3, 2, 1]] {
            let (backend, ctx) = headless();
            let mut obj = RenderObject::new(&ctx);
            obj.set_input_structure(sizes).unwrap();

            assert_eq!(obj.slot_count(), sizes.len());
            // slot buffers + index buffer
            assert_eq!(backend.live_buffers(), sizes.len() + 1);
            assert_eq!(backend.live_vertex_arrays(), 1);

            let layout = backend
                .vertex_array_layout(obj.vertex_array().unwrap())
                .unwrap();
            assert_eq!(layout.len(), sizes.len());
            for (i, attr) in layout.iter().enumerate() {
                assert_eq!(attr.location, i as u32);
                assert_eq!(attr.components, sizes[i]);
                assert_eq!(obj.stride(i), sizes[i]);
                assert_eq!(attr.buffer, obj.slot_buffer(i));
                assert_eq!(backend.buffer_kind(attr.buffer), Some(BufferKind::Vertex));
            }
        }
    }

    #[test]
    fn invalid_stride_is_rejected() {
        let (backend, ctx) = headless();
        let mut obj = RenderObject::new(&ctx);
        assert!(obj.set_input_structure(&[3, 0]).is_err());
        assert!(obj.set_input_structure(&[5]).is_err());
        assert!(!obj.is_configured());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn reconfiguring_releases_previous_handles() {
        let (backend, ctx) = headless();
        let mut obj = RenderObject::new(&ctx);
        obj.set_input_structure(&[3, 3, 2]).unwrap();
        obj.set_input_structure(&[3]).unwrap();

        assert_eq!(backend.live_buffers(), 2);
        assert_eq!(backend.live_vertex_arrays(), 1);
        assert_eq!(obj.slot_count(), 1);
    }

    #[test]
    fn vertex_data_round_trips_bit_exact() {
        let (backend, ctx) = headless();
        let mut obj = RenderObject::new(&ctx);
        obj.set_input_structure(&[3, 2]).unwrap();

        let positions = [0.1_f32, -0.0, f32::MAX, 1.0e-38, f32::MIN_POSITIVE, -7.25];
        let uvs = [0.0_f32, 1.0, 0.333_333_34, 0.666_666_7];
        obj.input_mut(0).extend_from_slice(&positions);
        obj.input_mut(1).extend_from_slice(&uvs);
        obj.load_input().unwrap();

        for (slot, expected) in [(0, &positions[..]), (1, &uvs[..])] {
            let bytes = backend.read_buffer(obj.slot_buffer(slot)).unwrap();
            let read_bits: Vec<u32> = bytes
                .chunks_exact(4)
                .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            let want_bits: Vec<u32> = expected.iter().map(|f| f.to_bits()).collect();
            assert_eq!(read_bits, want_bits);
            assert_eq!(backend.buffer_hint(obj.slot_buffer(slot)), Some(UploadHint::Static));
        }
    }

    #[test]
    fn indices_round_trip_in_order() {
        let (backend, ctx) = headless();
        let obj = cube(&ctx);

        let bytes = backend.read_buffer(obj.index_buffer().unwrap()).unwrap();
        assert_eq!(bytes, bytemuck::cast_slice::<u32, u8>(&CUBE_INDICES));
        assert_eq!(obj.index_count(), 24);
    }

    #[test]
    fn reload_replaces_device_contents() {
        let (backend, ctx) = headless();
        let mut obj = cube(&ctx);

        obj.input_mut(0).truncate(9);
        obj.indices_mut().truncate(3);
        obj.load_input().unwrap();

        let bytes = backend.read_buffer(obj.slot_buffer(0)).unwrap();
        assert_eq!(bytes.len(), 9 * 4);
        assert_eq!(obj.index_count(), 3);
    }

    #[test]
    fn index_count_tracks_last_upload() {
        let (_, ctx) = headless();
        let mut obj = cube(&ctx);
        obj.indices_mut().extend_from_slice(&[0, 1, 2]);
        assert_eq!(obj.index_count(), 24);
    }

    #[test]
    fn load_before_configure_fails() {
        let (_, ctx) = headless();
        let mut obj = RenderObject::new(&ctx);
        assert!(obj.load_input().is_err());
    }

    #[test]
    fn uniforms_are_declared_then_uploaded() {
        let (backend, ctx) = headless();
        let mut obj = RenderObject::new(&ctx);
        let loc = UniformLocation::new(2);

        assert!(obj.uniform_mut(loc).is_none());
        obj.add_uniform(loc);
        obj.uniform_mut(loc).unwrap().extend_from_slice(&[1.0, 0.0, 0.0, 1.0]);
        obj.add_uniform(loc);
        assert_eq!(obj.uniform(loc).unwrap().len(), 4);

        obj.load_uniform();
        assert_eq!(backend.live_buffers(), 1);
        obj.load_uniform();
        assert_eq!(backend.live_buffers(), 1);

        drop(obj);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn set_sampler_replaces_unit() {
        let (_, ctx) = headless();
        let mut obj = RenderObject::new(&ctx);
        let a = shared(Texture::new(&ctx));
        let b = shared(Texture::new(&ctx));

        obj.set_sampler(0, a.clone());
        obj.set_sampler(0, b.clone());
        assert!(Rc::ptr_eq(obj.sampler(0).unwrap(), &b));
        assert_eq!(Rc::strong_count(&a), 1);
    }

    #[test]
    fn shared_texture_survives_one_holder() {
        let (backend, ctx) = headless();
        let tex = shared(Texture::new(&ctx));
        tex.borrow_mut().set_data(2, 2, ColorMode::Rgba, DataType::U8);
        tex.borrow_mut().upload();

        let mut first = RenderObject::new(&ctx);
        let mut second = RenderObject::new(&ctx);
        first.set_sampler(0, tex.clone());
        second.set_sampler(1, tex.clone());
        drop(tex);

        drop(first);
        assert_eq!(backend.live_textures(), 1);
        let seen = second.sampler(1).unwrap().borrow();
        assert!(seen.is_uploaded());
        assert_eq!(seen.data().len(), 16);
        drop(seen);

        drop(second);
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn drop_releases_all_handles() {
        let (backend, ctx) = headless();
        {
            let _obj = cube(&ctx);
            assert_eq!(backend.live_buffers(), 2);
        }
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_vertex_arrays(), 0);
    }
}
