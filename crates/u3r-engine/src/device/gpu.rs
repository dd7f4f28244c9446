use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::mpsc;

use anyhow::{Context as _, Result, anyhow};
use wgpu::util::DeviceExt;

use super::handle::HandleCounter;
use super::{
    Backend, BufferId, BufferKind, DrawCall, ProgramDesc, ProgramId, TextureDesc, TextureId,
    UploadHint, VertexArrayId, VertexAttribute,
};
use crate::texture::{ColorMode, DataType, FilterMode};

/// Configuration for [`WgpuBackend`].
#[derive(Debug, Clone)]
pub struct WgpuBackendConfig {
    /// Format of the color targets passed to [`WgpuBackend::bind_target`].
    pub color_format: wgpu::TextureFormat,

    /// Format of the depth buffer owned by the backend.
    pub depth_format: wgpu::TextureFormat,

    /// Prefix for wgpu object labels.
    pub label: String,
}

impl Default for WgpuBackendConfig {
    fn default() -> Self {
        Self {
            color_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            depth_format: wgpu::TextureFormat::Depth32Float,
            label: "u3r".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    program: ProgramId,
    vertex_array: VertexArrayId,
    depth_test: bool,
}

struct GpuBuffer {
    kind: BufferKind,
    /// `None` until the first non-empty upload.
    buffer: Option<wgpu::Buffer>,
    len: u64,
}

struct GpuProgram {
    vertex: wgpu::ShaderModule,
    vertex_entry: String,
    fragment: wgpu::ShaderModule,
    fragment_entry: String,
    layout: wgpu::PipelineLayout,
    bind_group: Option<wgpu::BindGroup>,
    uniforms: HashMap<u32, wgpu::Buffer>,
}

#[allow(dead_code)]
struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

struct DepthTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

#[derive(Default)]
struct State {
    buffers: HashMap<BufferId, GpuBuffer>,
    vertex_arrays: HashMap<VertexArrayId, Vec<VertexAttribute>>,
    programs: HashMap<ProgramId, GpuProgram>,
    textures: HashMap<TextureId, Option<GpuTexture>>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    target: Option<wgpu::TextureView>,
    depth: Option<DepthTarget>,
}

/// Backend on a wgpu device and queue.
///
/// Every `clear` and `draw_indexed` records its own render pass and is
/// submitted immediately, so device work happens in call order. Render
/// pipelines are built on first use per (program, vertex array, depth test)
/// and cached until either handle is deleted.
///
/// A color target must be bound with [`bind_target`](Self::bind_target)
/// before clearing or drawing.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: WgpuBackendConfig,
    ids: HandleCounter,
    state: RefCell<State>,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, config: WgpuBackendConfig) -> Self {
        log::debug!(
            "wgpu backend: color {:?}, depth {:?}",
            config.color_format,
            config.depth_format
        );
        Self {
            device,
            queue,
            config,
            ids: HandleCounter::default(),
            state: RefCell::new(State::default()),
        }
    }

    pub fn config(&self) -> &WgpuBackendConfig {
        &self.config
    }

    /// Binds the color target for subsequent clears and draws.
    ///
    /// The depth buffer is (re)created when the size changes.
    pub fn bind_target(&self, view: &wgpu::TextureView, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        let mut state = self.state.borrow_mut();

        let depth = match state.depth.take() {
            Some(d) if d.width == width && d.height == height => d,
            _ => self.create_depth_target(width, height),
        };

        state.depth = Some(depth);
        state.target = Some(view.clone());
    }

    /// Releases the bound color target. Call before presenting it.
    pub fn unbind_target(&self) {
        self.state.borrow_mut().target = None;
    }

    fn label(&self, what: &str) -> String {
        format!("{} {what}", self.config.label)
    }

    fn create_depth_target(&self, width: u32, height: u32) -> DepthTarget {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.label("depth")),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.config.depth_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        DepthTarget {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            width,
            height,
        }
    }

    fn build_pipeline(
        &self,
        program: &GpuProgram,
        attributes: &[VertexAttribute],
        depth_test: bool,
    ) -> wgpu::RenderPipeline {
        let attrs: Vec<[wgpu::VertexAttribute; 1]> = attributes
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: float_format(a.components),
                    offset: 0,
                    shader_location: a.location,
                }]
            })
            .collect();

        // One buffer per attribute, tightly packed.
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
            .iter()
            .zip(&attrs)
            .map(|(a, attr)| wgpu::VertexBufferLayout {
                array_stride: u64::from(a.components) * std::mem::size_of::<f32>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attr,
            })
            .collect();

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&self.label("pipeline")),
                layout: Some(&program.layout),

                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(&program.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(&program.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: self.config.depth_format,
                    depth_write_enabled: depth_test,
                    depth_compare: if depth_test {
                        wgpu::CompareFunction::Less
                    } else {
                        wgpu::CompareFunction::Always
                    },
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            })
    }
}

impl Backend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_buffer(&self, kind: BufferKind) -> BufferId {
        let id = self.ids.issue();
        self.state.borrow_mut().buffers.insert(
            id,
            GpuBuffer {
                kind,
                buffer: None,
                len: 0,
            },
        );
        id
    }

    fn upload_buffer(&self, buffer: BufferId, data: &[u8], hint: UploadHint) {
        let mut state = self.state.borrow_mut();
        let Some(slot) = state.buffers.get_mut(&buffer) else {
            log::warn!("wgpu: upload to unknown buffer {buffer:?}");
            return;
        };

        // Dynamic uploads of an unchanged size reuse the existing allocation.
        if hint == UploadHint::Dynamic && slot.len == data.len() as u64 {
            if let Some(existing) = slot.buffer.as_ref() {
                self.queue.write_buffer(existing, 0, data);
                return;
            }
        }

        let usage = match slot.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST;

        slot.len = data.len() as u64;
        slot.buffer = (!data.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&self.label("buffer")),
                    contents: data,
                    usage,
                })
        });
    }

    fn read_buffer(&self, buffer: BufferId) -> Result<Vec<u8>> {
        let state = self.state.borrow();
        let slot = state
            .buffers
            .get(&buffer)
            .ok_or_else(|| anyhow!("unknown buffer {buffer:?}"))?;
        let Some(source) = slot.buffer.as_ref() else {
            return Ok(Vec::new());
        };

        let size = slot.len.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&self.label("readback buffer")),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&self.label("readback encoder")),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });

        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed during readback")?;
        rx.recv()
            .context("readback map callback was dropped")?
            .context("failed to map readback buffer")?;

        let bytes = {
            let mapped = slice.get_mapped_range();
            mapped[..slot.len as usize].to_vec()
        };
        staging.unmap();

        Ok(bytes)
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
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array);
        state.pipelines.retain(|k, _| k.vertex_array != vertex_array);
    }

    fn create_program(&self, desc: &ProgramDesc<'_>) -> ProgramId {
        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&self.label("vertex shader")),
                source: wgpu::ShaderSource::Wgsl(desc.vertex_source.into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&self.label("fragment shader")),
                source: wgpu::ShaderSource::Wgsl(desc.fragment_source.into()),
            });

        let bind_group_layout = (!desc.uniforms.is_empty()).then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = desc
                .uniforms
                .iter()
                .map(|u| wgpu::BindGroupLayoutEntry {
                    binding: u.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect();

            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&self.label("uniform bgl")),
                    entries: &entries,
                })
        });

        let uniforms: HashMap<u32, wgpu::Buffer> = desc
            .uniforms
            .iter()
            .map(|u| {
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&self.label(&format!("uniform {}", u.name))),
                    size: u64::from(u.size.max(1).next_multiple_of(16)),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (u.binding, buffer)
            })
            .collect();

        let bind_group = bind_group_layout.as_ref().map(|bgl| {
            let entries: Vec<wgpu::BindGroupEntry<'_>> = uniforms
                .iter()
                .map(|(binding, buffer)| wgpu::BindGroupEntry {
                    binding: *binding,
                    resource: buffer.as_entire_binding(),
                })
                .collect();

            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&self.label("uniform bind group")),
                layout: bgl,
                entries: &entries,
            })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&self.label("pipeline layout")),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

        let id = self.ids.issue();
        self.state.borrow_mut().programs.insert(
            id,
            GpuProgram {
                vertex,
                vertex_entry: desc.vertex_entry.to_string(),
                fragment,
                fragment_entry: desc.fragment_entry.to_string(),
                layout,
                bind_group,
                uniforms,
            },
        );
        id
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.pipelines.retain(|k, _| k.program != program);
    }

    fn set_uniform(&self, program: ProgramId, location: u32, data: &[u8]) {
        let state = self.state.borrow();
        let Some(buffer) = state
            .programs
            .get(&program)
            .and_then(|p| p.uniforms.get(&location))
        else {
            log::warn!("wgpu: no uniform at location {location} in {program:?}");
            return;
        };

        let len = data.len().min(buffer.size() as usize) & !3;
        self.queue.write_buffer(buffer, 0, &data[..len]);
    }

    fn create_texture(&self, desc: &TextureDesc, data: &[u8]) -> TextureId {
        let id = self.ids.issue();
        let texture = self.upload_texture(desc, data);
        self.state.borrow_mut().textures.insert(id, texture);
        id
    }

    fn delete_texture(&self, texture: TextureId) {
        self.state.borrow_mut().textures.remove(&texture);
    }

    fn clear(&self, color: [f32; 4]) {
        let state = self.state.borrow();
        let (Some(target), Some(depth)) = (state.target.as_ref(), state.depth.as_ref()) else {
            log::warn!("wgpu: clear without a bound target");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&self.label("clear encoder")),
            });

        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&self.label("clear")),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(color[0]),
                            g: f64::from(color[1]),
                            b: f64::from(color[2]),
                            a: f64::from(color[3]),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_indexed(&self, call: &DrawCall) {
        let key = PipelineKey {
            program: call.program,
            vertex_array: call.vertex_array,
            depth_test: call.depth_test,
        };

        let mut state = self.state.borrow_mut();

        if !state.pipelines.contains_key(&key) {
            let (Some(program), Some(attributes)) = (
                state.programs.get(&call.program),
                state.vertex_arrays.get(&call.vertex_array),
            ) else {
                log::warn!("wgpu: draw with unknown program or vertex array: {call:?}");
                return;
            };
            let pipeline = self.build_pipeline(program, attributes, call.depth_test);
            state.pipelines.insert(key, pipeline);
        }

        let state = &*state;
        let (Some(target), Some(depth)) = (state.target.as_ref(), state.depth.as_ref()) else {
            log::warn!("wgpu: draw without a bound target");
            return;
        };
        let (Some(pipeline), Some(program), Some(attributes)) = (
            state.pipelines.get(&key),
            state.programs.get(&call.program),
            state.vertex_arrays.get(&call.vertex_array),
        ) else {
            return;
        };

        let mut vertex_buffers = Vec::with_capacity(attributes.len());
        for attr in attributes {
            let Some(buffer) = state.buffers.get(&attr.buffer).and_then(|b| b.buffer.as_ref())
            else {
                log::warn!("wgpu: attribute {} has no uploaded data", attr.location);
                return;
            };
            vertex_buffers.push(buffer);
        }

        let Some(index_slot) = state.buffers.get(&call.index_buffer) else {
            log::warn!("wgpu: draw with unknown index buffer {:?}", call.index_buffer);
            return;
        };
        let Some(index_buffer) = index_slot.buffer.as_ref() else {
            return;
        };
        let available = (index_slot.len / 4) as u32;
        if call.index_count > available {
            log::warn!(
                "wgpu: draw requests {} indices but only {available} are uploaded",
                call.index_count
            );
            return;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&self.label("draw encoder")),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&self.label("draw")),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            if let Some(bind_group) = program.bind_group.as_ref() {
                rpass.set_bind_group(0, bind_group, &[]);
            }
            for (slot, buffer) in vertex_buffers.iter().enumerate() {
                rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..call.index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl WgpuBackend {
    fn upload_texture(&self, desc: &TextureDesc, data: &[u8]) -> Option<GpuTexture> {
        let TextureDesc {
            width,
            height,
            color_mode,
            data_type,
            filter,
        } = *desc;

        if width == 0 || height == 0 {
            log::warn!("wgpu: skipping zero-sized texture {width}x{height}");
            return None;
        }

        let format = match data_type {
            DataType::U8 => wgpu::TextureFormat::Rgba8Unorm,
            DataType::U16 => wgpu::TextureFormat::Rgba16Unorm,
        };
        if !format
            .required_features()
            .difference(self.device.features())
            .is_empty()
        {
            log::warn!("wgpu: device does not support {format:?}; texture not uploaded");
            return None;
        }

        let expected = desc_byte_len(desc);
        if data.len() < expected {
            log::warn!(
                "wgpu: texture data is {} bytes, {expected} required; not uploaded",
                data.len()
            );
            return None;
        }

        let pixels = expand_to_rgba(&data[..expected], color_mode, data_type);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.label("texture")),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4 * data_type.bytes_per_component()),
                rows_per_image: Some(height),
            },
            size,
        );

        let filter = match filter {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        };
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&self.label("sampler")),
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        Some(GpuTexture {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            sampler,
        })
    }
}

fn float_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn desc_byte_len(desc: &TextureDesc) -> usize {
    desc.width as usize
        * desc.height as usize
        * crate::texture::bytes_per_pixel(desc.color_mode, desc.data_type)
}

/// Widens RGB pixels to RGBA with an opaque alpha channel.
fn expand_to_rgba(data: &[u8], color_mode: ColorMode, data_type: DataType) -> Cow<'_, [u8]> {
    match color_mode {
        ColorMode::Rgba => Cow::Borrowed(data),
        ColorMode::Rgb => {
            let bpc = data_type.bytes_per_component() as usize;
            let opaque = [0xFF_u8; 2];
            let mut out = Vec::with_capacity(data.len() / 3 * 4);
            for px in data.chunks_exact(3 * bpc) {
                out.extend_from_slice(px);
                out.extend_from_slice(&opaque[..bpc]);
            }
            Cow::Owned(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_format_matches_component_count() {
        assert_eq!(float_format(1), wgpu::VertexFormat::Float32);
        assert_eq!(float_format(3), wgpu::VertexFormat::Float32x3);
        assert_eq!(float_format(4), wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn rgb8_expands_with_opaque_alpha() {
        let rgb = [1, 2, 3, 4, 5, 6];
        let rgba = expand_to_rgba(&rgb, ColorMode::Rgb, DataType::U8);
        assert_eq!(&*rgba, &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn rgb16_expands_with_two_byte_alpha() {
        let rgb = [1, 1, 2, 2, 3, 3];
        let rgba = expand_to_rgba(&rgb, ColorMode::Rgb, DataType::U16);
        assert_eq!(&*rgba, &[1, 1, 2, 2, 3, 3, 255, 255]);
    }

    #[test]
    fn rgba_is_passed_through() {
        let rgba = [9, 8, 7, 6];
        assert!(matches!(
            expand_to_rgba(&rgba, ColorMode::Rgba, DataType::U8),
            Cow::Borrowed(_)
        ));
    }
}
