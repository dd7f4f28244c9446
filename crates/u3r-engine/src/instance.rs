use crate::camera::Camera;
use crate::device::{Context, DrawCall};
use crate::light::Light;
use crate::math::Shared;
use crate::object::RenderObject;
use crate::pass::Pass;

/// Uniform receiving the camera's view transform (column-major `mat4x4<f32>`).
pub const VIEW_MATRIX_UNIFORM: &str = "u_view_matrix";
/// Uniform receiving the camera's eye position (`vec3<f32>`).
pub const VIEW_POSITION_UNIFORM: &str = "u_view_position";

const CLEAR_COLOR: [f32; 4] = [0.0; 4];

/// Executes frames: one [`clear`](Self::clear) and one [`render`](Self::render)
/// per pass, against whatever target the backend currently has bound.
#[derive(Debug)]
pub struct Instance {
    ctx: Context,
    camera: Option<Shared<Camera>>,
    light: Option<Shared<Light>>,
    light_enabled: bool,
}

impl Instance {
    pub fn new(ctx: &Context) -> Self {
        log::info!("u3r instance created on {} backend", ctx.backend_name());
        Self {
            ctx: ctx.clone(),
            camera: None,
            light: None,
            light_enabled: false,
        }
    }

    pub fn set_camera(&mut self, camera: Shared<Camera>) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Shared<Camera>> {
        self.camera.as_ref()
    }

    pub fn set_light_source(&mut self, light: Shared<Light>) {
        self.light = Some(light);
    }

    pub fn light_source(&self) -> Option<&Shared<Light>> {
        self.light.as_ref()
    }

    /// Stored only; rendering is unaffected.
    pub fn enable_light(&mut self, enabled: bool) {
        self.light_enabled = enabled;
    }

    pub fn is_light_enabled(&self) -> bool {
        self.light_enabled
    }

    /// Clears color and depth to transparent black.
    pub fn clear(&self) {
        self.ctx.backend().clear(CLEAR_COLOR);
    }

    /// Draws `objects` in order with `pass`, depth-tested.
    pub fn render<'a>(&self, pass: &Pass, objects: impl IntoIterator<Item = &'a RenderObject>) {
        let Some(program) = pass.program() else {
            log::warn!("render skipped: pass is not linked");
            return;
        };

        let backend = self.ctx.backend();

        match &self.camera {
            Some(camera) => {
                let camera = camera.borrow();
                if let Some(loc) = pass.get_index(VIEW_MATRIX_UNIFORM).index() {
                    let view = camera.view_matrix().to_cols_array();
                    backend.set_uniform(program, loc, bytemuck::cast_slice(&view));
                }
                if let Some(loc) = pass.get_index(VIEW_POSITION_UNIFORM).index() {
                    let eye = camera.position().to_array();
                    backend.set_uniform(program, loc, bytemuck::cast_slice(&eye));
                }
            }
            None => log::warn!("render without a camera; view uniforms left unset"),
        }

        for (i, object) in objects.into_iter().enumerate() {
            let (Some(vertex_array), Some(index_buffer)) =
                (object.vertex_array(), object.index_buffer())
            else {
                log::warn!("object {i} skipped: input structure not set");
                continue;
            };

            if object.index_count() == 0 {
                log::warn!("object {i} skipped: no indices loaded");
                continue;
            }

            if !object.satisfies(pass.vertex_inputs()) {
                log::warn!("object {i} skipped: slots do not match the pass vertex inputs");
                continue;
            }

            backend.draw_indexed(&DrawCall {
                program,
                vertex_array,
                index_buffer,
                index_count: object.index_count(),
                depth_test: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::math::{Vector3, shared};
    use crate::object::tests::{CUBE_INDICES, cube, headless};
    use crate::pass::tests::{CUBE_FS, CUBE_VS};

    fn linked_pass(ctx: &Context) -> Pass {
        let mut pass = Pass::new(ctx);
        assert!(pass.compile_shader(CUBE_VS, CUBE_FS).is_ok());
        pass
    }

    fn orbit_camera(t: f32) -> Shared<Camera> {
        let camera = shared(Camera::new());
        camera
            .borrow_mut()
            .look_at(Vector3::new(t.cos(), 1.0, t.sin()), Vector3::ZERO);
        camera
    }

    #[test]
    fn cube_frame_draws_all_indices() {
        let (backend, ctx) = headless();
        let pass = linked_pass(&ctx);
        let obj = cube(&ctx);

        let mut instance = Instance::new(&ctx);
        instance.set_camera(orbit_camera(0.0));

        instance.clear();
        instance.render(&pass, [&obj]);

        assert_eq!(backend.clears(), vec![[0.0; 4]]);
        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].call.index_count, 24);
        assert_eq!(draws[0].indices, CUBE_INDICES);
        assert!(draws[0].call.depth_test);
        assert_eq!(Some(draws[0].call.vertex_array), obj.vertex_array());
    }

    #[test]
    fn camera_uniforms_are_written() {
        let (backend, ctx) = headless();
        let pass = linked_pass(&ctx);
        let obj = cube(&ctx);
        let camera = orbit_camera(1.0);

        let mut instance = Instance::new(&ctx);
        instance.set_camera(camera.clone());
        instance.render(&pass, [&obj]);

        let program = pass.program().unwrap();
        let view = backend.uniform_value(program, 0).unwrap();
        let eye = backend.uniform_value(program, 1).unwrap();

        let cam = camera.borrow();
        assert_eq!(view, bytemuck::cast_slice::<f32, u8>(&cam.view_matrix().to_cols_array()));
        assert_eq!(eye, bytemuck::cast_slice::<f32, u8>(&cam.position().to_array()));
    }

    #[test]
    fn camera_changes_show_up_next_frame() {
        let (backend, ctx) = headless();
        let pass = linked_pass(&ctx);
        let obj = cube(&ctx);
        let camera = orbit_camera(0.0);

        let mut instance = Instance::new(&ctx);
        instance.set_camera(camera.clone());
        instance.render(&pass, [&obj]);

        camera
            .borrow_mut()
            .look_at(Vector3::new(0.0, 1.0, 1.0), Vector3::ZERO);
        instance.render(&pass, [&obj]);

        let eye = backend.uniform_value(pass.program().unwrap(), 1).unwrap();
        assert_eq!(eye, bytemuck::cast_slice::<f32, u8>(&[0.0_f32, 1.0, 1.0]));
    }

    #[test]
    fn objects_are_drawn_in_input_order() {
        let (backend, ctx) = headless();
        let pass = linked_pass(&ctx);
        let first = cube(&ctx);
        let mut second = cube(&ctx);
        second.indices_mut().truncate(6);
        second.load_input().unwrap();

        let instance = Instance::new(&ctx);
        instance.render(&pass, [&second, &first]);

        let counts: Vec<u32> = backend.draws().iter().map(|d| d.call.index_count).collect();
        assert_eq!(counts, [6, 24]);
    }

    #[test]
    fn unlinked_pass_draws_nothing() {
        let (backend, ctx) = headless();
        let mut pass = Pass::new(&ctx);
        pass.compile_shader("not wgsl", CUBE_FS);
        let obj = cube(&ctx);

        let mut instance = Instance::new(&ctx);
        instance.set_camera(orbit_camera(0.0));
        instance.render(&pass, [&obj]);

        assert!(backend.draws().is_empty());
    }

    #[test]
    fn renders_without_camera() {
        let (backend, ctx) = headless();
        let pass = linked_pass(&ctx);
        let obj = cube(&ctx);

        Instance::new(&ctx).render(&pass, [&obj]);

        assert_eq!(backend.draws().len(), 1);
        assert!(backend.uniform_value(pass.program().unwrap(), 0).is_none());
    }

    #[test]
    fn mismatched_or_empty_objects_are_skipped() {
        let (backend, ctx) = headless();
        let pass = linked_pass(&ctx);

        let unconfigured = RenderObject::new(&ctx);

        let mut empty = RenderObject::new(&ctx);
        empty.set_input_structure(&[3]).unwrap();
        empty.load_input().unwrap();

        let mut wrong_stride = RenderObject::new(&ctx);
        wrong_stride.set_input_structure(&[2]).unwrap();
        wrong_stride.input_mut(0).extend_from_slice(&[0.0; 6]);
        wrong_stride.indices_mut().extend_from_slice(&[0, 1, 2]);
        wrong_stride.load_input().unwrap();

        let good = cube(&ctx);

        Instance::new(&ctx).render(&pass, [&unconfigured, &empty, &wrong_stride, &good]);

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(Some(draws[0].call.vertex_array), good.vertex_array());
    }

    #[test]
    fn light_is_stored_only() {
        let (backend, ctx) = headless();
        let light = shared(Light::new());
        light.borrow_mut().set_position(Vector3::new(2.0, 2.0, 2.0));

        let mut instance = Instance::new(&ctx);
        instance.set_light_source(light.clone());
        instance.enable_light(true);

        assert!(instance.is_light_enabled());
        assert!(Rc::ptr_eq(instance.light_source().unwrap(), &light));
        assert!(backend.draws().is_empty());
        assert_eq!(backend.live_buffers(), 0);
    }
}
