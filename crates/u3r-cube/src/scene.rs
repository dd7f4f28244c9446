use std::path::Path;
use std::rc::Rc;

use anyhow::{Result, ensure};
use u3r_engine::device::{WgpuBackend, WgpuBackendConfig};
use u3r_engine::{Camera, Context, Instance, Pass, RenderObject, Shared, Vector3, shared};

use crate::clock::FrameTime;
use crate::gpu::{Gpu, GpuFrame};

#[rustfmt::skip]
const VERTICES: [f32; 24] = [
     0.5,  0.5, -0.5,
    -0.5,  0.5, -0.5,
    -0.5,  0.5,  0.5,
     0.5,  0.5,  0.5,
     0.5, -0.5, -0.5,
    -0.5, -0.5, -0.5,
    -0.5, -0.5,  0.5,
     0.5, -0.5,  0.5,
];

#[rustfmt::skip]
const INDICES: [u32; 24] = [
    0, 1, 4,
    1, 4, 5,
    1, 2, 5,
    2, 5, 6,
    2, 3, 6,
    3, 6, 7,
    3, 4, 7,
    4, 0, 3,
];

/// The reference cube seen from a camera orbiting the origin.
pub struct CubeScene {
    backend: Rc<WgpuBackend>,
    instance: Instance,
    pass: Pass,
    cube: RenderObject,
    camera: Shared<Camera>,
    orbit_speed: f32,
}

impl CubeScene {
    pub fn new(
        gpu: &Gpu<'_>,
        vertex_shader: &Path,
        fragment_shader: &Path,
        orbit_speed: f32,
    ) -> Result<Self> {
        let backend = Rc::new(WgpuBackend::new(
            gpu.device().clone(),
            gpu.queue().clone(),
            WgpuBackendConfig {
                color_format: gpu.surface_format(),
                ..Default::default()
            },
        ));
        let ctx = Context::from_shared(backend.clone());

        let mut pass = Pass::new(&ctx);
        let report = pass.compile_shader_from_file(vertex_shader, fragment_shader)?;
        ensure!(report.is_ok(), "cube shaders failed to build: {report:?}");

        let mut cube = RenderObject::new(&ctx);
        cube.set_input_structure(&[3])?;
        cube.input_mut(0).extend_from_slice(&VERTICES);
        cube.indices_mut().extend_from_slice(&INDICES);
        cube.load_input()?;
        log::debug!("cube vertices: {:?}", cube.input(0));
        log::debug!("cube indices: {:?}", cube.indices());

        let camera = shared(Camera::new());
        camera.borrow_mut().look_at(Vector3::ONE, Vector3::ZERO);

        let mut instance = Instance::new(&ctx);
        instance.set_camera(camera.clone());

        Ok(Self {
            backend,
            instance,
            pass,
            cube,
            camera,
            orbit_speed,
        })
    }

    /// Moves the eye to `(cos t, 1, sin t)`, then clears and draws into `frame`.
    pub fn draw(&self, gpu: &Gpu<'_>, frame: &GpuFrame, time: FrameTime) {
        log::trace!("frame {} (dt {:.4}s)", time.frame_index, time.dt);

        let t = time.elapsed * self.orbit_speed;
        self.camera
            .borrow_mut()
            .look_at(orbit_eye(t), Vector3::ZERO);

        let size = gpu.size();
        self.backend.bind_target(&frame.view, size.width, size.height);
        self.instance.clear();
        self.instance.render(&self.pass, [&self.cube]);
        self.backend.unbind_target();
    }
}

fn orbit_eye(t: f32) -> Vector3 {
    Vector3::new(t.cos(), 1.0, t.sin())
}
