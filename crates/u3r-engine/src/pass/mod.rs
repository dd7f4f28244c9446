//! Shader programs.
//!
//! A [`Pass`] turns a vertex + fragment WGSL pair into a linked device
//! program. Compilation problems are reported, not raised: they are logged
//! and returned in a [`CompileReport`], and the pass simply stays unlinked.

mod reflect;
mod report;

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use naga::ShaderStage;

use crate::device::{Context, ProgramDesc, ProgramId, UniformBinding};

pub(crate) use reflect::VertexInput;
pub use report::{CompileReport, INFO_LOG_CAPACITY};

use report::truncate_log;

/// Location of a uniform within a linked program.
///
/// Obtained from [`Pass::get_index`]; unresolved names yield
/// [`UniformLocation::NOT_FOUND`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct UniformLocation(i32);

impl UniformLocation {
    /// Sentinel for a name the program does not declare.
    pub const NOT_FOUND: Self = Self(-1);

    pub fn new(index: u32) -> Self {
        i32::try_from(index).map_or(Self::NOT_FOUND, Self)
    }

    #[inline]
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Binding index, `None` for [`NOT_FOUND`](Self::NOT_FOUND).
    #[inline]
    pub fn index(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }

    #[inline]
    pub fn is_found(self) -> bool {
        self.0 >= 0
    }
}

/// A compiled, linked shader program.
///
/// Uniforms are `var<uniform>` declarations in bind group 0; a uniform's
/// location is its binding index. The program handle is released on drop
/// and when the pass is recompiled.
#[derive(Debug)]
pub struct Pass {
    ctx: Context,
    program: Option<ProgramId>,
    uniforms: Vec<UniformBinding>,
    vertex_inputs: Vec<VertexInput>,
}

impl Pass {
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            program: None,
            uniforms: Vec::new(),
            vertex_inputs: Vec::new(),
        }
    }

    /// Reads both WGSL files and compiles them with [`compile_shader`](Self::compile_shader).
    ///
    /// Only I/O failures are errors; compile and link problems are in the report.
    pub fn compile_shader_from_file(
        &mut self,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<CompileReport> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();

        let vertex = fs::read_to_string(vertex_path)
            .with_context(|| format!("failed to read vertex shader {}", vertex_path.display()))?;
        let fragment = fs::read_to_string(fragment_path).with_context(|| {
            format!("failed to read fragment shader {}", fragment_path.display())
        })?;

        log::debug!(
            "compiling pass from {} + {}",
            vertex_path.display(),
            fragment_path.display()
        );
        Ok(self.compile_shader(&vertex, &fragment))
    }

    /// Compiles both stages, links them and creates the device program.
    pub fn compile_shader(&mut self, vertex_source: &str, fragment_source: &str) -> CompileReport {
        self.release();

        let mut report = CompileReport::default();

        let vertex = reflect::compile_stage(vertex_source, ShaderStage::Vertex)
            .map_err(|e| report.vertex = Some(truncate_log(e)))
            .ok();
        let fragment = reflect::compile_stage(fragment_source, ShaderStage::Fragment)
            .map_err(|e| report.fragment = Some(truncate_log(e)))
            .ok();

        if let (Some(vertex), Some(fragment)) = (vertex, fragment) {
            match reflect::link(&vertex, &fragment) {
                Ok(linked) => {
                    let program = self.ctx.backend().create_program(&ProgramDesc {
                        vertex_source,
                        vertex_entry: vertex.entry(),
                        fragment_source,
                        fragment_entry: fragment.entry(),
                        uniforms: &linked.uniforms,
                    });

                    log::debug!(
                        "pass linked: {} uniform(s), {} vertex input(s)",
                        linked.uniforms.len(),
                        linked.vertex_inputs.len()
                    );

                    self.program = Some(program);
                    self.uniforms = linked.uniforms;
                    self.vertex_inputs = linked.vertex_inputs;
                }
                Err(e) => report.link = Some(truncate_log(e)),
            }
        }

        report.emit();
        report
    }

    /// Resolves a uniform name, or [`UniformLocation::NOT_FOUND`].
    pub fn get_index(&self, name: &str) -> UniformLocation {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .map_or(UniformLocation::NOT_FOUND, |u| UniformLocation::new(u.binding))
    }

    pub fn is_linked(&self) -> bool {
        self.program.is_some()
    }

    /// Uniforms declared by the linked program, ordered by location.
    pub fn uniforms(&self) -> &[UniformBinding] {
        &self.uniforms
    }

    pub(crate) fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub(crate) fn vertex_inputs(&self) -> &[VertexInput] {
        &self.vertex_inputs
    }

    fn release(&mut self) {
        if let Some(program) = self.program.take() {
            self.ctx.backend().delete_program(program);
        }
        self.uniforms.clear();
        self.vertex_inputs.clear();
    }
}

impl Drop for Pass {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::device::HeadlessBackend;

    pub(crate) const CUBE_VS: &str = r#"
@group(0) @binding(0) var<uniform> u_view_matrix: mat4x4<f32>;
@group(0) @binding(1) var<uniform> u_view_position: vec3<f32>;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) local: vec3<f32>,
};

@vertex
fn vs_main(@location(0) a_position: vec3<f32>) -> VsOut {
    var out: VsOut;
    let view = u_view_matrix * vec4<f32>(a_position, 1.0);
    out.clip = vec4<f32>(view.xy, clamp(-view.z * 0.1, 0.0, 1.0), 1.0);
    out.local = a_position + u_view_position * 0.0;
    return out;
}
"#;

    pub(crate) const CUBE_FS: &str = r#"
@fragment
fn fs_main(@location(0) local: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(local + vec3<f32>(0.5), 1.0);
}
"#;

    fn headless() -> (Rc<HeadlessBackend>, Context) {
        let backend = Rc::new(HeadlessBackend::new());
        let ctx = Context::from_shared(backend.clone());
        (backend, ctx)
    }

    #[test]
    fn compiles_and_resolves_uniforms() {
        let (backend, ctx) = headless();
        let mut pass = Pass::new(&ctx);

        let report = pass.compile_shader(CUBE_VS, CUBE_FS);
        assert!(report.is_ok(), "{report:?}");
        assert!(pass.is_linked());
        assert_eq!(backend.live_programs(), 1);

        assert_eq!(pass.get_index("u_view_matrix"), UniformLocation::new(0));
        assert_eq!(pass.get_index("u_view_position"), UniformLocation::new(1));
    }

    #[test]
    fn absent_uniform_yields_sentinel() {
        let (_, ctx) = headless();
        let mut pass = Pass::new(&ctx);
        pass.compile_shader(CUBE_VS, CUBE_FS);

        let loc = pass.get_index("u_model_matrix");
        assert_eq!(loc, UniformLocation::NOT_FOUND);
        assert!(!loc.is_found());
        assert_eq!(loc.index(), None);
        assert!(loc.raw() < 0);
        assert!(pass.uniforms().iter().all(|u| UniformLocation::new(u.binding) != loc));
    }

    #[test]
    fn unlinked_pass_resolves_nothing() {
        let (_, ctx) = headless();
        let pass = Pass::new(&ctx);
        assert!(!pass.is_linked());
        assert_eq!(pass.get_index("u_view_matrix"), UniformLocation::NOT_FOUND);
    }

    #[test]
    fn broken_stage_is_reported_not_raised() {
        let (backend, ctx) = headless();
        let mut pass = Pass::new(&ctx);

        let report = pass.compile_shader("@vertex fn vs_main( -> {", CUBE_FS);
        assert!(report.vertex.is_some());
        assert!(report.fragment.is_none());
        assert!(report.link.is_none());
        assert!(report.vertex.unwrap().len() <= INFO_LOG_CAPACITY);

        assert!(!pass.is_linked());
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn recompiling_releases_previous_program() {
        let (backend, ctx) = headless();
        let mut pass = Pass::new(&ctx);
        pass.compile_shader(CUBE_VS, CUBE_FS);
        let first = pass.program();

        pass.compile_shader(CUBE_VS, CUBE_FS);
        assert_eq!(backend.live_programs(), 1);
        assert_ne!(pass.program(), first);

        drop(pass);
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let (_, ctx) = headless();
        let mut pass = Pass::new(&ctx);
        let err = pass
            .compile_shader_from_file("/nonexistent/shader.vs.wgsl", "/nonexistent/shader.fs.wgsl")
            .unwrap_err();
        assert!(format!("{err:#}").contains("vertex shader"));
    }

    #[test]
    fn compiles_from_files() {
        let dir = std::env::temp_dir().join(format!("u3r-pass-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let vs = dir.join("shader.vs.wgsl");
        let fs_path = dir.join("shader.fs.wgsl");
        fs::write(&vs, CUBE_VS).unwrap();
        fs::write(&fs_path, CUBE_FS).unwrap();

        let (_, ctx) = headless();
        let mut pass = Pass::new(&ctx);
        let report = pass.compile_shader_from_file(&vs, &fs_path).unwrap();
        assert!(report.is_ok(), "{report:?}");

        let _ = fs::remove_dir_all(&dir);
    }
}
