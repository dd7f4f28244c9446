//! WGSL parsing, validation and interface reflection.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, Module, ShaderStage, TypeInner};

use crate::device::UniformBinding;

/// A vertex-stage input fed from a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct VertexInput {
    pub location: u32,
    /// Component count of an `f32` scalar/vector input. `None` for any other
    /// type, which no attribute slot can feed.
    pub components: Option<u32>,
}

/// One parsed and validated shader stage.
pub(crate) struct StageModule {
    module: Module,
    entry: String,
}

impl StageModule {
    pub(crate) fn entry(&self) -> &str {
        &self.entry
    }
}

/// Interface of a vertex + fragment pair that passed linking.
pub(crate) struct Linked {
    pub uniforms: Vec<UniformBinding>,
    pub vertex_inputs: Vec<VertexInput>,
}

/// Parses, validates and locates the `stage` entry point of `source`.
///
/// On failure the returned string is the source-annotated diagnostic.
pub(crate) fn compile_stage(source: &str, stage: ShaderStage) -> Result<StageModule, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .map(|ep| ep.name.clone())
        .ok_or_else(|| format!("no {stage:?} entry point found"))?;

    Ok(StageModule { module, entry })
}

/// Checks that both stages agree on their interface and merges their uniforms.
pub(crate) fn link(vertex: &StageModule, fragment: &StageModule) -> Result<Linked, String> {
    let mut merged = uniforms(&vertex.module)?;
    for u in uniforms(&fragment.module)? {
        match merged.iter().find(|v| v.binding == u.binding) {
            Some(v) if v == &u => {}
            Some(v) => {
                return Err(format!(
                    "uniform binding {} is `{}` ({} bytes) in the vertex stage but `{}` ({} bytes) in the fragment stage",
                    u.binding, v.name, v.size, u.name, u.size
                ));
            }
            None => merged.push(u),
        }
    }
    merged.sort_by_key(|u| u.binding);

    let outputs = stage_outputs(vertex);
    for (location, ty) in stage_inputs(fragment) {
        match outputs.iter().find(|(l, _)| *l == location) {
            Some((_, out)) if out == &ty => {}
            Some(_) => {
                return Err(format!(
                    "fragment input @location({location}) does not match the vertex output type"
                ));
            }
            None => {
                return Err(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                ));
            }
        }
    }

    let vertex_inputs = stage_inputs(vertex)
        .into_iter()
        .map(|(location, ty)| VertexInput {
            location,
            components: f32_components(&ty),
        })
        .collect();

    Ok(Linked {
        uniforms: merged,
        vertex_inputs,
    })
}

/// Group-0 uniform buffers declared by `module`.
///
/// Any other bound resource (textures, samplers, storage buffers, other
/// groups) is rejected.
fn uniforms(module: &Module) -> Result<Vec<UniformBinding>, String> {
    let mut out = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else {
            continue;
        };
        let name = var.name.clone().unwrap_or_default();

        if var.space != naga::AddressSpace::Uniform {
            return Err(format!(
                "`{name}` at @group({}) @binding({}) is not a uniform buffer; only uniforms are supported",
                binding.group, binding.binding
            ));
        }
        if binding.group != 0 {
            return Err(format!(
                "uniform `{name}` is in group {}; only group 0 is supported",
                binding.group
            ));
        }

        out.push(UniformBinding {
            name,
            binding: binding.binding,
            size: module.types[var.ty].inner.size(module.to_ctx()),
        });
    }

    Ok(out)
}

fn entry_point<'m>(stage: &'m StageModule) -> Option<&'m naga::EntryPoint> {
    stage
        .module
        .entry_points
        .iter()
        .find(|ep| ep.name == stage.entry)
}

fn stage_inputs(stage: &StageModule) -> Vec<(u32, TypeInner)> {
    let mut out = Vec::new();
    if let Some(ep) = entry_point(stage) {
        for arg in &ep.function.arguments {
            collect_located(&stage.module, arg.ty, arg.binding.as_ref(), &mut out);
        }
    }
    out
}

fn stage_outputs(stage: &StageModule) -> Vec<(u32, TypeInner)> {
    let mut out = Vec::new();
    if let Some(result) = entry_point(stage).and_then(|ep| ep.function.result.as_ref()) {
        collect_located(&stage.module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

/// Flattens `@location` bindings of an argument/result, descending into structs.
fn collect_located(
    module: &Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, TypeInner)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_located(module, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn f32_components(ty: &TypeInner) -> Option<u32> {
    match ty {
        TypeInner::Scalar(s) if *s == naga::Scalar::F32 => Some(1),
        TypeInner::Vector { size, scalar } if *scalar == naga::Scalar::F32 => Some(*size as u32),
        _ => None,
    }
}
