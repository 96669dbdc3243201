use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, ScalarKind, TypeInner, VectorSize};

use crate::renderer::RenderError;

use super::preprocess::{ShaderSources, ShaderStage};
use super::uniform::{UNIFORM_SLOT_SIZE, UniformField, UniformLayout, UniformType};

/// Bind group holding the uniform block (binding 0).
pub const UNIFORM_GROUP: u32 = 0;

/// Bind group holding texture (binding 0) and sampler (binding 1).
pub const TEXTURE_GROUP: u32 = 1;

/// Parses and validates every stage, then reflects the merged uniform layout.
///
/// Each stage must contain exactly one entry point for that stage. The
/// uniform block is the struct bound at `@group(0) @binding(0)`, identical
/// in every stage that declares it. Textures are the `texture_2d` globals in
/// group 1.
pub fn reflect_program(name: &str, sources: &ShaderSources) -> Result<UniformLayout, RenderError> {
    let mut merged: Option<(Vec<UniformField>, u32)> = None;
    let mut textures: Vec<(u32, String)> = Vec::new();

    for (stage, source) in sources.iter() {
        let module = compile_stage(name, stage, source)?;
        let reflected = reflect_module(&module)?;

        if let Some(block) = reflected.block {
            match &merged {
                None => merged = Some(block),
                Some(existing) if *existing != block => {
                    return Err(RenderError::UniformLayout(format!(
                        "uniform block of `{name}` differs between stages"
                    )));
                }
                Some(_) => {}
            }
        }
        for texture in reflected.textures {
            if !textures.contains(&texture) {
                textures.push(texture);
            }
        }
    }

    let (fields, size) = merged.unwrap_or_default();
    if size > UNIFORM_SLOT_SIZE {
        return Err(RenderError::UniformLayout(format!(
            "uniform block of `{name}` is {size} bytes; at most {UNIFORM_SLOT_SIZE} are supported"
        )));
    }

    textures.sort();
    let textures = textures.into_iter().map(|(_, n)| n).collect();
    log::debug!("shader `{name}`: {} uniforms, {size} bytes", fields.len());
    Ok(UniformLayout::from_parts(fields, size, textures))
}

pub(crate) fn compile_stage(
    name: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<naga::Module, RenderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| RenderError::ShaderCompile {
        name: name.to_string(),
        log: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| RenderError::ShaderCompile {
            name: name.to_string(),
            log: e.emit_to_string(source),
        })?;

    let entry_points = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == stage.naga())
        .count();
    if entry_points != 1 {
        return Err(RenderError::ShaderCompile {
            name: name.to_string(),
            log: format!("{stage:?} section must define exactly one {stage:?} entry point, found {entry_points}"),
        });
    }

    Ok(module)
}

struct Reflected {
    block: Option<(Vec<UniformField>, u32)>,
    textures: Vec<(u32, String)>,
}

fn reflect_module(module: &naga::Module) -> Result<Reflected, RenderError> {
    let mut block = None;
    let mut textures = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        let inner = &module.types[var.ty].inner;

        match (var.space, binding.group, binding.binding) {
            (AddressSpace::Uniform, UNIFORM_GROUP, 0) => {
                let TypeInner::Struct { members, span } = inner else {
                    return Err(RenderError::UniformLayout(
                        "uniform binding 0 must be a struct".to_string(),
                    ));
                };
                let fields = members
                    .iter()
                    .map(|m| {
                        let name = m.name.clone().unwrap_or_default();
                        let ty = uniform_type(&module.types[m.ty].inner).ok_or_else(|| {
                            RenderError::UniformLayout(format!(
                                "unsupported type for uniform `{name}`"
                            ))
                        })?;
                        Ok(UniformField {
                            name,
                            ty,
                            offset: m.offset,
                        })
                    })
                    .collect::<Result<Vec<_>, RenderError>>()?;
                block = Some((fields, *span));
            }
            (AddressSpace::Handle, TEXTURE_GROUP, slot) if matches!(inner, TypeInner::Image { .. }) => {
                textures.push((slot, var.name.clone().unwrap_or_default()));
            }
            _ => {}
        }
    }

    Ok(Reflected { block, textures })
}

fn uniform_type(inner: &TypeInner) -> Option<UniformType> {
    match *inner {
        TypeInner::Scalar(s) if s.width == 4 => match s.kind {
            ScalarKind::Float => Some(UniformType::Float),
            ScalarKind::Sint => Some(UniformType::Int),
            ScalarKind::Uint => Some(UniformType::UInt),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if scalar.width == 4 => match (scalar.kind, size) {
            (ScalarKind::Float, VectorSize::Bi) => Some(UniformType::Float2),
            (ScalarKind::Float, VectorSize::Tri) => Some(UniformType::Float3),
            (ScalarKind::Float, VectorSize::Quad) => Some(UniformType::Float4),
            (ScalarKind::Sint, VectorSize::Bi) => Some(UniformType::Int2),
            (ScalarKind::Sint, VectorSize::Tri) => Some(UniformType::Int3),
            (ScalarKind::Sint, VectorSize::Quad) => Some(UniformType::Int4),
            _ => None,
        },
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } if scalar.kind == ScalarKind::Float && scalar.width == 4 => match (columns, rows) {
            (VectorSize::Tri, VectorSize::Tri) => Some(UniformType::Mat3),
            (VectorSize::Quad, VectorSize::Quad) => Some(UniformType::Mat4),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shader::preprocess;

    const BLOCK: &str = "
struct Uniforms {
    u_ViewProjection: mat4x4<f32>,
    u_Normal: mat3x3<f32>,
    u_Color: vec4<f32>,
    u_Offset: vec3<f32>,
    u_Tiling: f32,
    u_Index: i32,
};
@group(0) @binding(0) var<uniform> u: Uniforms;
";

    fn program(fragment_extra: &str) -> String {
        format!(
            "#type vertex\n{BLOCK}
@vertex
fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {{
    return u.u_ViewProjection * vec4<f32>(p, 1.0);
}}
#type fragment\n{BLOCK}{fragment_extra}
@fragment
fn fs_main() -> @location(0) vec4<f32> {{
    return u.u_Color;
}}
"
        )
    }

    #[test]
    fn offsets_follow_wgsl_alignment() {
        let sources = preprocess(&program("")).unwrap();
        let layout = reflect_program("test", &sources).unwrap();

        let offsets: Vec<(&str, u32)> = layout
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.offset))
            .collect();
        assert_eq!(
            offsets,
            vec![
                ("u_ViewProjection", 0),
                ("u_Normal", 64),
                ("u_Color", 112),
                ("u_Offset", 128),
                ("u_Tiling", 140),
                ("u_Index", 144),
            ]
        );
        assert_eq!(layout.size(), 160);
        assert_eq!(layout.field("u_Normal").unwrap().ty, UniformType::Mat3);
        assert!(layout.textures().is_empty());
    }

    #[test]
    fn textures_in_group_one_are_named() {
        let extra = "
@group(1) @binding(0) var u_Texture: texture_2d<f32>;
@group(1) @binding(1) var u_Sampler: sampler;
";
        let sources = preprocess(&program(extra)).unwrap();
        let layout = reflect_program("textured", &sources).unwrap();
        assert_eq!(layout.textures(), &["u_Texture".to_string()]);
    }

    #[test]
    fn conflicting_stage_declarations_are_rejected() {
        let vs = "
struct Uniforms { u_Color: vec4<f32> };
@group(0) @binding(0) var<uniform> u: Uniforms;
@vertex fn vs_main() -> @builtin(position) vec4<f32> { return u.u_Color; }
";
        let fs = "
struct Uniforms { u_Color: vec3<f32> };
@group(0) @binding(0) var<uniform> u: Uniforms;
@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(u.u_Color, 1.0); }
";
        let err = reflect_program("bad", &ShaderSources::new(vs, fs)).unwrap_err();
        assert!(matches!(err, RenderError::UniformLayout(_)));
    }

    #[test]
    fn stage_subsets_are_rejected_and_omitted_blocks_allowed() {
        let vs = "
struct Uniforms { u_Color: vec4<f32> };
@group(0) @binding(0) var<uniform> u: Uniforms;
@vertex fn vs_main() -> @builtin(position) vec4<f32> { return u.u_Color; }
";
        let fs_extra = "
struct Uniforms { u_Color: vec4<f32>, u_Tint: vec4<f32> };
@group(0) @binding(0) var<uniform> u: Uniforms;
@fragment fn fs_main() -> @location(0) vec4<f32> { return u.u_Tint; }
";
        assert!(matches!(
            reflect_program("subset", &ShaderSources::new(vs, fs_extra)),
            Err(RenderError::UniformLayout(_))
        ));

        let fs_plain = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let layout = reflect_program("vertex-only", &ShaderSources::new(vs, fs_plain)).unwrap();
        assert_eq!(layout.fields().len(), 1);
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn oversized_block_is_rejected() {
        let vs = "
struct Uniforms { a: mat4x4<f32>, b: mat4x4<f32>, c: mat4x4<f32>, d: mat4x4<f32>, e: f32 };
@group(0) @binding(0) var<uniform> u: Uniforms;
@vertex fn vs_main() -> @builtin(position) vec4<f32> { return u.a[0] * u.e; }
";
        let sources = ShaderSources {
            vertex: Some(vs.to_string()),
            fragment: None,
        };
        let err = reflect_program("big", &sources).unwrap_err();
        assert!(matches!(err, RenderError::UniformLayout(_)));
    }

    #[test]
    fn wgsl_errors_carry_diagnostics() {
        let sources = ShaderSources {
            vertex: Some("@vertex fn vs_main( -> {".to_string()),
            fragment: None,
        };
        match reflect_program("broken", &sources) {
            Err(RenderError::ShaderCompile { name, log }) => {
                assert_eq!(name, "broken");
                assert!(!log.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stage_without_matching_entry_point_fails() {
        let fs_as_vs = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let sources = ShaderSources {
            vertex: Some(fs_as_vs.to_string()),
            fragment: None,
        };
        assert!(matches!(
            reflect_program("wrong-stage", &sources),
            Err(RenderError::ShaderCompile { .. })
        ));
    }
}
