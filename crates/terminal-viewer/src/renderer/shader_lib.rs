//! WGSL sources, built from named and versioned fragments.
//!
//! Every pipeline shader is the concatenation of a fixed list of fragments.
//! Fragments are whole declarations; nothing is patched by text substitution.

use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderFragment {
    pub name: &'static str,
    pub version: u32,
    pub source: &'static str,
}

impl ShaderFragment {
    /// Banner written in front of the fragment's source.
    pub fn tag(&self) -> String {
        format!("// fragment: {} v{}", self.name, self.version)
    }
}

/// Collects fragments in declaration order.
#[derive(Debug, Default, Clone)]
pub struct ShaderComposer {
    fragments: Vec<ShaderFragment>,
}

impl ShaderComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment. A name may appear only once.
    pub fn with(mut self, fragment: ShaderFragment) -> Result<Self> {
        if let Some(existing) = self.fragments.iter().find(|f| f.name == fragment.name) {
            bail!(
                "shader fragment '{}' already included (v{}, adding v{})",
                fragment.name,
                existing.version,
                fragment.version
            );
        }
        self.fragments.push(fragment);
        Ok(self)
    }

    pub fn fragments(&self) -> &[ShaderFragment] {
        &self.fragments
    }

    pub fn compose(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            out.push_str(&fragment.tag());
            out.push('\n');
            out.push_str(fragment.source.trim());
            out.push_str("\n\n");
        }
        out
    }
}

pub const SCENE_UNIFORMS: ShaderFragment = ShaderFragment {
    name: "scene_uniforms",
    version: 1,
    source: r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec3<f32>,
    time: f32,
    viewport_size: vec2<f32>,
    line_width: f32,
    _pad0: f32,
    light_dir: vec3<f32>,
    _pad1: f32,
};
@group(0) @binding(0) var<uniform> U: SceneUniforms;
"#,
};

pub const LIGHTING: ShaderFragment = ShaderFragment {
    name: "lighting",
    version: 1,
    source: r#"
// Two-sided Lambert with a flat ambient floor.
fn shade(normal: vec3<f32>) -> f32 {
    let l = normalize(U.light_dir);
    return 0.45 + 0.55 * abs(dot(normalize(normal), l));
}
"#,
};

pub const SOLID_STAGES: ShaderFragment = ShaderFragment {
    name: "solid_stages",
    version: 1,
    source: r#"
struct SolidIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct SolidOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(in: SolidIn) -> SolidOut {
    var out: SolidOut;
    out.clip = U.view_proj * vec4<f32>(in.position, 1.0);
    out.normal = in.normal;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: SolidOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color.rgb * shade(in.normal), in.color.a);
}
"#,
};

pub const LINE_STAGES: ShaderFragment = ShaderFragment {
    name: "line_stages",
    version: 1,
    source: r#"
struct LineIn {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(in: LineIn) -> LineOut {
    var out: LineOut;
    out.clip = U.view_proj * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: LineOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#,
};

pub const SEGMENT_ATTRIBUTES: ShaderFragment = ShaderFragment {
    name: "segment_attributes",
    version: 1,
    source: r#"
struct SegmentIn {
    // x: 0 at start, 1 at end. y: -1 / +1 across the line.
    @location(0) corner: vec2<f32>,
    @location(1) start: vec3<f32>,
    @location(2) distance: f32,
    @location(3) end: vec3<f32>,
    @location(4) direction: u32,
};

struct SegmentOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) @interpolate(flat) distance: f32,
    @location(2) @interpolate(flat) direction: u32,
};
"#,
};

pub const THICK_LINE_VERTEX: ShaderFragment = ShaderFragment {
    name: "thick_line_vertex",
    version: 1,
    source: r#"
@vertex
fn vs_main(in: SegmentIn) -> SegmentOut {
    let a = U.view_proj * vec4<f32>(in.start, 1.0);
    let b = U.view_proj * vec4<f32>(in.end, 1.0);

    // Screen-space direction; the quad is widened along its normal.
    let sa = a.xy / a.w * U.viewport_size;
    let sb = b.xy / b.w * U.viewport_size;
    var dir = sb - sa;
    if (length(dir) < 1e-6) {
        dir = vec2<f32>(1.0, 0.0);
    }
    let normal = normalize(vec2<f32>(-dir.y, dir.x));

    let p = mix(a, b, in.corner.x);
    let offset = normal * in.corner.y * U.line_width / U.viewport_size;

    var out: SegmentOut;
    out.clip = vec4<f32>(p.xy + offset * p.w, p.z, p.w);
    out.uv = in.corner;
    out.distance = in.distance;
    out.direction = in.direction;
    return out;
}
"#,
};

pub const DASH: ShaderFragment = ShaderFragment {
    name: "dash",
    version: 1,
    source: r#"
const DASH_ON: f32 = 0.9;
const DASH_PERIOD: f32 = 1.9;
// Pattern units per world unit along the segment.
const DASH_DENSITY: f32 = 0.25;
const DASH_SLANT: f32 = 0.6;

// +1 flows start -> end, -1 end -> start. Two-way links run each half of
// the line in its own direction.
fn flow_sign(direction: u32, side: f32) -> f32 {
    let lanes = select(side, 1.0, direction == 1u);
    return select(lanes, -1.0, direction == 2u);
}

// 1 inside a dash, 0 in a gap.
fn dash_mask(uv: vec2<f32>, distance: f32, direction: u32, time: f32) -> f32 {
    let side = select(-1.0, 1.0, uv.y >= 0.0);
    let flow = flow_sign(direction, side);
    let diagonal = abs(uv.y) * DASH_SLANT * flow;
    let phase = uv.x * distance * DASH_DENSITY + diagonal - time * flow;
    let m = phase - DASH_PERIOD * floor(phase / DASH_PERIOD);
    return select(0.0, 1.0, m < DASH_ON);
}
"#,
};

pub const LINK_PALETTE: ShaderFragment = ShaderFragment {
    name: "link_palette",
    version: 1,
    source: r#"
fn link_color(direction: u32) -> vec3<f32> {
    if (direction == 1u) {
        return vec3<f32>(0.0, 1.0, 1.0);
    }
    if (direction == 2u) {
        return vec3<f32>(1.0, 1.0, 0.0);
    }
    return vec3<f32>(1.0, 1.0, 1.0);
}
"#,
};

pub const LINK_FRAGMENT: ShaderFragment = ShaderFragment {
    name: "link_fragment",
    version: 1,
    source: r#"
@fragment
fn fs_main(in: SegmentOut) -> @location(0) vec4<f32> {
    if (dash_mask(in.uv, in.distance, in.direction, U.time) < 0.5) {
        discard;
    }
    return vec4<f32>(link_color(in.direction), 1.0);
}
"#,
};

pub fn solid_shader() -> Result<ShaderComposer> {
    ShaderComposer::new()
        .with(SCENE_UNIFORMS)?
        .with(LIGHTING)?
        .with(SOLID_STAGES)
}

pub fn line_shader() -> Result<ShaderComposer> {
    ShaderComposer::new().with(SCENE_UNIFORMS)?.with(LINE_STAGES)
}

pub fn link_line_shader() -> Result<ShaderComposer> {
    ShaderComposer::new()
        .with(SEGMENT_ATTRIBUTES)?
        .with(SCENE_UNIFORMS)?
        .with(THICK_LINE_VERTEX)?
        .with(DASH)?
        .with(LINK_PALETTE)?
        .with(LINK_FRAGMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fragments_in_declaration_order_once() {
        let composer = link_line_shader().unwrap();
        let source = composer.compose();

        let names = [
            "segment_attributes",
            "scene_uniforms",
            "thick_line_vertex",
            "dash",
            "link_palette",
            "link_fragment",
        ];
        let mut last = 0;
        for name in names {
            let tag = format!("// fragment: {name} v1\n");
            assert_eq!(source.matches(&tag).count(), 1, "{name}");
            let at = source.find(&tag).unwrap();
            assert!(at >= last, "{name} out of order");
            last = at;
        }
        assert_eq!(composer.fragments().len(), names.len());
    }

    #[test]
    fn test_duplicate_fragment_rejected() {
        let err = ShaderComposer::new()
            .with(SCENE_UNIFORMS)
            .unwrap()
            .with(ShaderFragment {
                version: 2,
                ..SCENE_UNIFORMS
            })
            .unwrap_err();
        assert!(err.to_string().contains("scene_uniforms"));
    }

    #[test]
    fn test_each_shader_has_one_entry_pair() {
        for composer in [solid_shader(), line_shader(), link_line_shader()] {
            let source = composer.unwrap().compose();
            assert_eq!(source.matches("fn vs_main").count(), 1);
            assert_eq!(source.matches("fn fs_main").count(), 1);
            assert_eq!(source.matches("var<uniform> U").count(), 1);
        }
    }

    /// Host copy of `flow_sign` and the dash phase from the `dash` fragment.
    fn flow_sign(direction: u32, side: f32) -> f32 {
        let lanes = if direction == 1 { 1.0 } else { side };
        if direction == 2 {
            -1.0
        } else {
            lanes
        }
    }

    fn dash_phase(uv: [f32; 2], distance: f32, direction: u32, time: f32) -> f32 {
        let side = if uv[1] >= 0.0 { 1.0 } else { -1.0 };
        let flow = flow_sign(direction, side);
        let diagonal = uv[1].abs() * 0.6 * flow;
        uv[0] * distance * 0.25 + diagonal - time * flow
    }

    #[test]
    fn test_host_copy_matches_fragment() {
        assert!(DASH
            .source
            .contains("let lanes = select(side, 1.0, direction == 1u);"));
        assert!(DASH
            .source
            .contains("return select(lanes, -1.0, direction == 2u);"));
        assert!(DASH
            .source
            .contains("let side = select(-1.0, 1.0, uv.y >= 0.0);"));
        assert!(DASH.source.contains(
            "let phase = uv.x * distance * DASH_DENSITY + diagonal - time * flow;"
        ));
    }

    #[test]
    fn test_flow_sign_table() {
        let cases = [
            // (direction, side, flow)
            (0, -1.0, -1.0),
            (0, 1.0, 1.0),
            (1, -1.0, 1.0),
            (1, 1.0, 1.0),
            (2, -1.0, -1.0),
            (2, 1.0, -1.0),
        ];
        for (direction, side, flow) in cases {
            assert_eq!(flow_sign(direction, side), flow, "direction {direction}, side {side}");
        }
    }

    #[test]
    fn test_dashes_travel_with_the_flow() {
        // Phase change over one time unit at a fixed point on the segment:
        // dashes move towards the end when the phase decreases.
        let drift = |direction, across: f32| {
            dash_phase([0.3, across], 12.0, direction, 1.0) - dash_phase([0.3, across], 12.0, direction, 0.0)
        };

        assert_relative_eq!(drift(1, 0.5), -1.0, epsilon = 1e-6);
        assert_relative_eq!(drift(1, -0.5), -1.0, epsilon = 1e-6);
        assert_relative_eq!(drift(2, 0.5), 1.0, epsilon = 1e-6);
        assert_relative_eq!(drift(2, -0.5), 1.0, epsilon = 1e-6);
        // Two-way: the halves of the line run in opposite directions.
        assert_relative_eq!(drift(0, 0.5), -1.0, epsilon = 1e-6);
        assert_relative_eq!(drift(0, -0.5), 1.0, epsilon = 1e-6);

        // The slant mirrors across the centerline of a two-way link.
        let upper = dash_phase([0.0, 0.5], 12.0, 0, 0.0);
        let lower = dash_phase([0.0, -0.5], 12.0, 0, 0.0);
        assert_eq!(upper, -lower);
    }

    #[test]
    fn test_dash_constants() {
        assert!(DASH.source.contains("DASH_ON: f32 = 0.9"));
        assert!(DASH.source.contains("DASH_PERIOD: f32 = 1.9"));
    }
}
