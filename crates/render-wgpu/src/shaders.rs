/// Lit meshes: metallic/roughness shading, directional shadow, exp2 fog.
pub const SCENE_SHADER: &str = r#"
const PI: f32 = 3.141592653589793;
const RECIPROCAL_PI: f32 = 0.3183098861837907;
const MAX_DIRECTIONAL: u32 = 2u;
const MAX_POINT: u32 = 4u;

struct Frame {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    fog: vec4<f32>,
    directional_direction: array<vec4<f32>, 2>,
    directional_radiance: array<vec4<f32>, 2>,
    point_position: array<vec4<f32>, 4>,
    point_radiance: array<vec4<f32>, 4>,
    counts: vec4<u32>,
    shadow: vec4<f32>,
};

struct Material {
    color: vec4<f32>,
    emissive: vec4<f32>,
    params: vec4<f32>,
    maps_a: vec4<f32>,
    maps_b: vec4<f32>,
    uv_rows: array<vec4<f32>, 14>,
};

@group(0) @binding(0) var<uniform> frame: Frame;
@group(0) @binding(1) var shadow_map: texture_depth_2d;
@group(0) @binding(2) var shadow_sampler: sampler_comparison;

@group(1) @binding(0) var<uniform> material: Material;
@group(1) @binding(1) var color_map: texture_2d<f32>;
@group(1) @binding(2) var ao_map: texture_2d<f32>;
@group(1) @binding(3) var roughness_map: texture_2d<f32>;
@group(1) @binding(4) var metalness_map: texture_2d<f32>;
@group(1) @binding(5) var normal_map: texture_2d<f32>;
@group(1) @binding(6) var alpha_map: texture_2d<f32>;
@group(1) @binding(7) var displacement_map: texture_2d<f32>;
@group(1) @binding(8) var color_sampler: sampler;
@group(1) @binding(9) var ao_sampler: sampler;
@group(1) @binding(10) var roughness_sampler: sampler;
@group(1) @binding(11) var metalness_sampler: sampler;
@group(1) @binding(12) var normal_sampler: sampler;
@group(1) @binding(13) var alpha_sampler: sampler;
@group(1) @binding(14) var displacement_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) normal_0: vec4<f32>,
    @location(8) normal_1: vec4<f32>,
    @location(9) normal_2: vec4<f32>,
    @location(10) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) view_depth: f32,
    @location(4) receive_shadow: f32,
};

fn map_uv(uv: vec2<f32>, slot: u32) -> vec2<f32> {
    let p = vec3<f32>(uv, 1.0);
    return vec2<f32>(
        dot(material.uv_rows[slot * 2u].xyz, p),
        dot(material.uv_rows[slot * 2u + 1u].xyz, p),
    );
}

// Images are stored top row first; uv v grows upward.
fn texel(uv: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(uv.x, 1.0 - uv.y);
}

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let normal_matrix = mat3x3<f32>(
        instance.normal_0.xyz,
        instance.normal_1.xyz,
        instance.normal_2.xyz,
    );

    let height = textureSampleLevel(
        displacement_map,
        displacement_sampler,
        texel(map_uv(vertex.uv, 6u)),
        0.0,
    ).r;
    let offset = (height * material.params.z + material.params.w) * material.maps_b.z;
    let world = model * vec4<f32>(vertex.position + vertex.normal * offset, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = normal_matrix * vertex.normal;
    out.uv = vertex.uv;
    out.view_depth = -(frame.view * world).z;
    out.receive_shadow = instance.params.x;
    return out;
}

// Tangent frame from screen-space derivatives.
fn perturb_normal(position: vec3<f32>, normal: vec3<f32>, uv: vec2<f32>, map_normal: vec3<f32>) -> vec3<f32> {
    let q0 = dpdx(position);
    let q1 = dpdy(position);
    let st0 = dpdx(uv);
    let st1 = dpdy(uv);
    let q1perp = cross(q1, normal);
    let q0perp = cross(normal, q0);
    let t = q1perp * st0.x + q0perp * st1.x;
    let b = q1perp * st0.y + q0perp * st1.y;
    let det = max(dot(t, t), dot(b, b));
    let scale = select(inverseSqrt(det), 0.0, det == 0.0);
    return normalize(t * (map_normal.x * scale) + b * (map_normal.y * scale) + normal * map_normal.z);
}

fn shadow_factor(world_position: vec3<f32>) -> f32 {
    let clip = frame.light_view_proj * vec4<f32>(world_position, 1.0);
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, -ndc.y * 0.5 + 0.5);
    if (any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0) {
        return 1.0;
    }
    let depth = ndc.z - frame.shadow.x;
    let texel_size = frame.shadow.y;
    var lit = 0.0;
    for (var x = -1; x <= 1; x++) {
        for (var y = -1; y <= 1; y++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel_size;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, depth);
        }
    }
    return lit / 9.0;
}

fn distance_attenuation(d: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(d, decay), 0.01);
    if (cutoff > 0.0) {
        let r = d / cutoff;
        let s = clamp(1.0 - r * r * r * r, 0.0, 1.0);
        falloff *= s * s;
    }
    return falloff;
}

fn brdf_ggx(l: vec3<f32>, v: vec3<f32>, n: vec3<f32>, f0: vec3<f32>, roughness: f32) -> vec3<f32> {
    let alpha = roughness * roughness;
    let a2 = alpha * alpha;
    let h = normalize(l + v);
    let dot_nl = clamp(dot(n, l), 0.0, 1.0);
    let dot_nv = clamp(dot(n, v), 0.0, 1.0);
    let dot_nh = clamp(dot(n, h), 0.0, 1.0);
    let dot_vh = clamp(dot(v, h), 0.0, 1.0);

    let fresnel = f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - dot_vh, 5.0);
    let gv = dot_nl * sqrt(a2 + (1.0 - a2) * dot_nv * dot_nv);
    let gl = dot_nv * sqrt(a2 + (1.0 - a2) * dot_nl * dot_nl);
    let visibility = 0.5 / max(gv + gl, 1e-6);
    let denom = dot_nh * dot_nh * (a2 - 1.0) + 1.0;
    let distribution = RECIPROCAL_PI * a2 / (denom * denom);
    return fresnel * (visibility * distribution);
}

fn direct_light(
    l: vec3<f32>,
    radiance: vec3<f32>,
    n: vec3<f32>,
    v: vec3<f32>,
    diffuse_color: vec3<f32>,
    specular_color: vec3<f32>,
    roughness: f32,
) -> vec3<f32> {
    let irradiance = clamp(dot(n, l), 0.0, 1.0) * radiance;
    return irradiance * (diffuse_color * RECIPROCAL_PI + brdf_ggx(l, v, n, specular_color, roughness));
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal_uv = map_uv(in.uv, 4u);
    let base_sample = textureSample(color_map, color_sampler, texel(map_uv(in.uv, 0u)));
    let ao_sample = textureSample(ao_map, ao_sampler, texel(map_uv(in.uv, 1u))).r;
    let roughness_sample = textureSample(roughness_map, roughness_sampler, texel(map_uv(in.uv, 2u))).g;
    let metalness_sample = textureSample(metalness_map, metalness_sampler, texel(map_uv(in.uv, 3u))).b;
    let normal_sample = textureSample(normal_map, normal_sampler, texel(normal_uv)).xyz * 2.0 - 1.0;
    let alpha_sample = textureSample(alpha_map, alpha_sampler, texel(map_uv(in.uv, 5u))).g;

    let base = material.color.rgb * mix(vec3<f32>(1.0), base_sample.rgb, material.maps_a.x);
    let opacity = material.color.a
        * mix(1.0, base_sample.a, material.maps_a.x)
        * mix(1.0, alpha_sample, material.maps_b.y);
    let ao = mix(1.0, ao_sample, material.maps_a.y);
    let metalness = material.params.y * mix(1.0, metalness_sample, material.maps_a.w);

    let geometry_normal = normalize(in.world_normal);
    let mapped = perturb_normal(in.world_position, geometry_normal, normal_uv, normal_sample);
    let n = normalize(mix(geometry_normal, mapped, material.maps_b.x));

    let dxy = max(abs(dpdx(geometry_normal)), abs(dpdy(geometry_normal)));
    let geometry_roughness = max(max(dxy.x, dxy.y), dxy.z);
    let roughness = min(
        max(material.params.x * mix(1.0, roughness_sample, material.maps_a.z), 0.0525) + geometry_roughness,
        1.0,
    );

    let v = normalize(frame.camera_position.xyz - in.world_position);
    let diffuse_color = base * (1.0 - metalness);
    let specular_color = mix(vec3<f32>(0.04), base, metalness);
    let shadow = select(1.0, shadow_factor(in.world_position), in.receive_shadow > 0.5 && frame.shadow.z > 0.5);

    var direct = vec3<f32>(0.0);
    for (var i = 0u; i < min(frame.counts.x, MAX_DIRECTIONAL); i++) {
        var radiance = frame.directional_radiance[i].rgb;
        if (frame.directional_direction[i].w > 0.5) {
            radiance *= shadow;
        }
        let l = normalize(frame.directional_direction[i].xyz);
        direct += direct_light(l, radiance, n, v, diffuse_color, specular_color, roughness);
    }
    for (var i = 0u; i < min(frame.counts.y, MAX_POINT); i++) {
        let to_light = frame.point_position[i].xyz - in.world_position;
        let d = length(to_light);
        let l = to_light / max(d, 1e-4);
        let radiance = frame.point_radiance[i].rgb
            * distance_attenuation(d, frame.point_position[i].w, frame.point_radiance[i].w);
        direct += direct_light(l, radiance, n, v, diffuse_color, specular_color, roughness);
    }

    let indirect = frame.ambient.rgb * diffuse_color * RECIPROCAL_PI * ao;
    var color = direct + indirect + material.emissive.rgb;

    let density = frame.fog.w;
    let fog_factor = 1.0 - exp(-density * density * in.view_depth * in.view_depth);
    color = mix(color, frame.fog.rgb, clamp(fog_factor, 0.0, 1.0));
    return vec4<f32>(color, opacity);
}
"#;

/// Depth-only pass from the shadow-casting light.
pub const SHADOW_SHADER: &str = r#"
struct Shadow {
    light_view_proj: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> shadow: Shadow;

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

@vertex
fn vs_shadow(@location(0) position: vec3<f32>, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return shadow.light_view_proj * model * vec4<f32>(position, 1.0);
}
"#;

/// Preetham daylight sky on the inside of a box.
pub const SKY_SHADER: &str = r#"
const PI: f32 = 3.141592653589793;
const UP: vec3<f32> = vec3<f32>(0.0, 1.0, 0.0);
const RAYLEIGH_ZENITH_LENGTH: f32 = 8.4e3;
const MIE_ZENITH_LENGTH: f32 = 1.25e3;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.9999566769464484;
const THREE_OVER_SIXTEEN_PI: f32 = 0.05968310365946075;
const ONE_OVER_FOUR_PI: f32 = 0.07957747154594767;

struct Sky {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    sun_direction: vec4<f32>,
    beta_r: vec4<f32>,
    beta_m: vec4<f32>,
};

@group(0) @binding(0) var<uniform> sky: Sky;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
};

@vertex
fn vs_sky(@location(0) position: vec3<f32>) -> SkyOutput {
    let world = position * sky.camera_position.w;
    let clip = sky.view_proj * vec4<f32>(world, 1.0);
    var out: SkyOutput;
    // Pin to the far plane.
    out.clip_position = clip.xyww;
    out.world_position = world;
    return out;
}

fn rayleigh_phase(cos_theta: f32) -> f32 {
    return THREE_OVER_SIXTEEN_PI * (1.0 + cos_theta * cos_theta);
}

fn hg_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let inverse = 1.0 / pow(1.0 - 2.0 * g * cos_theta + g2, 1.5);
    return ONE_OVER_FOUR_PI * ((1.0 - g2) * inverse);
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let sun = sky.sun_direction.xyz;
    let sun_e = sky.sun_direction.w;
    let sun_fade = sky.beta_r.w;
    let beta_r = sky.beta_r.xyz;
    let beta_m = sky.beta_m.xyz;
    let g = sky.beta_m.w;

    let direction = normalize(in.world_position - sky.camera_position.xyz);

    // Optical length through the atmosphere.
    let zenith_angle = acos(max(0.0, dot(UP, direction)));
    let inverse = 1.0 / (cos(zenith_angle) + 0.15 * pow(93.885 - (zenith_angle * 180.0 / PI), -1.253));
    let s_r = RAYLEIGH_ZENITH_LENGTH * inverse;
    let s_m = MIE_ZENITH_LENGTH * inverse;

    let fex = exp(-(beta_r * s_r + beta_m * s_m));

    let cos_theta = dot(direction, sun);
    let beta_r_theta = beta_r * rayleigh_phase(cos_theta * 0.5 + 0.5);
    let beta_m_theta = beta_m * hg_phase(cos_theta, g);
    let scatter = sun_e * ((beta_r_theta + beta_m_theta) / (beta_r + beta_m));

    var lin = pow(scatter * (1.0 - fex), vec3<f32>(1.5));
    lin *= mix(
        vec3<f32>(1.0),
        pow(scatter * fex, vec3<f32>(0.5)),
        clamp(pow(1.0 - dot(UP, sun), 5.0), 0.0, 1.0),
    );

    var l0 = vec3<f32>(0.1) * fex;
    let sundisk = smoothstep(SUN_ANGULAR_DIAMETER_COS, SUN_ANGULAR_DIAMETER_COS + 0.00002, cos_theta);
    l0 += sun_e * 19000.0 * fex * sundisk;

    let tex = (lin + l0) * 0.04 + vec3<f32>(0.0, 0.0003, 0.00075);
    let color = pow(tex, vec3<f32>(1.0 / (1.2 + 1.2 * sun_fade)));
    return vec4<f32>(color, 1.0);
}
"#;
