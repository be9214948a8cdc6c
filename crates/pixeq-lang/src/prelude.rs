//! Shader source the emitted expressions depend on.
//!
//! A host shader pastes [`texture_getters`] and [`helper_functions`] above
//! the function that evaluates the formula. That function must have `coord`
//! (`uint3`, pixel position) in scope and `layer`/`level` available as
//! globals. The colour-space converters (`toSrgb`, `fromSrgb`,
//! `srgbAsUnorm`, `srgbAsSnorm`) are supplied by the host.

/// Component-wise comparisons returning 1.0 / 0.0 instead of `bool4`.
const COMPARISONS: &[(&str, &str)] = &[
    ("fequal", "=="),
    ("fbigger", ">"),
    ("fsmaller", "<"),
    ("fbiggereq", ">="),
    ("fsmallereq", "<="),
];

const CONSTRUCTORS: &str = "\
float4 f4(float v) { return float4(v, v, v, v); }
float3 f3(float v) { return float3(v, v, v); }
float2 f2(float v) { return float2(v, v); }
";

// Same table as pixeq_core::pow_ex.
const POW_EX: &str = "\
float powExScalar(float b, float e)
{
    if(b == 0.0)
    {
        if(e == 0.0) return asfloat(0x7FC00000u);
        return e > 0.0 ? 0.0 : asfloat(0x7F800000u);
    }
    if(b > 0.0) return pow(b, e);
    if(frac(e) != 0.0) return asfloat(0x7FC00000u);
    float m = pow(-b, e);
    return fmod(e, 2.0) == 0.0 ? m : -m;
}
float4 powEx(float4 b, float4 e)
{
    float4 res;
    [unroll] for(int i = 0; i < 4; ++i)
        res[i] = powExScalar(b[i], e[i]);
    return res;
}
";

/// `f4`/`f3`/`f2`, the comparison family and `powEx`.
pub fn helper_functions() -> String {
    let mut src = String::from(CONSTRUCTORS);
    for (name, op) in COMPARISONS {
        src.push_str(&format!(
            "float4 {name}(float4 a, float4 b)\n\
             {{\n    \
                 float4 res = float4(0.0, 0.0, 0.0, 0.0);\n    \
                 [unroll] for(int i = 0; i < 4; ++i)\n        \
                     if(a[i] {op} b[i]) res[i] = 1.0;\n    \
                 return res;\n\
             }}\n"
        ));
    }
    src.push_str(POW_EX);
    src
}

/// Texture bindings `texture0..` and accessors `GetTexture0(coord)..` for
/// `num_images` slots.
pub fn texture_getters(num_images: u32) -> String {
    let mut src = String::new();
    for i in 0..num_images {
        src.push_str(&format!("Texture2DArray texture{i} : register(t{i});\n"));
    }
    for i in 0..num_images {
        src.push_str(&format!(
            "float4 GetTexture{i}(uint3 coord) {{ return texture{i}.Load(int4(coord.x, coord.y, layer, level)); }}\n"
        ));
    }
    src
}
