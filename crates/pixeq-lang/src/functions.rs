//! Built-in function table.
//!
//! Every callable name maps to a [`FunctionDef`] describing how it is written
//! into the shader and, where it has a scalar meaning, how it evaluates to a
//! float. Lookup is by lower-case name and argument count, so `atan(y)` and
//! `atan(y, x)` are distinct entries.

/// Shader emission shape of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// `target(a,b,..)`
    Call(&'static str),
    /// `(a).<swizzle>` (read one channel and broadcast it).
    Swizzle(&'static str),
    /// `f4(target((a).xyz,..))`: 3-vector operation, scalar result.
    Vec3Scalar(&'static str),
    /// `float4(target((a).xyz,..),1.0)`: 3-vector operation, vector result.
    Vec3Vector(&'static str),
    /// `f4(target((a).xyz)?1.0:0.0)`: boolean reduction over rgb.
    Vec3Test(&'static str),
    /// `powEx(max(a,f4(0.0)),b)`
    ClampedPow,
    /// `float4((a).r,(b).r,(c).r,1.0)`
    ComposeRgb,
    /// `lerp(a,b,(t).r)`
    LerpScalar,
    /// Fixed shader text, used by zero-argument intrinsics.
    Literal(&'static str),
}

/// Numeric behaviour on broadcast scalars.
#[derive(Debug, Clone, Copy)]
pub enum ScalarFn {
    Unary(fn(f32) -> f32),
    Binary(fn(f32, f32) -> f32),
    Tertiary(fn(f32, f32, f32) -> f32),
}

impl ScalarFn {
    /// Apply to `args`; `None` if the argument count does not match.
    pub fn apply(&self, args: &[f32]) -> Option<f32> {
        match (self, args) {
            (ScalarFn::Unary(f), [a]) => Some(f(*a)),
            (ScalarFn::Binary(f), [a, b]) => Some(f(*a, *b)),
            (ScalarFn::Tertiary(f), [a, b, c]) => Some(f(*a, *b, *c)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionDef {
    pub name: &'static str,
    pub arity: usize,
    pub emit: Emit,
    pub eval: Option<ScalarFn>,
}

const fn def(name: &'static str, arity: usize, emit: Emit, eval: Option<ScalarFn>) -> FunctionDef {
    FunctionDef {
        name,
        arity,
        emit,
        eval,
    }
}

const fn unary(name: &'static str, emit: Emit, f: fn(f32) -> f32) -> FunctionDef {
    def(name, 1, emit, Some(ScalarFn::Unary(f)))
}

const fn binary(name: &'static str, emit: Emit, f: fn(f32, f32) -> f32) -> FunctionDef {
    def(name, 2, emit, Some(ScalarFn::Binary(f)))
}

fn identity(v: f32) -> f32 {
    v
}

fn frac(v: f32) -> f32 {
    v - v.floor()
}

/// HLSL `sign`: -1, 0 or 1.
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn clamped_pow(base: f32, exponent: f32) -> f32 {
    pixeq_core::pow_ex(base.max(0.0), exponent)
}

fn fmod(a: f32, b: f32) -> f32 {
    a % b
}

/// HLSL `step(y, x)`: 1 where `x >= y`.
fn step(edge: f32, x: f32) -> f32 {
    flag(x >= edge)
}

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn equal(a: f32, b: f32) -> f32 {
    flag(a == b)
}

fn bigger(a: f32, b: f32) -> f32 {
    flag(a > b)
}

fn smaller(a: f32, b: f32) -> f32 {
    flag(a < b)
}

fn bigger_eq(a: f32, b: f32) -> f32 {
    flag(a >= b)
}

fn smaller_eq(a: f32, b: f32) -> f32 {
    flag(a <= b)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

pub static FUNCTIONS: &[FunctionDef] = &[
    // intrinsics
    def("pos", 0, Emit::Literal("float4(coord.x,coord.y,0.0,1.0)"), None),
    def("layer", 0, Emit::Literal("f4(layer)"), None),
    def("level", 0, Emit::Literal("f4(level)"), None),
    // channel extraction
    unary("alpha", Emit::Swizzle("aaaa"), identity),
    unary("a", Emit::Swizzle("aaaa"), identity),
    unary("w", Emit::Swizzle("aaaa"), identity),
    unary("red", Emit::Swizzle("rrrr"), identity),
    unary("r", Emit::Swizzle("rrrr"), identity),
    unary("x", Emit::Swizzle("rrrr"), identity),
    unary("green", Emit::Swizzle("gggg"), identity),
    unary("g", Emit::Swizzle("gggg"), identity),
    unary("y", Emit::Swizzle("gggg"), identity),
    unary("blue", Emit::Swizzle("bbbb"), identity),
    unary("b", Emit::Swizzle("bbbb"), identity),
    unary("z", Emit::Swizzle("bbbb"), identity),
    // color space
    def("tosrgb", 1, Emit::Call("toSrgb"), None),
    def("fromsrgb", 1, Emit::Call("fromSrgb"), None),
    def("srgbasunorm", 1, Emit::Call("srgbAsUnorm"), None),
    def("srgbassnorm", 1, Emit::Call("srgbAsSnorm"), None),
    // rgb vector functions
    def("normalize", 1, Emit::Vec3Vector("normalize"), None),
    def("length", 1, Emit::Vec3Scalar("length"), None),
    def("all", 1, Emit::Vec3Test("all"), None),
    def("any", 1, Emit::Vec3Test("any"), None),
    // shader intrinsics
    unary("abs", Emit::Call("abs"), f32::abs),
    unary("sin", Emit::Call("sin"), f32::sin),
    unary("cos", Emit::Call("cos"), f32::cos),
    unary("tan", Emit::Call("tan"), f32::tan),
    unary("asin", Emit::Call("asin"), f32::asin),
    unary("acos", Emit::Call("acos"), f32::acos),
    unary("atan", Emit::Call("atan"), f32::atan),
    unary("exp", Emit::Call("exp"), f32::exp),
    unary("exp2", Emit::Call("exp2"), f32::exp2),
    unary("log", Emit::Call("log"), f32::ln),
    unary("log2", Emit::Call("log2"), f32::log2),
    unary("log10", Emit::Call("log10"), f32::log10),
    unary("sqrt", Emit::Call("sqrt"), f32::sqrt),
    unary("floor", Emit::Call("floor"), f32::floor),
    unary("ceil", Emit::Call("ceil"), f32::ceil),
    unary("frac", Emit::Call("frac"), frac),
    unary("trunc", Emit::Call("trunc"), f32::trunc),
    unary("sign", Emit::Call("sign"), sign),
    unary("radians", Emit::Call("radians"), f32::to_radians),
    // binary
    binary("pow", Emit::ClampedPow, clamped_pow),
    binary("min", Emit::Call("min"), f32::min),
    binary("max", Emit::Call("max"), f32::max),
    binary("atan2", Emit::Call("atan2"), f32::atan2),
    binary("atan", Emit::Call("atan2"), f32::atan2),
    binary("fmod", Emit::Call("fmod"), fmod),
    binary("step", Emit::Call("step"), step),
    def("dot", 2, Emit::Vec3Scalar("dot"), None),
    def("cross", 2, Emit::Vec3Vector("cross"), None),
    def("distance", 2, Emit::Vec3Scalar("distance"), None),
    // per-component comparisons returning 1.0 / 0.0
    binary("equal", Emit::Call("fequal"), equal),
    binary("bigger", Emit::Call("fbigger"), bigger),
    binary("smaller", Emit::Call("fsmaller"), smaller),
    binary("smallereq", Emit::Call("fsmallereq"), smaller_eq),
    binary("biggereq", Emit::Call("fbiggereq"), bigger_eq),
    // tertiary
    def("rgb", 3, Emit::ComposeRgb, None),
    def("lerp", 3, Emit::LerpScalar, Some(ScalarFn::Tertiary(lerp))),
    def("clamp", 3, Emit::Call("clamp"), Some(ScalarFn::Tertiary(clamp))),
];

/// Find the definition for `name` (case-insensitive) taking `arity` arguments.
pub fn lookup(name: &str, arity: usize) -> Option<&'static FunctionDef> {
    FUNCTIONS
        .iter()
        .find(|f| f.arity == arity && f.name.eq_ignore_ascii_case(name))
}

/// All names callable with `arity` arguments, in table order.
pub fn names_with_arity(arity: usize) -> impl Iterator<Item = &'static str> {
    FUNCTIONS
        .iter()
        .filter(move |f| f.arity == arity)
        .map(|f| f.name)
}
