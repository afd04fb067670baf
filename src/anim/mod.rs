//! Animation curves, tangent solving, layer blending and resampling.
//!
//! - [`AnimationCurve`] / [`CurveCursor`] - keyframes, Hermite evaluation and key lookup
//! - [`KeyFlags`] - per-key interpolation and tangent flags
//! - [`blend_field`] - layer blend modes
//! - [`post_process_animations`] - resampling stacks into [`Animation`] outputs

mod blend;
mod curve;
mod flags;
mod output;
mod sample;
mod tangent;

pub use blend::{blend_channel, blend_field, lerp, BlendShapeChannels, MAX_BLEND_SHAPE_CHANNELS};
pub use curve::{hermite, inverse_lerp, AnimationCurve, CurveCursor, KeyTangent};
pub use flags::{Extrapolation, ExtrapolationMode, KeyFlags};
pub use output::{
    add_quaternion_key, blend_shape_property, Animation, AnimationCurveBinding, GenericCurve, Keyframe,
    LOCAL_POSITION, LOCAL_ROTATION, LOCAL_SCALE, VISIBILITY,
};
pub use sample::{post_process_animations, sample_times};
pub use tangent::{pack_weights, solve_tangents, unpack_weights};
