pub mod float_ext;
pub mod log_setup;
pub mod parallel;
pub mod test_utils;

/// Absolute tolerance used by [`float_ext::FloatExt::approximately_eq`].
pub const EPSILON: f64 = 1e-6;
