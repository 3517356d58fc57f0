#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const PI: f64 = 3.141592653589793238462643;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const HALF_PI: f64 = 1.5707963267948966192313216;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const TWOPI: f64 = 6.283185307179586476925287;

#[allow(clippy::excessive_precision)]
pub const DEG_TO_RAD: f64 = 1.745329251994329576923691e-2;

#[allow(clippy::excessive_precision)]
pub const RAD_TO_DEG: f64 = 57.29577951308232087679815;

/// Square degrees in one steradian.
pub const SQ_DEG_PER_STERADIAN: f64 = RAD_TO_DEG * RAD_TO_DEG;

/// Dot-product slack used when testing points that sit on a boundary circle.
pub const BOUNDARY_TOLERANCE: f64 = 1.0e-10;

/// Cutoffs this far beyond `[-1, 1]` are clamped instead of rejected.
pub const CUTOFF_SLACK: f64 = 1.0e-12;

/// Deepest HTM level; htmids at this level use 62 bits.
pub const MAX_HTM_LEVEL: u32 = 30;
