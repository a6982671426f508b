//! Physical constants (SI).

/// Speed of light in vacuum (m/s)
pub const C0: f64 = 299_792_458.0;

/// Permittivity of free space (F/m)
pub const EPS0: f64 = 8.854_187_812_8e-12;

/// Permeability of free space (H/m)
pub const MU0: f64 = 1.256_637_062_12e-6;
