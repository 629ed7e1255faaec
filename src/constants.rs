// ABOUTME: Centralized geological constants - elevation bounds, per-process time multipliers
// ABOUTME: Single source of truth so call sites never hardcode a time-scale or clamp bound

/// Hard clamp on elevation magnitude (m). All field writes are clamped to this range.
pub const E_MAX: f32 = 2048.0;

/// Expected elevation magnitude (m). Values beyond this are rare and trigger a
/// rate-limited diagnostic, but are not themselves clamped further than `E_MAX`.
pub const E_EXPECTED_MAX: f32 = 1800.0;

/// Magnitude above which an elevation write is considered an "extreme" outlier
/// worth a diagnostic event, independent of the hard clamp.
pub const E_EXTREME_THRESHOLD: f32 = 10_000.0;

/// Base simulation step, in years.
pub const T_BASE_YEARS: f32 = 1000.0;

/// Process time-scale multipliers, converting `T_BASE_YEARS` into each
/// process's own effective time for a single `step()`.
pub const TAU_TECTONIC: f32 = 1000.0;
pub const TAU_EROSION: f32 = 100.0;
pub const TAU_WATER: f32 = 10.0;
pub const TAU_DETAIL: f32 = 1.0;
pub const TAU_VOLCANIC: f32 = 5000.0;

pub const MANTLE_STRESS_MAX: f32 = 20.0;
pub const CRUST_STRESS_MAX: f32 = 50.0;
pub const CRUST_THICKNESS_MAX_KM: f32 = 80.0;
pub const CRUST_THICKNESS_STANDARD_KM: f32 = 35.0;

/// Sum of all per-process per-step elevation caps (property 7 in spec §8).
pub const MAX_ELEVATION_DELTA_PER_STEP: f32 = 1000.0;

/// Clamp an elevation value to the hard bound, returning the clamped value.
#[inline]
pub fn clamp_elevation(e: f32) -> f32 {
    e.clamp(-E_MAX, E_MAX)
}
