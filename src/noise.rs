// ABOUTME: Hash-based multi-octave value noise used by field sampling and continent seeding
// ABOUTME: Deterministic in (x, z) only - callers inject entropy through field values, not a noise seed

/// Hash a pair of grid coordinates into `[0, 1)`. Pure bit-mixing, no RNG state.
#[inline]
fn hash2(ix: i64, iz: i64) -> f32 {
    let mut h = (ix.wrapping_mul(374_761_393)) ^ (iz.wrapping_mul(668_265_263));
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    ((h as u64 & 0xFF_FFFF) as f32) / (0x100_0000 as f32)
}

/// Smoothstep interpolation, matching the bicubic-adjacent smoothing the
/// field sampler uses elsewhere.
#[inline]
fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Single-octave value noise at the given frequency, bilinearly interpolated
/// between hashed lattice points, result in `[-1, 1]`.
fn value_noise(x: f32, z: f32, freq: f32) -> f32 {
    let fx = x * freq;
    let fz = z * freq;
    let ix = fx.floor();
    let iz = fz.floor();
    let tx = smooth(fx - ix);
    let tz = smooth(fz - iz);
    let ix = ix as i64;
    let iz = iz as i64;

    let h00 = hash2(ix, iz);
    let h10 = hash2(ix + 1, iz);
    let h01 = hash2(ix, iz + 1);
    let h11 = hash2(ix + 1, iz + 1);

    let a = h00 + (h10 - h00) * tx;
    let b = h01 + (h11 - h01) * tx;
    let v = a + (b - a) * tz;
    v * 2.0 - 1.0
}

/// 4-octave value noise, base frequency `0.01`, geometric amplitude decay of
/// 1/2 per octave, normalized into `[-1, 1]`. Used by `ContinuousField::sample_at`
/// for the organic perturbation term, and reused directly by the continent
/// generator for coastline/ridge/ocean shaping at caller-chosen frequencies.
pub fn n(x: f32, z: f32) -> f32 {
    octave_noise(x, z, 0.01, 4, 0.5)
}

/// General multi-octave value noise with a caller-chosen base frequency,
/// octave count and persistence, normalized into `[-1, 1]`.
pub fn octave_noise(x: f32, z: f32, base_freq: f32, octaves: u32, persistence: f32) -> f32 {
    let mut total = 0.0f32;
    let mut amplitude = 1.0f32;
    let mut max_amplitude = 0.0f32;
    let mut freq = base_freq;

    for _ in 0..octaves {
        total += value_noise(x, z, freq) * amplitude;
        max_amplitude += amplitude;
        amplitude *= persistence;
        freq *= 2.0;
    }

    if max_amplitude > 0.0 {
        total / max_amplitude
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_bounded() {
        for i in 0..500 {
            let x = i as f32 * 37.2;
            let z = i as f32 * -11.9;
            let v = n(x, z);
            assert!((-1.0..=1.0).contains(&v), "n({x},{z}) = {v} out of range");
        }
    }

    #[test]
    fn noise_is_deterministic() {
        assert_eq!(n(123.4, -56.7), n(123.4, -56.7));
        assert_eq!(octave_noise(10.0, 10.0, 2e-4, 3, 0.6), octave_noise(10.0, 10.0, 2e-4, 3, 0.6));
    }

    #[test]
    fn noise_varies_spatially() {
        let a = n(0.0, 0.0);
        let b = n(5000.0, 5000.0);
        assert!((a - b).abs() > 1e-6);
    }
}
