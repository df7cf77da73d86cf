use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seeded 3D gradient noise.
///
/// Classic permutation-table noise: a 256-entry table shuffled by the seed,
/// doubled so lattice hashing never wraps mid-lookup. Immutable once built;
/// two instances with the same seed produce identical fields, which is what
/// lets every render worker own a private copy.
pub struct Perlin3 {
    perm: [u8; 512],
}

impl Perlin3 {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut base = [0u8; 256];
        for (i, slot) in base.iter_mut().enumerate() {
            *slot = i as u8;
        }
        for i in (1..256).rev() {
            let j = rng.gen_range(0..=i);
            base.swap(i, j);
        }
        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&base);
        perm[256..].copy_from_slice(&base);
        Self { perm }
    }

    /// Sample the field at a point. Deterministic, continuous, in [-1, 1].
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let xi = (x.floor() as i64).rem_euclid(256) as usize;
        let yi = (y.floor() as i64).rem_euclid(256) as usize;
        let zi = (z.floor() as i64).rem_euclid(256) as usize;

        let xf = x - x.floor();
        let yf = y - y.floor();
        let zf = z - z.floor();

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let b = p[xi + 1] as usize + yi;
        let aa = p[a] as usize + zi;
        let ab = p[a + 1] as usize + zi;
        let ba = p[b] as usize + zi;
        let bb = p[b + 1] as usize + zi;

        let n = lerp(
            lerp(
                lerp(
                    grad(p[aa], xf, yf, zf),
                    grad(p[ba], xf - 1.0, yf, zf),
                    u,
                ),
                lerp(
                    grad(p[ab], xf, yf - 1.0, zf),
                    grad(p[bb], xf - 1.0, yf - 1.0, zf),
                    u,
                ),
                v,
            ),
            lerp(
                lerp(
                    grad(p[aa + 1], xf, yf, zf - 1.0),
                    grad(p[ba + 1], xf - 1.0, yf, zf - 1.0),
                    u,
                ),
                lerp(
                    grad(p[ab + 1], xf, yf - 1.0, zf - 1.0),
                    grad(p[bb + 1], xf - 1.0, yf - 1.0, zf - 1.0),
                    u,
                ),
                v,
            ),
            w,
        );
        n.clamp(-1.0, 1.0)
    }
}

// Quintic fade: zero first and second derivative at the lattice points.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    match hash & 15 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x + z,
        5 => -x + z,
        6 => x - z,
        7 => -x - z,
        8 => y + z,
        9 => -y + z,
        10 => y - z,
        11 => -y - z,
        12 => y + x,
        13 => -y + z,
        14 => y - x,
        _ => -y - z,
    }
}
