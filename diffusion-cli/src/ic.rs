use clap::ValueEnum;
use rand::Rng;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum IcType {
    /// Cool plate with a hot centered rectangle.
    HotRect,
    /// Cool plate with a hot centered disk.
    HotDisk,
    /// Random Gaussian blobs (seeded).
    Gaussians,
}

impl IcType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IcType::HotRect => "hot_rect",
            IcType::HotDisk => "hot_disk",
            IcType::Gaussians => "gaussians",
        }
    }
}

/// Temperatures and extent of the hot region.
#[derive(Clone, Copy, Debug)]
pub struct Plate {
    pub ambient: f64,
    pub hot: f64,
    /// Share of each axis covered by the hot region, in `(0, 1]`.
    pub fraction: f64,
}

/// Row-major `nx × ny` field. Border cells are left at `ambient`.
pub fn generate_ic<R: Rng>(rng: &mut R, nx: usize, ny: usize, ic: IcType, plate: &Plate) -> Vec<f64> {
    let mut f = vec![plate.ambient; nx * ny];

    match ic {
        IcType::HotRect => {
            let h = ((nx as f64 * plate.fraction).round() as usize).clamp(1, nx - 2);
            let w = ((ny as f64 * plate.fraction).round() as usize).clamp(1, ny - 2);
            let i0 = (nx - h) / 2;
            let j0 = (ny - w) / 2;

            for i in i0.max(1)..(i0 + h).min(nx - 1) {
                for j in j0.max(1)..(j0 + w).min(ny - 1) {
                    f[i * ny + j] = plate.hot;
                }
            }
        }

        IcType::HotDisk => {
            let ci = (nx as f64 - 1.0) / 2.0;
            let cj = (ny as f64 - 1.0) / 2.0;
            let r = (0.5 * plate.fraction * nx.min(ny) as f64).max(0.5);
            let r2 = r * r;

            for i in 1..nx - 1 {
                for j in 1..ny - 1 {
                    let di = i as f64 - ci;
                    let dj = j as f64 - cj;
                    if di * di + dj * dj <= r2 {
                        f[i * ny + j] = plate.hot;
                    }
                }
            }
        }

        IcType::Gaussians => {
            let mut bumps = vec![0.0f64; nx * ny];
            let blobs = rng.gen_range(1..=3);
            for _ in 0..blobs {
                let ci = rng.gen_range(0.15..0.85) * (nx as f64 - 1.0);
                let cj = rng.gen_range(0.15..0.85) * (ny as f64 - 1.0);
                let sigma = rng.gen_range(0.5..2.0) * plate.fraction * nx.min(ny) as f64 / 2.0;
                let sigma = sigma.max(1.0);
                let amp = rng.gen_range(0.6..1.0);

                for i in 1..nx - 1 {
                    for j in 1..ny - 1 {
                        let di = i as f64 - ci;
                        let dj = j as f64 - cj;
                        let r2 = di * di + dj * dj;
                        bumps[i * ny + j] += amp * (-0.5 * r2 / (sigma * sigma)).exp();
                    }
                }
            }

            normalize_01(&mut bumps);
            for (v, b) in f.iter_mut().zip(&bumps) {
                *v += (plate.hot - plate.ambient) * b;
            }
        }
    }

    f
}

fn normalize_01(f: &mut [f64]) {
    let mx = f.iter().copied().fold(0.0f64, f64::max);
    if mx > 0.0 {
        for v in f.iter_mut() {
            *v = (*v / mx).clamp(0.0, 1.0);
        }
    }
}
