//! Writes `<out>/hydrogen` and `<out>/deuterium` with small synthetic grids
//! that exercise every outcome of `isodiff`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use isodiff::data::model::{Grid, GridMeta};
use isodiff::data::writer::write_file;

fn gaussian_blob(x: f64, y: f64, cx: f64, cy: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-((x - cx).powi(2) + (y - cy).powi(2)) / (2.0 * sigma.powi(2))).exp()
}

/// A density field on a `rows x cols` lattice with spacing `h`, plus noise.
fn generate_field(
    rows: usize,
    cols: usize,
    h: f64,
    blobs: &[(f64, f64, f64, f64)],
    noise_level: f64,
    noise: &mut Noise,
) -> Result<Grid> {
    let mut values = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let (x, y) = (j as f64 * h, i as f64 * h);
            let signal: f64 = blobs
                .iter()
                .map(|&(cx, cy, sigma, amp)| gaussian_blob(x, y, cx, cy, sigma, amp))
                .sum();
            values.push(signal + noise.sample(noise_level));
        }
    }
    Ok(Grid::new(rows, cols, values)?)
}

/// Deterministic measurement noise: SplitMix64 uniforms through Box-Muller,
/// with the second deviate of each pair kept for the next draw.
struct Noise {
    state: u64,
    spare: Option<f64>,
}

impl Noise {
    fn seeded(seed: u64) -> Self {
        Noise {
            state: seed,
            spare: None,
        }
    }

    fn uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Zero-mean normal sample with the given standard deviation.
    fn sample(&mut self, std_dev: f64) -> f64 {
        let z = match self.spare.take() {
            Some(z) => z,
            None => {
                let r = (-2.0 * self.uniform().max(1e-15).ln()).sqrt();
                let theta = std::f64::consts::TAU * self.uniform();
                self.spare = Some(r * theta.sin());
                r * theta.cos()
            }
        };
        std_dev * z
    }
}

fn write(dir: &Path, name: &str, grid: &Grid, meta: &GridMeta) -> Result<()> {
    write_file(&dir.join(name), grid, meta)
}

fn main() -> Result<()> {
    env_logger::init();

    let out = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_grids"));
    let hydrogen = out.join("hydrogen");
    let deuterium = out.join("deuterium");
    std::fs::create_dir_all(&hydrogen).context("creating hydrogen directory")?;
    std::fs::create_dir_all(&deuterium).context("creating deuterium directory")?;

    let mut noise = Noise::seeded(42);
    let h = 0.1;
    let meta = GridMeta {
        dx: Some(h),
        dy: Some(h),
    };

    // The heavier isotope drifts slightly further each snapshot.
    let extensions = ["dat", "csv", "json", "parquet"];
    let mut written = 0;
    for (step, ext) in extensions.iter().enumerate() {
        let drift = 0.05 * step as f64;
        let hydrogen_blobs = [(2.0, 2.0, 0.6, 1.0), (4.0, 3.0, 0.4, 0.5)];
        let deuterium_blobs = [(2.0 + drift, 2.0, 0.6, 1.0), (4.0, 3.0 + drift, 0.4, 0.5)];

        let name = format!("snapshot_{step:04}.{ext}");
        let h_grid = generate_field(40, 60, h, &hydrogen_blobs, 0.001, &mut noise)?;
        let d_grid = generate_field(40, 60, h, &deuterium_blobs, 0.001, &mut noise)?;
        write(&hydrogen, &name, &h_grid, &meta)?;
        write(&deuterium, &name, &d_grid, &meta)?;
        written += 1;
    }

    // Only on the hydrogen side.
    let orphan = generate_field(40, 60, h, &[(3.0, 2.0, 0.5, 1.0)], 0.001, &mut noise)?;
    write(&hydrogen, "snapshot_0100.dat", &orphan, &meta)?;

    // Deuterium run used a coarser lattice for this one.
    let fine = generate_field(40, 60, h, &[(3.0, 2.0, 0.5, 1.0)], 0.001, &mut noise)?;
    let coarse = generate_field(
        20,
        30,
        2.0 * h,
        &[(3.0, 2.0, 0.5, 1.0)],
        0.001,
        &mut noise,
    )?;
    write(&hydrogen, "snapshot_0200.dat", &fine, &meta)?;
    write(
        &deuterium,
        "snapshot_0200.dat",
        &coarse,
        &GridMeta {
            dx: Some(2.0 * h),
            dy: Some(2.0 * h),
        },
    )?;

    // Truncated output that fails to parse.
    write(&hydrogen, "snapshot_0300.csv", &fine, &meta)?;
    std::fs::write(deuterium.join("snapshot_0300.csv"), "0.1,0.2,0.3\n0.4,")
        .context("writing truncated file")?;

    println!(
        "Wrote {written} comparable pairs and 3 problem files to {}",
        out.display()
    );
    Ok(())
}
