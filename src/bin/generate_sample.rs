use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Uniform index in [0, n).
    fn next_index(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }
}

/// Smooth CTE baseline: slow rise plus a sigmoid phase transition whose
/// center shifts with the heating rate.
fn cte_baseline(temperature: f64, transition_center: f64) -> f64 {
    let rise = 1.15e-5 + 2.0e-9 * (temperature - 25.0);
    let step = 4.0e-6 / (1.0 + (-(temperature - transition_center) / 60.0).exp());
    rise + step
}

fn generate_series(
    temperatures: &[f64],
    transition_center: f64,
    noise_level: f64,
    n_spikes: usize,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    let mut cte: Vec<f64> = temperatures
        .iter()
        .map(|&t| cte_baseline(t, transition_center) + rng.gauss(0.0, noise_level))
        .collect();

    // Inject obvious measurement spikes at random interior positions.
    for _ in 0..n_spikes {
        let idx = 1 + rng.next_index(cte.len() - 2);
        let sign = if rng.next_f64() < 0.5 { -1.0 } else { 1.0 };
        cte[idx] += sign * (2.0e-6 + 4.0e-6 * rng.next_f64());
    }

    cte
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // Temperature sweep: 25 °C → 1000 °C over 400 readings.
    let n_rows = 400;
    let temperatures: Vec<f64> = (0..n_rows)
        .map(|i| 25.0 + i as f64 * (1000.0 - 25.0) / (n_rows - 1) as f64)
        .collect();

    // (label, transition center, spike count) per heating rate: faster rates
    // shift the transition up and pick up more noise.
    let runs = [
        ("1K/min", 600.0, 6),
        ("3K/min", 630.0, 8),
        ("6K/min", 660.0, 10),
        ("10K/min", 700.0, 12),
    ];

    let series: Vec<Vec<f64>> = runs
        .iter()
        .map(|&(_, center, n_spikes)| {
            generate_series(&temperatures, center, 5.0e-8, n_spikes, &mut rng)
        })
        .collect();

    let output_path = "sample_data.csv";
    let mut wtr = csv::Writer::from_path(output_path).context("creating output file")?;

    let mut rate_header = Vec::new();
    let mut field_header = Vec::new();
    for &(label, _, _) in &runs {
        rate_header.push(label);
        rate_header.push(label);
        field_header.push("Temperature");
        field_header.push("CTE");
    }
    wtr.write_record(&rate_header).context("writing rate header")?;
    wtr.write_record(&field_header).context("writing field header")?;

    for row in 0..n_rows {
        let mut record = Vec::with_capacity(runs.len() * 2);
        for cte in &series {
            record.push(temperatures[row].to_string());
            record.push(cte[row].to_string());
        }
        wtr.write_record(&record)
            .with_context(|| format!("writing row {row}"))?;
    }
    wtr.flush().context("flushing CSV")?;

    println!(
        "Wrote {} heating rates ({n_rows} readings each) to {output_path}",
        runs.len()
    );
    Ok(())
}
