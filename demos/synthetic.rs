use bpmll::{Bpmll, Dataset, TrainConfig};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> bpmll::Result<()> {
    // Synthetic two-feature, three-label problem: "left", "right", "central".
    let mut rng = StdRng::seed_from_u64(0);
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for _ in 0..200 {
        let x0: f64 = rng.gen_range(-1.0..1.0);
        let x1: f64 = rng.gen_range(-1.0..1.0);
        let left = if x0 < 0.0 { 1.0 } else { -1.0 };
        let right = if x0 >= 0.0 { 1.0 } else { -1.0 };
        let central = if x0.abs() < 0.4 { 1.0 } else { -1.0 };
        xs.push(vec![x0, x1]);
        ys.push(vec![left, right, central]);
    }
    let train = Dataset::from_rows(&xs, &ys)?;

    let mut model = Bpmll::new(TrainConfig {
        hidden_layers: vec![8],
        epochs: 200,
        learning_rate: 0.05,
        seed: 0,
        ..TrainConfig::default()
    })?;
    let report = model.fit(&train)?;
    println!(
        "final ranking loss {:.6} ({} degenerate examples skipped)",
        report.final_loss, report.skipped_examples
    );

    for input in [[-0.8, 0.1], [0.1, -0.5], [0.9, 0.9]] {
        let p = model.predict(&input)?;
        println!(
            "x={input:?} labels={:?} confidences={:?} threshold={:.3}",
            p.bipartition(),
            p.confidences()
                .iter()
                .map(|c| (c * 1000.0).round() / 1000.0)
                .collect::<Vec<_>>(),
            p.threshold()
        );
    }

    Ok(())
}
