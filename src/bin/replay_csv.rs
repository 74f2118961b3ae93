use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use gestos_mano::csv_loader::load_frames_from_csv;
use gestos_mano::{GestureClassifier, GestureLabel, LandmarkList};

struct ReplayOptions {
    dump_states: bool,
}

fn parse_args() -> Result<(PathBuf, ReplayOptions)> {
    let mut dump_states = false;
    let mut csv_path: Option<PathBuf> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump-states" => dump_states = true,
            _ => {
                if csv_path.is_some() {
                    bail!("Uso: replay_csv [--dump-states] <archivo.csv>");
                }
                csv_path = Some(PathBuf::from(arg));
            }
        }
    }

    let csv_path = csv_path.ok_or_else(|| anyhow!("Debes especificar un archivo CSV"))?;
    Ok((csv_path, ReplayOptions { dump_states }))
}

fn main() -> Result<()> {
    gestos_mano::init_tracing();
    let (csv_path, opts) = parse_args()?;
    println!("🎞️  Reproduciendo landmarks desde {:?}", csv_path);

    let frames = load_frames_from_csv(&csv_path)?;
    println!("ℹ️  {} frames cargados\n", frames.len());

    let classifier = GestureClassifier::new();
    let mut counts: BTreeMap<GestureLabel, usize> = BTreeMap::new();
    let mut rejected = 0usize;

    for frame in &frames {
        let landmarks = match LandmarkList::from_points(&frame.landmarks) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                rejected += 1;
                eprintln!("❌ Frame {} rechazado: {}", frame.timestamp, e);
                continue;
            }
        };

        let result = classifier.explain(&landmarks, frame.handedness);
        *counts.entry(result.label).or_insert(0) += 1;

        if opts.dump_states {
            println!(
                "  {:>10}  {:<5}  dedos={}  regla={:>2}  {}",
                frame.timestamp, frame.handedness, result.states, result.rule, result.label
            );
        } else {
            println!("  {:>10}  {}", frame.timestamp, result.label);
        }
    }

    println!("\n📊 Resumen:");
    for (label, count) in &counts {
        println!("  {:<10} {:>6}", label.as_str(), count);
    }
    if rejected > 0 {
        println!("  {:<10} {:>6}", "rechazados", rejected);
    }

    Ok(())
}
