/// Generate Idea — samples title/pitch pairs from saved model snapshots.
///
/// Usage: generate_idea --models <dir> [--temperature T] [--count N] [--seed S]
use std::env;
use std::path::Path;
use std::process;

use pitch_engine::core::engine::{
    PitchEngine, DEFAULT_TEMPERATURE, PITCH_SNAPSHOT, TITLE_SNAPSHOT,
};
use pitch_engine::core::markov::load_model;

const USAGE: &str =
    "Usage: generate_idea --models <dir> [--temperature T] [--count N] [--seed S]";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut models_dir = None;
    let mut temperature = DEFAULT_TEMPERATURE;
    let mut count = 1usize;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--models" => {
                i += 1;
                models_dir = Some(args[i].clone());
            }
            "--temperature" => {
                i += 1;
                temperature = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --temperature must be a positive number");
                    process::exit(1);
                });
            }
            "--count" => {
                i += 1;
                count = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --count must be an integer");
                    process::exit(1);
                });
            }
            "--seed" => {
                i += 1;
                seed = Some(args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --seed must be an integer");
                    process::exit(1);
                }));
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let models_dir = models_dir.unwrap_or_else(|| {
        eprintln!("Error: --models is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    if temperature <= 0.0 {
        eprintln!("Error: --temperature must be positive, got {}", temperature);
        process::exit(1);
    }

    let dir = Path::new(&models_dir);
    let title_model = load_model(&dir.join(TITLE_SNAPSHOT)).unwrap_or_else(|e| {
        eprintln!("Error loading title snapshot: {}", e);
        process::exit(1);
    });
    let pitch_model = load_model(&dir.join(PITCH_SNAPSHOT)).unwrap_or_else(|e| {
        eprintln!("Error loading pitch snapshot: {}", e);
        process::exit(1);
    });

    // Unseeded runs should differ from each other.
    let seed = seed.unwrap_or_else(rand::random::<u64>);

    let mut engine = PitchEngine::builder()
        .seed(seed)
        .with_title_model(title_model)
        .with_pitch_model(pitch_model)
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error building engine: {}", e);
            process::exit(1);
        });

    for n in 0..count {
        let idea = engine.idea(temperature).unwrap_or_else(|e| {
            eprintln!("Error generating idea: {}", e);
            process::exit(1);
        });
        if n > 0 {
            println!();
        }
        println!("{}", idea.title);
        println!("  {}", idea.description.replace('\n', "\n  "));
    }
}
