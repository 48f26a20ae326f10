/// Train Models — builds title and pitch snapshots from a project feed.
///
/// Usage: train_models --input <projects.json> --output <dir>
///        [--title-order N] [--pitch-order N]
use std::env;
use std::path::Path;
use std::process;

use pitch_engine::core::engine::{ModelConfig, PITCH_SNAPSHOT, TITLE_SNAPSHOT};
use pitch_engine::core::markov::{save_model, MarkovModel};
use pitch_engine::corpus;

const USAGE: &str = "Usage: train_models --input <projects.json> --output <dir> \
                     [--title-order N] [--pitch-order N]";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut output = None;
    let mut title_order = ModelConfig::TITLE.order;
    let mut pitch_order = ModelConfig::PITCH.order;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--output" => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--title-order" => {
                i += 1;
                title_order = parse_order(&args[i]);
            }
            "--pitch-order" => {
                i += 1;
                pitch_order = parse_order(&args[i]);
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

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let output_dir = output.unwrap_or_else(|| {
        eprintln!("Error: --output is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let records = corpus::load_records(Path::new(&input_path)).unwrap_or_else(|e| {
        eprintln!("Error reading records from '{}': {}", input_path, e);
        process::exit(1);
    });

    println!("Training on {} records from '{}'...", records.len(), input_path);

    let mut title_model = new_model(title_order, ModelConfig::TITLE.max_length);
    let mut pitch_model = new_model(pitch_order, ModelConfig::PITCH.max_length);
    let stats = corpus::ingest(&records, &mut title_model, &mut pitch_model);

    println!(
        "Fed {} titles and {} pitches ({} fields too short)",
        stats.titles, stats.pitches, stats.skipped
    );
    println!(
        "Title model: order {}, {} ngrams; pitch model: order {}, {} ngrams",
        title_model.order(),
        title_model.transitions().len(),
        pitch_model.order(),
        pitch_model.transitions().len()
    );

    let dir = Path::new(&output_dir);
    std::fs::create_dir_all(dir).unwrap_or_else(|e| {
        eprintln!("Error creating output directory '{}': {}", output_dir, e);
        process::exit(1);
    });
    save_model(&title_model, &dir.join(TITLE_SNAPSHOT)).unwrap_or_else(|e| {
        eprintln!("Error saving title snapshot: {}", e);
        process::exit(1);
    });
    save_model(&pitch_model, &dir.join(PITCH_SNAPSHOT)).unwrap_or_else(|e| {
        eprintln!("Error saving pitch snapshot: {}", e);
        process::exit(1);
    });

    println!("Snapshots saved to '{}'", output_dir);
}

fn parse_order(arg: &str) -> usize {
    match arg.parse::<usize>() {
        Ok(order) if order >= 1 => order,
        _ => {
            eprintln!("Error: order must be a positive integer, got '{}'", arg);
            process::exit(1);
        }
    }
}

fn new_model(order: usize, max_length: usize) -> MarkovModel {
    MarkovModel::new(order, max_length).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    })
}
