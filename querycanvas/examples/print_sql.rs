use std::{env, fs, path::PathBuf};

use querycanvas::{QueryCanvasConfig, SavedQueryState, Schema};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("Usage: print_sql <schema_file> <state_json> [--quotes]");
    eprintln!("Example: cargo run --example print_sql -- schema.yaml saved_query.json");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let schema_path = PathBuf::from(args.remove(0));
    let state_path = PathBuf::from(args.remove(0));
    let config = QueryCanvasConfig::load_default();
    let use_quotes = config.editor.use_quotes || args.iter().any(|a| a == "--quotes");

    let schema = Schema::load_file(schema_path)?;
    let state_str = fs::read_to_string(state_path)?;
    let state: SavedQueryState = serde_json::from_str(&state_str)?;

    let result = querycanvas::recompute(&schema, &state, use_quotes)?;
    println!("{}", result.sql);
    Ok(())
}
