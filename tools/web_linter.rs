/// Web Linter — validates town fixtures before they reach the layout engine.
///
/// Usage: web_linter <town_file_or_dir> [--strict]
///
/// Dangling relationship targets and duplicate NPC names are errors.
/// Isolated NPCs and self-relationships are warnings. With `--strict`
/// warnings count as errors too.

use relationship_web::core::graph::GraphBuilder;
use relationship_web::schema::town::TownData;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: web_linter <town_file_or_dir> [--strict]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let strict = args[2..].iter().any(|a| a == "--strict");

    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else if target.is_dir() {
        let mut files = Vec::new();
        collect_json_recursive(target, &mut files);
        files.sort();
        files
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for path in &files {
        match TownData::load_json(path) {
            Ok(town) => {
                println!("  Loaded: {}", path.display());
                lint_town(path, &town, &mut errors, &mut warnings);
            }
            Err(e) => {
                errors.push(format!("{}: failed to load: {}", path.display(), e));
            }
        }
    }

    println!("\n=== Relationship Web Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() && !(strict && !warnings.is_empty()) {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_json_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_json_recursive(&path, files);
            } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
    }
}

fn lint_town(path: &Path, town: &TownData, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let label = town
        .town
        .clone()
        .unwrap_or_else(|| path.display().to_string());

    if town.npcs.is_empty() {
        warnings.push(format!("{}: no NPCs", label));
        return;
    }

    // Lenient build collects every problem instead of stopping at the first.
    let outcome = match GraphBuilder::new().build(&town.npcs) {
        Ok(outcome) => outcome,
        Err(e) => {
            errors.push(format!("{}: {}", label, e));
            return;
        }
    };

    for diagnostic in &outcome.diagnostics {
        errors.push(format!("{}: {}", label, diagnostic));
    }

    let graph = &outcome.graph;
    for node in graph.isolated() {
        warnings.push(format!("{}: '{}' has no relationships", label, node.name));
    }
    for edge in graph.edges().iter().filter(|e| e.is_self_loop()) {
        let (name, _) = graph.endpoint_names(edge);
        warnings.push(format!(
            "{}: '{}' has a {} relationship with themselves",
            label, name, edge.kind
        ));
    }
    for node in graph.nodes() {
        if node.name.trim().is_empty() {
            errors.push(format!("{}: NPC with an empty name", label));
        }
    }
}
