/// Layout Preview — interactive shell for stepping a town's relationship web.
///
/// Usage: layout_preview [--towns <dir>] [--town <name>] [--config <path>] [--seed <n>]
///
/// Commands:
///   town <name>          — load a town fixture and start a fresh simulation
///   step [n]             — advance n ticks (default 1)
///   run [max] [thresh]   — run to convergence or the tick cap
///   show                 — print current positions
///   edges                — list resolved relationships
///   seed <n>             — reseed and restart the current town
///   stop                 — stop the current simulation
///   dispose              — release the current simulation
///   help                 — list commands
///   quit                 — exit

use relationship_web::core::config::SimulationConfig;
use relationship_web::core::graph::GraphBuilder;
use relationship_web::core::simulation::Simulation;
use relationship_web::schema::town::{fixture_stem, TownData};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        print_usage();
        return;
    }

    let mut towns_dir = PathBuf::from("town_data");
    let mut initial_town = None;
    let mut config_path = None;
    let mut seed_override = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--towns" if i + 1 < args.len() => {
                i += 1;
                towns_dir = PathBuf::from(&args[i]);
            }
            "--town" if i + 1 < args.len() => {
                i += 1;
                initial_town = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed_override = args[i].parse::<u64>().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(ref path) => match SimulationConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };
    if let Some(seed) = seed_override {
        config.seed = seed;
    }

    println!("Towns: {}", towns_dir.display());
    println!("Seed: {}", config.seed);
    println!("Type 'help' for commands.\n");

    let mut current_town: Option<TownData> = None;
    let mut sim: Option<Simulation> = None;

    if let Some(name) = initial_town {
        if let Some(town) = load_town(&towns_dir, &name) {
            sim = start(&town, &config);
            current_town = Some(town);
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("layout> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "town" => {
                if parts.len() < 2 {
                    println!("Usage: town <name>");
                    match current_town {
                        Some(ref town) => println!(
                            "  Current: {}",
                            town.town.as_deref().unwrap_or("(unnamed)")
                        ),
                        None => println!("  Current: none"),
                    }
                    continue;
                }
                let name = parts[1..].join(" ");
                if let Some(town) = load_town(&towns_dir, &name) {
                    sim = start(&town, &config);
                    current_town = Some(town);
                }
            }
            "step" => {
                let Some(ref mut s) = sim else {
                    println!("No simulation. Load one with 'town <name>'.");
                    continue;
                };
                let count: usize = match parts.get(1).map(|p| p.parse()) {
                    None => 1,
                    Some(Ok(n)) if n > 0 => n,
                    _ => {
                        println!("Invalid count: {}", parts[1]);
                        continue;
                    }
                };
                for _ in 0..count {
                    match s.step() {
                        Ok(result) if count == 1 || result.tick % 10 == 0 => {
                            println!(
                                "tick {:>5}  alpha {:.5}  energy {:.5}",
                                result.tick, result.alpha, result.energy
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            println!("ERROR: {}", e);
                            break;
                        }
                    }
                }
            }
            "run" => {
                let Some(ref mut s) = sim else {
                    println!("No simulation. Load one with 'town <name>'.");
                    continue;
                };
                let max_ticks = parts.get(1).and_then(|p| p.parse().ok()).unwrap_or(300);
                let threshold = parts.get(2).and_then(|p| p.parse().ok()).unwrap_or(0.01);
                match s.run(max_ticks, threshold) {
                    Ok(layout) => {
                        println!(
                            "\n{:?} after {} ticks (energy {:.5})\n",
                            layout.outcome, layout.ticks, layout.energy
                        );
                        for (name, p) in &layout.positions {
                            println!("  {:<24} ({:>8.2}, {:>8.2})", name, p.x, p.y);
                        }
                        println!();
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "show" => {
                let Some(ref s) = sim else {
                    println!("No simulation.");
                    continue;
                };
                match s.layout() {
                    Ok(layout) => {
                        println!("State: {:?}  tick {}  alpha {:.5}", s.state(), s.tick(), s.alpha());
                        for (node, k) in s.graph().nodes().iter().zip(s.nodes()) {
                            println!(
                                "  {:<24} ({:>8.2}, {:>8.2})  v=({:>7.3}, {:>7.3})  [{}]",
                                node.name,
                                k.x,
                                k.y,
                                k.vx,
                                k.vy,
                                node.role.label()
                            );
                        }
                        if layout.is_empty() {
                            println!("  (no nodes)");
                        }
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "edges" => {
                let Some(ref s) = sim else {
                    println!("No simulation.");
                    continue;
                };
                let graph = s.graph();
                for edge in graph.edges() {
                    let (from, to) = graph.endpoint_names(edge);
                    let note = if edge.is_self_loop() { "  (self)" } else { "" };
                    println!("  {} -> {}  [{}]{}", from, to, edge.kind, note);
                }
                println!("{} edges", graph.edge_count());
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", config.seed);
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(seed) => {
                        config.seed = seed;
                        if let Some(ref town) = current_town {
                            sim = start(town, &config);
                        }
                        println!("Seed set to {}", seed);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            "stop" => match sim {
                Some(ref mut s) => match s.stop() {
                    Ok(()) => println!("Stopped at tick {}", s.tick()),
                    Err(e) => println!("ERROR: {}", e),
                },
                None => println!("No simulation."),
            },
            "dispose" => match sim {
                Some(ref mut s) => {
                    s.dispose();
                    println!("Disposed.");
                }
                None => println!("No simulation."),
            },
            _ => {
                println!("Unknown command: '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn load_town(dir: &Path, name: &str) -> Option<TownData> {
    let path = dir.join(format!("{}.json", fixture_stem(name)));
    match TownData::load_json(&path) {
        Ok(town) => {
            println!(
                "Loaded {} ({} NPCs, {} relationships)",
                path.display(),
                town.npcs.len(),
                town.relationship_count()
            );
            Some(town)
        }
        Err(e) => {
            println!("ERROR loading {}: {}", path.display(), e);
            None
        }
    }
}

fn start(town: &TownData, config: &SimulationConfig) -> Option<Simulation> {
    let outcome = match GraphBuilder::new().build(&town.npcs) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("ERROR: {}", e);
            return None;
        }
    };
    for diagnostic in &outcome.diagnostics {
        println!("WARNING: {}", diagnostic);
    }
    match Simulation::initialize(outcome.graph, config.clone()) {
        Ok(sim) => {
            println!(
                "Simulation ready: {} nodes, {} edges, seed {}",
                sim.graph().node_count(),
                sim.graph().edge_count(),
                config.seed
            );
            Some(sim)
        }
        Err(e) => {
            println!("ERROR: {}", e);
            None
        }
    }
}

fn print_usage() {
    println!("Layout Preview — interactive shell for stepping a town's relationship web.");
    println!();
    println!("Usage: layout_preview [--towns <dir>] [--town <name>] [--config <path>] [--seed <n>]");
    println!();
    println!("  --towns <dir>      Directory of town fixtures (default: town_data)");
    println!("  --town <name>      Town to load on start, e.g. \"Bryn Shander\"");
    println!("  --config <path>    Simulation config in RON (optional)");
    println!("  --seed <n>         RNG seed, overrides the config");
    println!();
    println!("Set RUST_LOG=relationship_web=trace to log every tick.");
}

fn print_help() {
    println!("Commands:");
    println!("  town <name>          Load a town fixture and start a simulation");
    println!("  step [n]             Advance n ticks (default 1)");
    println!("  run [max] [thresh]   Run until settled or max ticks (default 300 0.01)");
    println!("  show                 Print positions and velocities");
    println!("  edges                List resolved relationships");
    println!("  seed <n>             Reseed and restart the current town");
    println!("  stop                 Stop the current simulation");
    println!("  dispose              Release the current simulation");
    println!("  help                 Show this help");
    println!("  quit                 Exit");
}
