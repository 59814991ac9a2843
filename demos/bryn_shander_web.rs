/// Bryn Shander example — lays out a town's relationship web headlessly.
///
/// Loads the Bryn Shander fixture, builds the graph, runs the simulation to
/// rest and prints every NPC's position along with edge lengths.
///
/// Run with: cargo run --example bryn_shander_web

use relationship_web::core::config::SimulationConfig;
use relationship_web::core::graph::GraphBuilder;
use relationship_web::core::simulation::Simulation;
use relationship_web::schema::town::TownData;

fn main() {
    // --- Load the town ---
    let town = TownData::load_json(std::path::Path::new("town_data/bryn_shander.json"))
        .expect("Failed to load Bryn Shander fixture");

    // --- Resolve relationships by name ---
    let outcome = GraphBuilder::new()
        .build(&town.npcs)
        .expect("Lenient build never fails");
    for diagnostic in &outcome.diagnostics {
        println!("warning: {diagnostic}");
    }
    let graph = outcome.graph.clone();

    // --- Run the layout ---
    let mut sim = Simulation::initialize(outcome.graph, SimulationConfig::default().with_seed(2026))
        .expect("Default config is valid");
    let layout = sim.run(2000, 0.01).expect("Fresh simulation is running");

    println!(
        "=== {} — {:?} after {} ticks ===\n",
        town.town.as_deref().unwrap_or("Unnamed town"),
        layout.outcome,
        layout.ticks
    );
    for node in graph.nodes() {
        let p = layout.positions[&node.name];
        println!("  {:<20} {:<12} ({:>7.1}, {:>7.1})", node.name, node.role.label(), p.x, p.y);
    }

    println!("\n--- Edges ---");
    for edge in graph.edges() {
        let (from, to) = graph.endpoint_names(edge);
        let length = layout.distance(from, to).unwrap_or(0.0);
        println!("  {from} -> {to} [{}]: {length:.1}", edge.kind);
    }
}
