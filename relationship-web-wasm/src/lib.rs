//! WASM bindings for relationship-web — drives the browser's NPC web view.
//!
//! The page owns the animation loop: it calls `tick()` once per frame and
//! redraws from the returned JSON, or calls `run()` once for a static layout.

use wasm_bindgen::prelude::*;

use relationship_web::core::config::SimulationConfig;
use relationship_web::core::graph::{Diagnostic, GraphBuilder};
use relationship_web::core::simulation::{Simulation, SimulationState};
use relationship_web::schema::npc::Npc;
use relationship_web::schema::town::{fixture_stem, TownData};

// ---------------------------------------------------------------------------
// Embedded town fixtures — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const BRYN_SHANDER: &str = include_str!("../../town_data/bryn_shander.json");
    pub const EASTHAVEN: &str = include_str!("../../town_data/easthaven.json");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct NodeFrame<'a> {
    name: &'a str,
    role: &'a str,
    motivation: &'a str,
    secret: &'a str,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

#[derive(serde::Serialize)]
struct Frame<'a> {
    tick: usize,
    alpha: f64,
    energy: f64,
    state: SimulationState,
    nodes: Vec<NodeFrame<'a>>,
}

#[derive(serde::Serialize)]
struct EdgeInfo<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(serde::Serialize)]
struct DiagnosticInfo<'a> {
    message: String,
    detail: &'a Diagnostic,
}

fn preset_source(town: &str) -> Option<&'static str> {
    match fixture_stem(town).as_str() {
        "bryn_shander" => Some(data::BRYN_SHANDER),
        "easthaven" => Some(data::EASTHAVEN),
        _ => None,
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// RelationshipWeb
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct RelationshipWeb {
    sim: Simulation,
    diagnostics: Vec<Diagnostic>,
    npcs: Vec<Npc>,
    config: SimulationConfig,
    town: Option<String>,
}

#[wasm_bindgen]
impl RelationshipWeb {
    /// Create a layout for a town fixture given as JSON.
    ///
    /// `config_json` is an optional `SimulationConfig` object; missing
    /// fields take their defaults:
    /// ```json
    /// { "bounds": { "width": 800, "height": 600 }, "seed": 7 }
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(town_json: &str, config_json: Option<String>) -> Result<RelationshipWeb, JsError> {
        let town = TownData::parse_json(town_json)
            .map_err(|e| JsError::new(&format!("Invalid town JSON: {e}")))?;
        let config = match config_json {
            Some(ref json) if !json.trim().is_empty() => serde_json::from_str(json)
                .map_err(|e| JsError::new(&format!("Invalid config JSON: {e}")))?,
            _ => SimulationConfig::default(),
        };
        Self::start(town.npcs, config, town.town)
    }

    /// Create a layout for one of the bundled towns.
    pub fn preset(town: &str, seed: u64) -> Result<RelationshipWeb, JsError> {
        let source =
            preset_source(town).ok_or_else(|| JsError::new(&format!("Unknown town: {town}")))?;
        let data = TownData::parse_json(source)
            .map_err(|e| JsError::new(&format!("Town parse error: {e}")))?;
        Self::start(data.npcs, SimulationConfig::default().with_seed(seed), data.town)
    }

    /// Return JSON array of bundled town names.
    pub fn available_towns() -> String {
        serde_json::to_string(&["Bryn Shander", "Easthaven"]).unwrap_or_else(|_| "[]".to_string())
    }

    /// Advance one tick and return the frame as JSON.
    pub fn tick(&mut self) -> Result<String, JsError> {
        self.sim
            .step()
            .map_err(|e| JsError::new(&format!("Simulation error: {e}")))?;
        self.frame()
    }

    /// Current frame as JSON without advancing.
    pub fn frame(&self) -> Result<String, JsError> {
        let graph = self.live()?.graph();
        let nodes = graph
            .nodes()
            .iter()
            .zip(self.sim.nodes())
            .map(|(node, k)| NodeFrame {
                name: &node.name,
                role: node.role.label(),
                motivation: &node.motivation,
                secret: &node.secret,
                x: k.x,
                y: k.y,
                vx: k.vx,
                vy: k.vy,
            })
            .collect();
        to_json(&Frame {
            tick: self.sim.tick(),
            alpha: self.sim.alpha(),
            energy: self.sim.energy(),
            state: self.sim.state(),
            nodes,
        })
    }

    /// Run to convergence or `max_ticks`; returns the final layout as JSON.
    pub fn run(&mut self, max_ticks: usize, threshold: f64) -> Result<String, JsError> {
        let layout = self
            .sim
            .run(max_ticks, threshold)
            .map_err(|e| JsError::new(&format!("Simulation error: {e}")))?;
        to_json(&layout)
    }

    /// Positions by NPC name as JSON.
    pub fn layout(&self) -> Result<String, JsError> {
        let layout = self
            .sim
            .layout()
            .map_err(|e| JsError::new(&format!("Simulation error: {e}")))?;
        to_json(&layout)
    }

    /// Resolved relationships by name, for drawing lines.
    pub fn edges(&self) -> Result<String, JsError> {
        let graph = self.live()?.graph();
        let edges: Vec<EdgeInfo> = graph
            .edges()
            .iter()
            .map(|e| {
                let (source, target) = graph.endpoint_names(e);
                EdgeInfo {
                    source,
                    target,
                    kind: e.kind.tag(),
                }
            })
            .collect();
        to_json(&edges)
    }

    /// What the graph builder dropped, as JSON.
    pub fn diagnostics(&self) -> Result<String, JsError> {
        self.live()?;
        let infos: Vec<DiagnosticInfo> = self
            .diagnostics
            .iter()
            .map(|d| DiagnosticInfo {
                message: d.to_string(),
                detail: d,
            })
            .collect();
        to_json(&infos)
    }

    pub fn town(&self) -> Option<String> {
        self.town.clone()
    }

    /// Lifecycle state name: "Running", "Converged", "Stopped" or "Disposed".
    pub fn state(&self) -> String {
        format!("{:?}", self.sim.state())
    }

    pub fn stop(&mut self) -> Result<(), JsError> {
        self.sim
            .stop()
            .map_err(|e| JsError::new(&format!("Simulation error: {e}")))
    }

    /// Release the simulation. Call when the view unmounts or the town changes.
    pub fn dispose(&mut self) {
        self.sim.dispose();
        self.npcs.clear();
        self.diagnostics.clear();
    }

    /// Restart the same town with a new seed.
    pub fn reset(&mut self, seed: u64) -> Result<(), JsError> {
        self.live()?;
        let config = self.config.clone().with_seed(seed);
        let fresh = Self::start(self.npcs.clone(), config, self.town.clone())?;
        *self = fresh;
        Ok(())
    }
}

// Private helpers
impl RelationshipWeb {
    fn live(&self) -> Result<&Simulation, JsError> {
        self.sim
            .ensure_live()
            .map_err(|e| JsError::new(&format!("Simulation error: {e}")))?;
        Ok(&self.sim)
    }

    fn start(
        npcs: Vec<Npc>,
        config: SimulationConfig,
        town: Option<String>,
    ) -> Result<RelationshipWeb, JsError> {
        let outcome = GraphBuilder::new()
            .build(&npcs)
            .map_err(|e| JsError::new(&format!("Graph build error: {e}")))?;
        let sim = Simulation::initialize(outcome.graph, config.clone())
            .map_err(|e| JsError::new(&format!("Config error: {e}")))?;
        Ok(RelationshipWeb {
            sim,
            diagnostics: outcome.diagnostics,
            npcs,
            config,
            town,
        })
    }
}
