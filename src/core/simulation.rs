//! Force simulation — a stepped, seeded physics solver over one graph
//! snapshot.
//!
//! Lifecycle: a `Simulation` starts `Running` and accepts `step`/`run`.
//! `run` ends in `Converged` or `Stopped`, `stop` ends in `Stopped`, and
//! `dispose` releases everything. Terminal and disposed handles reject
//! further steps with a `SimulationError`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use super::config::{Bounds, ConfigError, Placement, SimulationConfig};
use super::forces::{self, Spring};
use super::graph::Graph;
use super::layout::{FinalLayout, Kinematics, Layout, Position, RunOutcome};

/// Spacing of the golden-angle spiral used by `Placement::Phyllotaxis`.
const PHYLLOTAXIS_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    /// Accepting steps.
    Running,
    /// `run` saw energy settle under its threshold.
    Converged,
    /// Ended by the tick cap of `run` or by `stop`.
    Stopped,
    /// Resources released; every operation fails.
    Disposed,
}

impl SimulationState {
    /// True for `Converged` and `Stopped`: positions are final and read-only.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Stopped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("simulation has been disposed")]
    Disposed,
    #[error("simulation is {0:?} and no longer accepts steps")]
    NotRunning(SimulationState),
}

/// What one tick produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Ticks advanced so far, including this one.
    pub tick: usize,
    pub alpha: f64,
    /// Sum of node speeds after the tick.
    pub energy: f64,
    /// Kinematics in graph node order.
    pub nodes: Vec<Kinematics>,
}

/// The simulation handle. Owns its graph snapshot exclusively.
#[derive(Debug)]
pub struct Simulation {
    graph: Graph,
    config: SimulationConfig,
    springs: Vec<Spring>,
    nodes: Vec<Kinematics>,
    rng: StdRng,
    tick: usize,
    alpha: f64,
    energy: f64,
    state: SimulationState,
}

impl Simulation {
    /// Validate `config`, place every node and start `Running`.
    pub fn initialize(graph: Graph, config: SimulationConfig) -> Result<Simulation, ConfigError> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let nodes = place_nodes(graph.node_count(), &config, &mut rng);
        let springs = graph
            .edges()
            .iter()
            .map(|e| Spring {
                source: e.source,
                target: e.target,
                strength: config.strength_for(&e.kind),
            })
            .collect();

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            seed = config.seed,
            placement = ?config.placement,
            "initialized simulation"
        );

        Ok(Simulation {
            graph,
            config,
            springs,
            nodes,
            rng,
            tick: 0,
            alpha: 1.0,
            energy: 0.0,
            state: SimulationState::Running,
        })
    }

    /// Default tuning on a canvas of the given size.
    pub fn with_bounds(graph: Graph, bounds: Bounds) -> Result<Simulation, ConfigError> {
        Self::initialize(graph, SimulationConfig::default().with_bounds(bounds))
    }

    /// Advance one tick. Meant to be called once per rendered frame.
    pub fn step(&mut self) -> Result<StepResult, SimulationError> {
        self.ensure_running()?;
        let energy = self.advance();
        Ok(StepResult {
            tick: self.tick,
            alpha: self.alpha,
            energy,
            nodes: self.nodes.clone(),
        })
    }

    /// Step until energy stays below `energy_threshold` for the configured
    /// settle window, or until `max_ticks` ticks have run in this call.
    ///
    /// Blocking; intended for headless layout.
    pub fn run(
        &mut self,
        max_ticks: usize,
        energy_threshold: f64,
    ) -> Result<FinalLayout, SimulationError> {
        self.ensure_running()?;

        let mut calm = 0usize;
        let mut outcome = RunOutcome::TickCap;
        for _ in 0..max_ticks {
            if self.advance() < energy_threshold {
                calm += 1;
                if calm >= self.config.settle_ticks {
                    outcome = RunOutcome::Converged;
                    break;
                }
            } else {
                calm = 0;
            }
        }

        self.state = match outcome {
            RunOutcome::Converged => SimulationState::Converged,
            RunOutcome::TickCap => SimulationState::Stopped,
        };
        debug!(
            ticks = self.tick,
            energy = self.energy,
            outcome = ?outcome,
            "simulation run finished"
        );

        Ok(FinalLayout {
            positions: self.collect_layout(),
            ticks: self.tick,
            energy: self.energy,
            outcome,
        })
    }

    /// End a caller-driven loop. Positions stay readable.
    pub fn stop(&mut self) -> Result<(), SimulationError> {
        self.ensure_running()?;
        self.state = SimulationState::Stopped;
        debug!(ticks = self.tick, "simulation stopped");
        Ok(())
    }

    /// Release the graph snapshot and kinematics.
    pub fn dispose(&mut self) {
        self.graph = Graph::default();
        self.springs = Vec::new();
        self.nodes = Vec::new();
        self.state = SimulationState::Disposed;
        debug!(ticks = self.tick, "simulation disposed");
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Energy after the most recent tick; 0.0 before the first.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The graph snapshot. Empty once disposed.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Kinematics in graph node order. Empty once disposed.
    pub fn nodes(&self) -> &[Kinematics] {
        &self.nodes
    }

    /// Position of the named node; `Ok(None)` if no node has that name.
    pub fn position(&self, name: &str) -> Result<Option<Position>, SimulationError> {
        self.ensure_live()?;
        Ok(self
            .graph
            .node_index(name)
            .and_then(|index| self.nodes.get(index))
            .map(Kinematics::position))
    }

    /// Current positions by node name.
    pub fn layout(&self) -> Result<Layout, SimulationError> {
        self.ensure_live()?;
        Ok(self.collect_layout())
    }

    /// Fails once the handle has been disposed.
    pub fn ensure_live(&self) -> Result<(), SimulationError> {
        match self.state {
            SimulationState::Disposed => Err(SimulationError::Disposed),
            _ => Ok(()),
        }
    }

    fn ensure_running(&self) -> Result<(), SimulationError> {
        match self.state {
            SimulationState::Running => Ok(()),
            SimulationState::Disposed => Err(SimulationError::Disposed),
            other => Err(SimulationError::NotRunning(other)),
        }
    }

    fn collect_layout(&self) -> Layout {
        self.graph
            .nodes()
            .iter()
            .zip(&self.nodes)
            .map(|(node, k)| (node.name.clone(), k.position()))
            .collect()
    }

    /// One tick. Every force reads the same pre-tick snapshot, then all
    /// nodes move at once.
    fn advance(&mut self) -> f64 {
        let config = &self.config;
        self.alpha += (config.alpha_target - self.alpha) * config.alpha_decay;

        let snapshot: Vec<Position> = self.nodes.iter().map(Kinematics::position).collect();
        let mut forces = vec![Position::default(); snapshot.len()];

        forces::apply_links(
            &snapshot,
            &self.springs,
            config.link_distance,
            config.min_distance,
            self.alpha,
            &mut forces,
            &mut self.rng,
        );
        forces::apply_repulsion(
            &snapshot,
            config.repulsion_strength,
            config.min_distance,
            self.alpha,
            &mut forces,
            &mut self.rng,
        );
        let (cx, cy) = config.bounds.center();
        let shift = forces::centering_shift(&snapshot, Position::new(cx, cy), config.center_strength);

        let decay = config.velocity_decay;
        let mut energy = 0.0;
        for ((node, force), before) in self.nodes.iter_mut().zip(&forces).zip(&snapshot) {
            node.vx = (node.vx + force.x) * decay;
            node.vy = (node.vy + force.y) * decay;
            node.x = before.x + node.vx + shift.x;
            node.y = before.y + node.vy + shift.y;

            if !(node.x.is_finite() && node.y.is_finite()) {
                // Runaway tuning: drop the momentum rather than the node.
                node.vx = 0.0;
                node.vy = 0.0;
                let shifted = *before + shift;
                let settled = if shifted.is_finite() { shifted } else { *before };
                node.x = settled.x;
                node.y = settled.y;
            }
            energy += node.speed();
        }

        self.tick += 1;
        self.energy = energy;
        trace!(tick = self.tick, alpha = self.alpha, energy, "tick");
        energy
    }
}

fn place_nodes(count: usize, config: &SimulationConfig, rng: &mut StdRng) -> Vec<Kinematics> {
    match config.placement {
        Placement::Random => (0..count)
            .map(|_| {
                let x = rng.gen::<f64>() * config.bounds.width;
                let y = rng.gen::<f64>() * config.bounds.height;
                Kinematics::at(Position::new(x, y))
            })
            .collect(),
        Placement::Phyllotaxis => {
            let (cx, cy) = config.bounds.center();
            let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
            (0..count)
                .map(|i| {
                    let radius = PHYLLOTAXIS_RADIUS * (0.5 + i as f64).sqrt();
                    let angle = i as f64 * golden_angle;
                    Kinematics::at(Position::new(
                        cx + radius * angle.cos(),
                        cy + radius * angle.sin(),
                    ))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::GraphBuilder;
    use crate::schema::npc::Npc;

    fn chain() -> Graph {
        let npcs = vec![
            Npc::new("A").relates_to("B", "alliance"),
            Npc::new("B").relates_to("C", "rivalry"),
            Npc::new("C"),
        ];
        GraphBuilder::new().build(&npcs).unwrap().graph
    }

    fn pair() -> Graph {
        let npcs = vec![Npc::new("A").relates_to("B", "alliance"), Npc::new("B")];
        GraphBuilder::new().build(&npcs).unwrap().graph
    }

    #[test]
    fn initialize_places_inside_bounds_at_rest() {
        let sim = Simulation::with_bounds(chain(), Bounds::new(200.0, 100.0)).unwrap();
        assert_eq!(sim.state(), SimulationState::Running);
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.nodes().len(), 3);
        for k in sim.nodes() {
            assert!((0.0..200.0).contains(&k.x));
            assert!((0.0..100.0).contains(&k.y));
            assert_eq!(k.speed(), 0.0);
        }
    }

    #[test]
    fn initialize_rejects_invalid_config() {
        let config = SimulationConfig {
            velocity_decay: 1.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::initialize(chain(), config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn phyllotaxis_ignores_seed() {
        let config = SimulationConfig {
            placement: Placement::Phyllotaxis,
            ..SimulationConfig::default()
        };
        let a = Simulation::initialize(chain(), config.clone().with_seed(1)).unwrap();
        let b = Simulation::initialize(chain(), config.with_seed(2)).unwrap();
        assert_eq!(a.nodes(), b.nodes());

        let first = a.nodes()[0].position();
        let expected = PHYLLOTAXIS_RADIUS * 0.5f64.sqrt();
        assert!((first.distance_to(Position::new(400.0, 300.0)) - expected).abs() < 1e-9);
    }

    #[test]
    fn step_reports_tick_alpha_and_energy() {
        let mut sim = Simulation::initialize(pair(), SimulationConfig::default()).unwrap();
        let first = sim.step().unwrap();
        assert_eq!(first.tick, 1);
        assert!(first.alpha < 1.0);
        assert!(first.energy > 0.0);
        assert_eq!(first.nodes.len(), 2);

        let energy: f64 = first.nodes.iter().map(Kinematics::speed).sum();
        assert!((energy - first.energy).abs() < 1e-12);

        let second = sim.step().unwrap();
        assert_eq!(second.tick, 2);
        assert!(second.alpha < first.alpha);
    }

    #[test]
    fn zero_alpha_decay_keeps_full_strength() {
        let config = SimulationConfig {
            alpha_decay: 0.0,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::initialize(pair(), config).unwrap();
        sim.step().unwrap();
        assert_eq!(sim.alpha(), 1.0);
    }

    #[test]
    fn centroid_tracks_canvas_center() {
        let mut sim = Simulation::initialize(chain(), SimulationConfig::default()).unwrap();
        for _ in 0..20 {
            sim.step().unwrap();
        }
        let n = sim.nodes().len() as f64;
        let cx: f64 = sim.nodes().iter().map(|k| k.x).sum::<f64>() / n;
        let cy: f64 = sim.nodes().iter().map(|k| k.y).sum::<f64>() / n;
        assert!((cx - 400.0).abs() < 1e-6, "centroid x drifted to {cx}");
        assert!((cy - 300.0).abs() < 1e-6, "centroid y drifted to {cy}");
    }

    #[test]
    fn single_node_settles_on_center() {
        let npcs = vec![Npc::new("Hermit")];
        let graph = GraphBuilder::new().build(&npcs).unwrap().graph;
        let mut sim = Simulation::initialize(graph, SimulationConfig::default()).unwrap();
        let result = sim.run(100, 0.01).unwrap();
        assert!(result.converged());
        assert_eq!(result.ticks, 5);
        let p = result.positions["Hermit"];
        assert!((p.x - 400.0).abs() < 1e-9);
        assert!((p.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn empty_graph_converges_immediately() {
        let mut sim = Simulation::initialize(Graph::default(), SimulationConfig::default()).unwrap();
        let result = sim.run(100, 0.01).unwrap();
        assert!(result.converged());
        assert!(result.positions.is_empty());
        assert_eq!(sim.state(), SimulationState::Converged);
    }

    #[test]
    fn run_hitting_cap_is_stopped() {
        let mut sim = Simulation::initialize(chain(), SimulationConfig::default()).unwrap();
        let result = sim.run(3, 0.01).unwrap();
        assert_eq!(result.outcome, RunOutcome::TickCap);
        assert_eq!(result.ticks, 3);
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[test]
    fn terminal_states_reject_steps() {
        let mut sim = Simulation::initialize(chain(), SimulationConfig::default()).unwrap();
        sim.run(3, 0.01).unwrap();
        assert_eq!(
            sim.step().unwrap_err(),
            SimulationError::NotRunning(SimulationState::Stopped)
        );
        assert_eq!(
            sim.run(10, 0.01).unwrap_err(),
            SimulationError::NotRunning(SimulationState::Stopped)
        );
        // Final positions stay readable.
        assert_eq!(sim.layout().unwrap().len(), 3);
    }

    #[test]
    fn stop_ends_a_stepped_loop() {
        let mut sim = Simulation::initialize(chain(), SimulationConfig::default()).unwrap();
        sim.step().unwrap();
        sim.stop().unwrap();
        assert_eq!(sim.state(), SimulationState::Stopped);
        assert!(sim.state().is_terminal());
        assert!(sim.stop().is_err());
        assert!(sim.position("A").unwrap().is_some());
    }

    #[test]
    fn dispose_releases_and_rejects() {
        let mut sim = Simulation::initialize(chain(), SimulationConfig::default()).unwrap();
        sim.step().unwrap();
        sim.dispose();
        assert_eq!(sim.state(), SimulationState::Disposed);
        assert!(sim.nodes().is_empty());
        assert!(sim.graph().is_empty());
        assert_eq!(sim.step().unwrap_err(), SimulationError::Disposed);
        assert_eq!(sim.run(10, 0.01).unwrap_err(), SimulationError::Disposed);
        assert_eq!(sim.layout().unwrap_err(), SimulationError::Disposed);
        assert_eq!(sim.position("A"), Err(SimulationError::Disposed));
        assert_eq!(sim.position("Nobody"), Err(SimulationError::Disposed));
        assert_eq!(sim.ensure_live(), Err(SimulationError::Disposed));
    }

    #[test]
    fn position_by_name() {
        let sim = Simulation::initialize(chain(), SimulationConfig::default()).unwrap();
        assert_eq!(sim.position("B"), Ok(Some(sim.nodes()[1].position())));
        assert_eq!(sim.position("Nobody"), Ok(None));
    }

    #[test]
    fn overflowing_node_is_held_in_place() {
        let mut sim = Simulation::initialize(pair(), SimulationConfig::default()).unwrap();
        sim.nodes[0] = Kinematics {
            x: 1.6e308,
            y: 300.0,
            vx: 1.6e308,
            vy: 0.0,
        };
        sim.step().unwrap();

        let runaway = sim.nodes()[0];
        assert_eq!(runaway.speed(), 0.0);
        assert!(sim.nodes().iter().all(|k| k.position().is_finite()));
    }

    #[test]
    fn huge_bounds_keep_positions_finite() {
        let npcs: Vec<Npc> = ["A", "B", "C", "D"].into_iter().map(Npc::new).collect();
        let graph = GraphBuilder::new().build(&npcs).unwrap().graph;
        let mut sim =
            Simulation::with_bounds(graph, Bounds::new(1.7e308, 1.7e308)).unwrap();
        for _ in 0..3 {
            sim.step().unwrap();
            assert!(sim.nodes().iter().all(|k| k.position().is_finite()));
        }
    }
}
