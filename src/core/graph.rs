//! Graph model — resolves NPC relationships by name into an indexed
//! node/edge graph.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::npc::{Npc, Role};
use crate::schema::relationship::RelationshipKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("relationship '{owner}' -> '{target}' ({kind}) names no known NPC")]
    DanglingTarget {
        owner: String,
        target: String,
        kind: RelationshipKind,
    },
    #[error("NPC name '{0}' appears more than once")]
    DuplicateNode(String),
}

/// What the builder does with records it cannot resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionPolicy {
    /// Drop the offending record and report it as a `Diagnostic`.
    #[default]
    Lenient,
    /// Fail the whole build on the first offending record.
    Strict,
}

/// A problem found while building a graph under `ResolutionPolicy::Lenient`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostic {
    /// The relationship was dropped because its target is not in the town.
    DanglingTarget {
        owner: String,
        target: String,
        kind: RelationshipKind,
    },
    /// The later record was dropped along with its relationships.
    DuplicateNode {
        name: String,
        first: usize,
        duplicate: usize,
    },
}

impl Diagnostic {
    /// The NPC name the diagnostic is about: the missing target for a
    /// dangling relationship, the repeated name for a duplicate.
    pub fn subject(&self) -> &str {
        match self {
            Self::DanglingTarget { target, .. } => target,
            Self::DuplicateNode { name, .. } => name,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingTarget {
                owner,
                target,
                kind,
            } => write!(
                f,
                "dropped relationship '{owner}' -> '{target}' ({kind}): no such NPC"
            ),
            Self::DuplicateNode {
                name,
                first,
                duplicate,
            } => write!(
                f,
                "dropped record #{duplicate} '{name}': name already used by record #{first}"
            ),
        }
    }
}

impl From<Diagnostic> for GraphError {
    fn from(diagnostic: Diagnostic) -> Self {
        match diagnostic {
            Diagnostic::DanglingTarget {
                owner,
                target,
                kind,
            } => GraphError::DanglingTarget {
                owner,
                target,
                kind,
            },
            Diagnostic::DuplicateNode { name, .. } => GraphError::DuplicateNode(name),
        }
    }
}

/// A graph vertex: one NPC, minus its relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub role: Role,
    pub motivation: String,
    pub secret: String,
}

/// A resolved relationship. Endpoints index into `Graph::nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub kind: RelationshipKind,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Immutable NPC graph. Use `GraphBuilder` to construct.
///
/// Node names are unique and every edge endpoint is a valid node index.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: FxHashMap<String, usize>,
}

impl Graph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of an edge's endpoints, in (source, target) order.
    pub fn endpoint_names(&self, edge: &Edge) -> (&str, &str) {
        (
            self.nodes[edge.source].name.as_str(),
            self.nodes[edge.target].name.as_str(),
        )
    }

    /// Number of edges touching `index`, in either direction. A self-loop
    /// counts once.
    pub fn degree(&self, index: usize) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == index || e.target == index)
            .count()
    }

    /// Indices of the nodes sharing an edge with `index`, one entry per edge.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().filter_map(move |e| {
            if e.source == index {
                Some(e.target)
            } else if e.target == index {
                Some(e.source)
            } else {
                None
            }
        })
    }

    /// Nodes with no relationships at all.
    pub fn isolated(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.degree(*i) == 0)
            .map(|(_, n)| n)
    }
}

/// The graph together with everything the lenient policy dropped.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: Graph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds a `Graph` from NPC records.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder {
    policy: ResolutionPolicy,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            policy: ResolutionPolicy::Strict,
        }
    }

    pub fn policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve `npcs` into a graph.
    ///
    /// Nodes keep input order and edges follow the order of each NPC's
    /// relationship list. Under the strict policy the first duplicate name
    /// or dangling target aborts the build; under the lenient policy the
    /// record is dropped and reported instead.
    pub fn build(&self, npcs: &[Npc]) -> Result<BuildOutcome, GraphError> {
        let mut graph = Graph::default();
        let mut diagnostics = Vec::new();
        // Input record behind each node, by node index.
        let mut records: Vec<usize> = Vec::with_capacity(npcs.len());

        for (i, npc) in npcs.iter().enumerate() {
            if let Some(&node) = graph.index.get(&npc.name) {
                self.reject(
                    Diagnostic::DuplicateNode {
                        name: npc.name.clone(),
                        first: records[node],
                        duplicate: i,
                    },
                    &mut diagnostics,
                )?;
                continue;
            }

            graph.index.insert(npc.name.clone(), graph.nodes.len());
            graph.nodes.push(Node {
                name: npc.name.clone(),
                role: npc.role.clone(),
                motivation: npc.motivation.clone(),
                secret: npc.secret.clone(),
            });
            records.push(i);
        }

        for (source, &record) in records.iter().enumerate() {
            let npc = &npcs[record];
            for rel in &npc.relationships {
                match graph.index.get(&rel.target) {
                    Some(&target) => graph.edges.push(Edge {
                        source,
                        target,
                        kind: rel.kind.clone(),
                    }),
                    None => self.reject(
                        Diagnostic::DanglingTarget {
                            owner: npc.name.clone(),
                            target: rel.target.clone(),
                            kind: rel.kind.clone(),
                        },
                        &mut diagnostics,
                    )?,
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            diagnostics = diagnostics.len(),
            "built relationship graph"
        );

        Ok(BuildOutcome { graph, diagnostics })
    }

    fn reject(
        &self,
        diagnostic: Diagnostic,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), GraphError> {
        match self.policy {
            ResolutionPolicy::Strict => Err(diagnostic.into()),
            ResolutionPolicy::Lenient => {
                warn!("{diagnostic}");
                diagnostics.push(diagnostic);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bryn_shander() -> Vec<Npc> {
        vec![
            Npc::new("Duvessa Shane")
                .with_role(Role::Speaker)
                .relates_to("Markham Southwell", "alliance"),
            Npc::new("Markham Southwell").relates_to("Duvessa Shane", "alliance"),
            Npc::new("Rendaril")
                .with_role(Role::Merchant)
                .relates_to("Duvessa Shane", "rivalry"),
        ]
    }

    #[test]
    fn builds_nodes_in_input_order() {
        let outcome = GraphBuilder::new().build(&bryn_shander()).unwrap();
        let names: Vec<&str> = outcome
            .graph
            .nodes()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, ["Duvessa Shane", "Markham Southwell", "Rendaril"]);
        assert_eq!(outcome.graph.edge_count(), 3);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn edges_resolve_to_indices() {
        let outcome = GraphBuilder::new().build(&bryn_shander()).unwrap();
        let graph = &outcome.graph;
        let rivalry = &graph.edges()[2];
        assert_eq!(rivalry.kind, RelationshipKind::Rivalry);
        assert_eq!(
            graph.endpoint_names(rivalry),
            ("Rendaril", "Duvessa Shane")
        );
        assert_eq!(graph.node_index("Rendaril"), Some(2));
        assert_eq!(graph.node_index("Scramsax"), None);
    }

    #[test]
    fn lenient_drops_dangling_target() {
        let mut npcs = bryn_shander();
        npcs[2] = npcs[2].clone().relates_to("Scramsax", "debt");

        let outcome = GraphBuilder::new().build(&npcs).unwrap();
        assert_eq!(outcome.graph.edge_count(), 3);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].subject(), "Scramsax");
        assert!(matches!(
            &outcome.diagnostics[0],
            Diagnostic::DanglingTarget { owner, .. } if owner == "Rendaril"
        ));
    }

    #[test]
    fn strict_fails_on_dangling_target() {
        let npcs = vec![Npc::new("A").relates_to("Ghost", "alliance")];
        let err = GraphBuilder::strict().build(&npcs).unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingTarget {
                owner: "A".to_string(),
                target: "Ghost".to_string(),
                kind: RelationshipKind::Alliance,
            }
        );
    }

    #[test]
    fn lenient_drops_duplicate_and_its_relationships() {
        let npcs = vec![
            Npc::new("A").relates_to("B", "alliance"),
            Npc::new("B"),
            Npc::new("A").relates_to("B", "rivalry"),
        ];
        let outcome = GraphBuilder::new().build(&npcs).unwrap();
        assert_eq!(outcome.graph.node_count(), 2);
        assert_eq!(outcome.graph.edge_count(), 1);
        assert_eq!(outcome.graph.edges()[0].kind, RelationshipKind::Alliance);
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::DuplicateNode {
                name: "A".to_string(),
                first: 0,
                duplicate: 2,
            }]
        );
    }

    #[test]
    fn strict_fails_on_duplicate() {
        let npcs = vec![Npc::new("A"), Npc::new("A")];
        let err = GraphBuilder::new()
            .policy(ResolutionPolicy::Strict)
            .build(&npcs)
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("A".to_string()));
    }

    #[test]
    fn duplicate_edges_are_kept() {
        let npcs = vec![
            Npc::new("A")
                .relates_to("B", "alliance")
                .relates_to("B", "alliance"),
            Npc::new("B"),
        ];
        let outcome = GraphBuilder::new().build(&npcs).unwrap();
        assert_eq!(outcome.graph.edge_count(), 2);
    }

    #[test]
    fn degree_neighbors_and_isolated() {
        let npcs = vec![
            Npc::new("A").relates_to("B", "alliance"),
            Npc::new("B").relates_to("C", "rivalry"),
            Npc::new("C"),
            Npc::new("Hermit"),
        ];
        let graph = GraphBuilder::new().build(&npcs).unwrap().graph;
        assert_eq!(graph.degree(1), 2);
        let mut around_b: Vec<usize> = graph.neighbors(1).collect();
        around_b.sort();
        assert_eq!(around_b, vec![0, 2]);
        let isolated: Vec<&str> = graph.isolated().map(|n| n.name.as_str()).collect();
        assert_eq!(isolated, ["Hermit"]);
    }

    #[test]
    fn build_is_deterministic() {
        let a = GraphBuilder::new().build(&bryn_shander()).unwrap().graph;
        let b = GraphBuilder::new().build(&bryn_shander()).unwrap().graph;
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.edges(), b.edges());
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let outcome = GraphBuilder::new().build(&[]).unwrap();
        assert!(outcome.graph.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }
}
