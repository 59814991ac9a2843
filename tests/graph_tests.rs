/// Graph builder integration tests — town fixtures resolved into graphs.

use relationship_web::core::graph::{Diagnostic, GraphBuilder, GraphError, ResolutionPolicy};
use relationship_web::schema::npc::Role;
use relationship_web::schema::relationship::RelationshipKind;
use relationship_web::schema::town::TownData;
use std::path::Path;

fn load(path: &str) -> TownData {
    TownData::load_json(Path::new(path)).unwrap()
}

#[test]
fn bryn_shander_resolves_cleanly() {
    let town = load("town_data/bryn_shander.json");
    assert_eq!(town.town.as_deref(), Some("Bryn Shander"));

    let outcome = GraphBuilder::new().build(&town.npcs).unwrap();
    let graph = &outcome.graph;

    assert!(outcome.diagnostics.is_empty());
    assert_eq!(graph.node_count(), town.npcs.len());
    assert_eq!(graph.edge_count(), town.relationship_count());

    let speaker = graph.node_index("Duvessa Shane").unwrap();
    assert_eq!(graph.node(speaker).unwrap().role, Role::Speaker);
    assert_eq!(speaker, 0);

    let isolated: Vec<&str> = graph.isolated().map(|n| n.name.as_str()).collect();
    assert_eq!(isolated, vec!["Kadroth"]);
}

#[test]
fn easthaven_keeps_free_form_kinds() {
    let town = load("town_data/easthaven.json");
    let graph = GraphBuilder::strict().build(&town.npcs).unwrap().graph;

    let debtor = graph
        .edges()
        .iter()
        .find(|e| e.kind == RelationshipKind::Other("debtor".to_string()))
        .unwrap();
    assert_eq!(
        graph.endpoint_names(debtor),
        ("Imdarr Jrahn", "Dannika Vell")
    );
}

#[test]
fn every_edge_endpoint_is_a_node() {
    for path in ["town_data/bryn_shander.json", "town_data/easthaven.json"] {
        let town = load(path);
        let graph = GraphBuilder::new().build(&town.npcs).unwrap().graph;
        for edge in graph.edges() {
            assert!(edge.source < graph.node_count());
            assert!(edge.target < graph.node_count());
        }
    }
}

#[test]
fn lenient_build_reports_fixture_problems() {
    let town = load("tests/fixtures/test_town.json");
    let outcome = GraphBuilder::new().build(&town.npcs).unwrap();
    let graph = &outcome.graph;

    // The second "Bertil" record is dropped along with its relationships.
    let names: Vec<&str> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Alda", "Bertil", "Corra", "Hermit"]);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.node_index("Ghost").is_none());

    assert_eq!(
        outcome.diagnostics,
        vec![
            Diagnostic::DuplicateNode {
                name: "Bertil".to_string(),
                first: 1,
                duplicate: 3,
            },
            Diagnostic::DanglingTarget {
                owner: "Alda".to_string(),
                target: "Ghost".to_string(),
                kind: RelationshipKind::Rivalry,
            },
        ]
    );

    let dangling: Vec<&Diagnostic> = outcome
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::DanglingTarget { .. }))
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].subject(), "Ghost");
}

#[test]
fn strict_build_fails_on_first_problem() {
    let town = load("tests/fixtures/test_town.json");
    let err = GraphBuilder::new()
        .policy(ResolutionPolicy::Strict)
        .build(&town.npcs)
        .unwrap_err();
    assert_eq!(err, GraphError::DuplicateNode("Bertil".to_string()));

    // Without the duplicate the dangling target is what fails.
    let mut npcs = town.npcs.clone();
    npcs.remove(3);
    let err = GraphBuilder::strict().build(&npcs).unwrap_err();
    assert!(matches!(
        err,
        GraphError::DanglingTarget { ref target, .. } if target == "Ghost"
    ));
}

#[test]
fn roles_pass_through_unchanged() {
    let town = load("tests/fixtures/test_town.json");
    let graph = GraphBuilder::new().build(&town.npcs).unwrap().graph;
    let corra = graph.node(graph.node_index("Corra").unwrap()).unwrap();
    assert_eq!(corra.role, Role::Other("Hunter".to_string()));
    let alda = graph.node(0).unwrap();
    assert_eq!(alda.secret, "Owes the smuggler");
}
