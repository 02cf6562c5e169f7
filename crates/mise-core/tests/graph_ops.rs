use mise_core::graph::{DependencyGraph, GraphError, Projection, Resolved};

fn pizza_graph() -> DependencyGraph<String> {
    let mut g = DependencyGraph::new();
    for id in [
        "pepperoni-pizza",
        "pepperoni",
        "base-pizza",
        "cheese",
        "tomato-sauce",
    ] {
        g.insert(id, id.to_string());
    }
    g.set_dependency("pepperoni-pizza", "pepperoni").unwrap();
    g.set_dependency("pepperoni-pizza", "base-pizza").unwrap();
    g.set_dependency("base-pizza", "cheese").unwrap();
    g.set_dependency("base-pizza", "tomato-sauce").unwrap();
    g
}

#[test]
fn test_insert_then_replace_keeps_size() {
    let mut g = DependencyGraph::new();
    g.insert("flour", 1);
    g.insert("flour", 2);

    assert_eq!(g.len(), 1);
    assert_eq!(g.get("flour"), Some(&2));
}

#[test]
fn test_insert_preserves_edges_on_replace() {
    let mut g = DependencyGraph::new();
    g.insert("dough", 1);
    g.insert("flour", 2);
    g.set_dependency("dough", "flour").unwrap();

    g.insert("dough", 10);
    assert_eq!(g.dependency_ids("dough").unwrap(), vec!["flour"]);
}

#[test]
fn test_set_value() {
    let mut g = DependencyGraph::new();
    g.insert("flour", 1);

    g.set_value("flour", 5).unwrap();
    assert_eq!(g.get("flour"), Some(&5));

    let err = g.set_value("sugar", 1).unwrap_err();
    assert_eq!(
        err,
        GraphError::NodeNotFound {
            id: "sugar".to_string()
        }
    );
}

#[test]
fn test_get_unknown_is_none() {
    let g: DependencyGraph<u32> = DependencyGraph::new();
    assert_eq!(g.get("anything"), None);
}

#[test]
fn test_set_dependency_requires_both_endpoints() {
    let mut g = DependencyGraph::new();
    g.insert("dough", ());

    assert!(matches!(
        g.set_dependency("dough", "flour"),
        Err(GraphError::NodeNotFound { .. })
    ));
    assert!(matches!(
        g.set_dependency("flour", "dough"),
        Err(GraphError::NodeNotFound { .. })
    ));
}

#[test]
fn test_duplicate_edge_is_noop() {
    let mut g = DependencyGraph::new();
    g.insert("dough", ());
    g.insert("flour", ());
    g.set_dependency("dough", "flour").unwrap();
    g.set_dependency("dough", "flour").unwrap();

    assert_eq!(g.dependency_ids("dough").unwrap(), vec!["flour"]);
}

#[test]
fn test_dependencies_post_order_values() {
    let g = pizza_graph();
    let values = g.dependency_values("pepperoni-pizza").unwrap();
    assert_eq!(
        values,
        vec!["tomato-sauce", "cheese", "base-pizza", "pepperoni"]
    );
}

#[test]
fn test_dependencies_excludes_start() {
    let g = pizza_graph();
    let ids = g.dependency_ids("pepperoni-pizza").unwrap();
    assert!(!ids.contains(&"pepperoni-pizza"));
    assert_eq!(ids.len(), 4);
}

#[test]
fn test_dependencies_projection_ids() {
    let g = pizza_graph();
    match g.dependencies("base-pizza", Projection::Ids).unwrap() {
        Resolved::Ids(ids) => assert_eq!(ids, vec!["tomato-sauce", "cheese"]),
        Resolved::Values(_) => panic!("requested ids"),
    }
}

#[test]
fn test_dependencies_each_dep_precedes_its_dependents() {
    // Shared node: both branches reach "salt"; it must appear exactly
    // once, and before each node depending on it.
    let mut g = DependencyGraph::new();
    for id in ["meal", "bread", "butter", "salt"] {
        g.insert(id, ());
    }
    g.set_dependency("meal", "bread").unwrap();
    g.set_dependency("meal", "butter").unwrap();
    g.set_dependency("bread", "salt").unwrap();
    g.set_dependency("butter", "salt").unwrap();

    let ids = g.dependency_ids("meal").unwrap();
    assert_eq!(ids.iter().filter(|id| **id == "salt").count(), 1);
    let pos = |needle: &str| ids.iter().position(|id| *id == needle).unwrap();
    assert!(pos("salt") < pos("bread"));
    assert!(pos("salt") < pos("butter"));
}

#[test]
fn test_dependencies_unknown_start() {
    let g = pizza_graph();
    assert!(matches!(
        g.dependency_ids("calzone"),
        Err(GraphError::NodeNotFound { .. })
    ));
}

#[test]
fn test_cycle_detected_with_path() {
    let mut g = pizza_graph();
    g.set_dependency("cheese", "base-pizza").unwrap();

    let err = g.dependency_ids("pepperoni-pizza").unwrap_err();
    match err {
        GraphError::Cycle { path } => {
            assert_eq!(path.first(), path.last());
            assert!(path.contains(&"base-pizza".to_string()));
            assert!(path.contains(&"cheese".to_string()));
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_self_loop_is_a_cycle() {
    let mut g = DependencyGraph::new();
    g.insert("a", ());
    g.set_dependency("a", "a").unwrap();

    let err = g.dependency_ids("a").unwrap_err();
    assert_eq!(
        err,
        GraphError::Cycle {
            path: vec!["a".to_string(), "a".to_string()]
        }
    );
}

#[test]
fn test_resolution_reflects_later_mutations() {
    // No cross-call memoization: edits between resolutions are visible.
    let mut g = pizza_graph();
    assert_eq!(g.dependency_ids("pepperoni-pizza").unwrap().len(), 4);

    g.insert("oregano", "oregano".to_string());
    g.set_dependency("base-pizza", "oregano").unwrap();

    let ids = g.dependency_ids("pepperoni-pizza").unwrap();
    assert_eq!(ids.len(), 5);
    // Most-recently-declared edge explored first within base-pizza.
    assert_eq!(ids[0], "oregano");
}

#[test]
fn test_deeply_nested_chain_does_not_overflow() {
    let mut g = DependencyGraph::new();
    let n = 50_000;
    for i in 0..n {
        g.insert(format!("n{i}"), ());
    }
    for i in 0..n - 1 {
        g.set_dependency(&format!("n{i}"), &format!("n{}", i + 1))
            .unwrap();
    }

    let ids = g.dependency_ids("n0").unwrap();
    assert_eq!(ids.len(), n - 1);
    assert_eq!(ids[0], format!("n{}", n - 1));
}

#[test]
fn test_graph_serde_round_trip() {
    let g = pizza_graph();
    let json = serde_json::to_string(&g).unwrap();
    let back: DependencyGraph<String> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), g.len());
    assert_eq!(
        back.dependency_ids("pepperoni-pizza").unwrap(),
        g.dependency_ids("pepperoni-pizza").unwrap()
    );
}
