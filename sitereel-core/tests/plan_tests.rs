//! Plan generation through the public API: chrome suppression, budget
//! conservation and the serialized artifact handed to a recorder.

use sitereel_core::{
    ContentAnalysis, DemoPlan, EdgeKind, NavigationGraph, NavigationNode, NodeId, PageSection,
    PlanOptions, SectionBounds,
};
use std::collections::HashMap;

fn build_graph(pages: &[(&str, &str, usize)]) -> NavigationGraph {
    let mut graph = NavigationGraph::new(50);
    // Parent of a depth-n page is the most recent depth n-1 page.
    let mut last_at_depth: Vec<NodeId> = Vec::new();
    for (url, title, depth) in pages {
        let parent = if *depth == 0 {
            None
        } else {
            last_at_depth.get(*depth - 1).cloned()
        };
        let node = NavigationNode::new(*url, None, *title, parent.clone(), *depth);
        let id = node.id.clone();
        graph.add_node(node).unwrap();
        if *depth == 0 {
            graph.set_root(&id).unwrap();
        } else if let Some(parent) = parent {
            graph
                .add_edge(&parent, &id, Some((*title).to_string()), EdgeKind::Click)
                .unwrap();
        }
        if last_at_depth.len() <= *depth {
            last_at_depth.resize(*depth + 1, id.clone());
        }
        last_at_depth[*depth] = id;
    }
    graph
}

fn section(kind: &str, headline: &str, score: u8, y: f64) -> PageSection {
    PageSection {
        kind: kind.to_string(),
        bounds: SectionBounds {
            x: 0.0,
            y,
            width: 1280.0,
            height: 400.0,
        },
        headline: headline.to_string(),
        demo_score: score,
        suggested_duration: None,
        key_elements: Vec::new(),
    }
}

#[test]
fn test_repeated_chrome_never_gets_a_timeline_slot() {
    let pages = [
        ("https://example.com/", "Home", 0),
        ("https://example.com/features", "Features", 1),
        ("https://example.com/pricing", "Pricing", 1),
        ("https://example.com/about", "About", 1),
    ];
    let graph = build_graph(&pages);

    // The same high-scoring nav banner shows up on every page; each page
    // also has one genuinely unique hero below the fold.
    let mut analyses = HashMap::new();
    for (i, (url, title, _)) in pages.iter().enumerate() {
        analyses.insert(
            url.to_string(),
            ContentAnalysis {
                url: url.to_string(),
                sections: vec![
                    section("nav", "Main Menu", 90, 0.0),
                    section("hero", &format!("{} Hero {}", title, i), 80, 700.0),
                ],
                interactive_elements: 2,
            },
        );
    }

    let plan = DemoPlan::create(&graph, &analyses, &PlanOptions::default()).unwrap();

    let targets: Vec<&str> = plan
        .pages
        .iter()
        .flat_map(|p| p.timeline.iter())
        .filter_map(|e| e.target.as_deref())
        .collect();
    assert!(!targets.iter().any(|t| *t == "Main Menu"));
    assert!(targets.iter().any(|t| t.contains("Hero")));
}

#[test]
fn test_budget_conserved_on_mixed_depth_graph() {
    let graph = build_graph(&[
        ("https://example.com/", "Acme", 0),
        ("https://example.com/features", "Features", 1),
        ("https://example.com/pricing", "Pricing", 1),
        ("https://example.com/docs", "Docs", 2),
        ("https://example.com/docs/api", "API Reference", 3),
        ("https://example.com/about", "About Us", 1),
    ]);
    let options = PlanOptions {
        total_duration: 45_000,
        max_pages: 5,
        ..PlanOptions::default()
    };

    let plan = DemoPlan::create(&graph, &HashMap::new(), &options).unwrap();

    assert!(plan.pages.len() <= 5);
    assert_eq!(plan.pages[0].url, "https://example.com/");

    let n = plan.pages.len() as u64;
    let total: u64 = plan.pages.iter().map(|p| p.duration).sum();
    assert!((total + (n - 1) * options.transition_time).abs_diff(options.total_duration) <= 1);
    for page in &plan.pages {
        assert!(page.duration >= options.min_page_duration);
        assert!(page.duration <= options.max_page_duration);
    }
    for pair in plan.pages.windows(2) {
        assert!(pair[1].start_time > pair[0].start_time);
    }
}

#[test]
fn test_plan_survives_json_round_trip() {
    let graph = build_graph(&[
        ("https://example.com/", "Acme", 0),
        ("https://example.com/features", "Features", 1),
    ]);
    let options = PlanOptions {
        include_narrative: true,
        ..PlanOptions::default()
    };
    let plan = DemoPlan::create(&graph, &HashMap::new(), &options).unwrap();

    let json = serde_json::to_string(&plan).unwrap();
    let parsed: DemoPlan = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.pages.len(), plan.pages.len());
    assert_eq!(parsed.total_duration, plan.total_duration);
    for (a, b) in parsed.pages.iter().zip(plan.pages.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.duration, b.duration);
        assert_eq!(a.timeline.len(), b.timeline.len());
    }
}
