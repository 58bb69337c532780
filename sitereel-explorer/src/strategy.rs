//! Exploration policy: which link to follow next, if any.
//!
//! Every flavor shares the same guardrails (depth and node ceilings,
//! processed-link exclusion, hard cross-origin filter); flavors differ
//! only in how the surviving candidates are ranked.

use crate::oracle::{KeywordRanker, LinkRanker, PageContext};
use serde::Serialize;
use sitereel_core::{LinkCandidate, NavigationNode};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// What the explorer should do next at the current node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorationAction {
    Click(LinkCandidate),
    Back,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    BreadthFirst,
    DepthFirst,
    Priority,
    AiGuided,
}

impl StrategyKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "breadth" | "breadth-first" | "bfs" => Some(StrategyKind::BreadthFirst),
            "depth" | "depth-first" | "dfs" => Some(StrategyKind::DepthFirst),
            "priority" => Some(StrategyKind::Priority),
            "ai" | "ai-guided" => Some(StrategyKind::AiGuided),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::BreadthFirst => "breadth-first",
            StrategyKind::DepthFirst => "depth-first",
            StrategyKind::Priority => "priority",
            StrategyKind::AiGuided => "ai-guided",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub max_depth: usize,
    pub max_total_nodes: usize,
    /// Optional topic bias: candidates mentioning it rank first
    pub focus: Option<String>,
    pub base_domain: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct StrategyStats {
    pub selections: usize,
    pub clicks_issued: usize,
    pub backs_issued: usize,
    pub done_signals: usize,
    pub skipped_cross_origin: usize,
    pub skipped_processed: usize,
    pub oracle_failures: usize,
    pub deepest_node: usize,
}

/// A bound exploration policy. One instance serves one run.
pub struct Strategy {
    kind: StrategyKind,
    config: StrategyConfig,
    oracle: Option<Arc<dyn LinkRanker>>,
    stats: StrategyStats,
}

impl Strategy {
    pub fn new(kind: StrategyKind, config: StrategyConfig) -> Self {
        Self {
            kind,
            config,
            oracle: None,
            stats: StrategyStats::default(),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn LinkRanker>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn stats(&self) -> &StrategyStats {
        &self.stats
    }

    pub async fn select_next_action(
        &mut self,
        node: &NavigationNode,
        unexplored: &[LinkCandidate],
        graph_size: usize,
    ) -> ExplorationAction {
        self.stats.selections += 1;
        self.stats.deepest_node = self.stats.deepest_node.max(node.depth);

        // Ceilings refuse clicks outright, regardless of flavor.
        if node.depth >= self.config.max_depth || graph_size >= self.config.max_total_nodes {
            self.stats.done_signals += 1;
            return ExplorationAction::Done;
        }

        let eligible = self.eligible_candidates(node, unexplored);
        if eligible.is_empty() {
            return if node.parent.is_some() {
                self.stats.backs_issued += 1;
                ExplorationAction::Back
            } else {
                self.stats.done_signals += 1;
                ExplorationAction::Done
            };
        }

        let ranked = self.rank(node, eligible).await;
        match ranked.into_iter().next() {
            Some(link) => {
                self.stats.clicks_issued += 1;
                ExplorationAction::Click(link)
            }
            None => {
                self.stats.done_signals += 1;
                ExplorationAction::Done
            }
        }
    }

    /// Guardrails applied before any ranking: drop processed hrefs and
    /// anything pointing off the base domain.
    fn eligible_candidates(
        &mut self,
        node: &NavigationNode,
        unexplored: &[LinkCandidate],
    ) -> Vec<LinkCandidate> {
        let mut eligible = Vec::with_capacity(unexplored.len());
        for link in unexplored {
            if node.processed_links.contains(&link.href) {
                self.stats.skipped_processed += 1;
                continue;
            }
            if !is_same_domain(&link.href, &self.config.base_domain) {
                self.stats.skipped_cross_origin += 1;
                continue;
            }
            eligible.push(link.clone());
        }
        eligible
    }

    async fn rank(&mut self, node: &NavigationNode, eligible: Vec<LinkCandidate>) -> Vec<LinkCandidate> {
        let mut ranked = match self.kind {
            // Capture (document) order is the breadth-first queue.
            StrategyKind::BreadthFirst => eligible,
            StrategyKind::DepthFirst => {
                let mut links = eligible;
                links.sort_by_key(|link| std::cmp::Reverse(path_depth(&link.href)));
                links
            }
            StrategyKind::Priority => keyword_order(eligible),
            StrategyKind::AiGuided => {
                let context = PageContext {
                    url: node.url.clone(),
                    title: node.title.clone(),
                    is_spa: node.state_hash.is_some(),
                };
                match &self.oracle {
                    Some(oracle) => match oracle.rank_links(&context, &eligible).await {
                        Ok(order) if !order.is_empty() => order_by_hrefs(eligible, order),
                        Ok(_) => {
                            debug!("oracle returned no ranking, using keyword fallback");
                            self.stats.oracle_failures += 1;
                            keyword_order(eligible)
                        }
                        Err(e) => {
                            warn!("link ranking oracle failed: {}", e);
                            self.stats.oracle_failures += 1;
                            keyword_order(eligible)
                        }
                    },
                    None => {
                        self.stats.oracle_failures += 1;
                        keyword_order(eligible)
                    }
                }
            }
        };

        if let Some(ref focus) = self.config.focus {
            let focus = focus.to_lowercase();
            // Stable partition: focused candidates first, order preserved.
            let (hits, rest): (Vec<_>, Vec<_>) = ranked.into_iter().partition(|link| {
                link.href.to_lowercase().contains(&focus)
                    || link.text.to_lowercase().contains(&focus)
            });
            ranked = hits.into_iter().chain(rest).collect();
        }
        ranked
    }
}

fn keyword_order(eligible: Vec<LinkCandidate>) -> Vec<LinkCandidate> {
    let order = KeywordRanker::rank(&eligible);
    order_by_hrefs(eligible, order)
}

/// Reorder `links` to follow `order` (a list of hrefs); anything the
/// ranking omitted keeps its relative position at the tail.
fn order_by_hrefs(links: Vec<LinkCandidate>, order: Vec<String>) -> Vec<LinkCandidate> {
    let mut remaining = links;
    let mut out = Vec::with_capacity(remaining.len());
    for href in order {
        if let Some(pos) = remaining.iter().position(|l| l.href == href) {
            out.push(remaining.remove(pos));
        }
    }
    out.extend(remaining);
    out
}

fn path_depth(href: &str) -> usize {
    Url::parse(href)
        .map(|u| u.path().trim_matches('/').split('/').filter(|s| !s.is_empty()).count())
        .unwrap_or(0)
}

fn is_same_domain(href: &str, base_domain: &str) -> bool {
    if let Ok(parsed) = Url::parse(href)
        && let Some(host) = parsed.host_str()
    {
        return host == base_domain || host.ends_with(&format!(".{}", base_domain));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitereel_core::NavigationNode;

    fn link(href: &str, text: &str, is_nav: bool) -> LinkCandidate {
        LinkCandidate {
            text: text.to_string(),
            href: href.to_string(),
            selector: format!("a[href=\"{}\"]", href),
            is_nav,
        }
    }

    fn config() -> StrategyConfig {
        StrategyConfig {
            max_depth: 3,
            max_total_nodes: 10,
            focus: None,
            base_domain: "example.com".to_string(),
        }
    }

    fn node_at(depth: usize) -> NavigationNode {
        let parent = if depth == 0 {
            None
        } else {
            Some(sitereel_core::NodeId::derive("https://example.com/", None))
        };
        NavigationNode::new("https://example.com/page", None, "Page", parent, depth)
    }

    #[tokio::test]
    async fn test_done_at_max_depth() {
        let mut strategy = Strategy::new(StrategyKind::BreadthFirst, config());
        let node = node_at(3);
        let links = vec![link("https://example.com/a", "A", false)];
        let action = strategy.select_next_action(&node, &links, 1).await;
        assert_eq!(action, ExplorationAction::Done);
    }

    #[tokio::test]
    async fn test_done_at_node_ceiling() {
        let mut strategy = Strategy::new(StrategyKind::BreadthFirst, config());
        let node = node_at(0);
        let links = vec![link("https://example.com/a", "A", false)];
        let action = strategy.select_next_action(&node, &links, 10).await;
        assert_eq!(action, ExplorationAction::Done);
    }

    #[tokio::test]
    async fn test_cross_origin_excluded_under_any_flavor() {
        for kind in [
            StrategyKind::BreadthFirst,
            StrategyKind::DepthFirst,
            StrategyKind::Priority,
            StrategyKind::AiGuided,
        ] {
            let mut strategy = Strategy::new(kind, config());
            let node = node_at(1);
            let links = vec![link("https://evil.test/trap", "Free stuff", true)];
            let action = strategy.select_next_action(&node, &links, 1).await;
            assert_eq!(action, ExplorationAction::Back, "kind {:?}", kind);
            assert_eq!(strategy.stats().skipped_cross_origin, 1);
        }
    }

    #[tokio::test]
    async fn test_subdomain_is_same_domain() {
        let mut strategy = Strategy::new(StrategyKind::BreadthFirst, config());
        let node = node_at(1);
        let links = vec![link("https://docs.example.com/start", "Docs", false)];
        let action = strategy.select_next_action(&node, &links, 1).await;
        assert!(matches!(action, ExplorationAction::Click(_)));
    }

    #[tokio::test]
    async fn test_processed_links_never_reselected() {
        let mut strategy = Strategy::new(StrategyKind::BreadthFirst, config());
        let mut node = node_at(1);
        node.processed_links.insert("https://example.com/a".to_string());
        let links = vec![
            link("https://example.com/a", "A", false),
            link("https://example.com/b", "B", false),
        ];
        let action = strategy.select_next_action(&node, &links, 1).await;
        match action {
            ExplorationAction::Click(chosen) => assert_eq!(chosen.href, "https://example.com/b"),
            other => panic!("expected click, got {:?}", other),
        }
        assert_eq!(strategy.stats().skipped_processed, 1);
    }

    #[tokio::test]
    async fn test_back_when_exhausted_done_at_root() {
        let mut strategy = Strategy::new(StrategyKind::BreadthFirst, config());

        let child = node_at(1);
        assert_eq!(
            strategy.select_next_action(&child, &[], 1).await,
            ExplorationAction::Back
        );

        let root = node_at(0);
        assert_eq!(
            strategy.select_next_action(&root, &[], 1).await,
            ExplorationAction::Done
        );
    }

    #[tokio::test]
    async fn test_breadth_first_keeps_document_order() {
        let mut strategy = Strategy::new(StrategyKind::BreadthFirst, config());
        let node = node_at(0);
        let links = vec![
            link("https://example.com/second/level/deep", "Deep", false),
            link("https://example.com/top", "Top", false),
        ];
        match strategy.select_next_action(&node, &links, 1).await {
            ExplorationAction::Click(chosen) => {
                assert_eq!(chosen.href, "https://example.com/second/level/deep")
            }
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_depth_first_prefers_deeper_paths() {
        let mut strategy = Strategy::new(StrategyKind::DepthFirst, config());
        let node = node_at(0);
        let links = vec![
            link("https://example.com/top", "Top", false),
            link("https://example.com/second/level/deep", "Deep", false),
        ];
        match strategy.select_next_action(&node, &links, 1).await {
            ExplorationAction::Click(chosen) => {
                assert_eq!(chosen.href, "https://example.com/second/level/deep")
            }
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_priority_uses_keyword_ranking() {
        let mut strategy = Strategy::new(StrategyKind::Priority, config());
        let node = node_at(0);
        let links = vec![
            link("https://example.com/blog", "Blog", false),
            link("https://example.com/pricing", "Pricing", false),
        ];
        match strategy.select_next_action(&node, &links, 1).await {
            ExplorationAction::Click(chosen) => {
                assert_eq!(chosen.href, "https://example.com/pricing")
            }
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ai_guided_without_oracle_falls_back() {
        let mut strategy = Strategy::new(StrategyKind::AiGuided, config());
        let node = node_at(0);
        let links = vec![
            link("https://example.com/blog", "Blog", false),
            link("https://example.com/pricing", "Pricing", false),
        ];
        match strategy.select_next_action(&node, &links, 1).await {
            ExplorationAction::Click(chosen) => {
                assert_eq!(chosen.href, "https://example.com/pricing")
            }
            other => panic!("expected click, got {:?}", other),
        }
        assert_eq!(strategy.stats().oracle_failures, 1);
    }

    #[tokio::test]
    async fn test_ai_guided_failing_oracle_falls_back() {
        struct FailingOracle;

        #[async_trait::async_trait]
        impl LinkRanker for FailingOracle {
            async fn rank_links(
                &self,
                _context: &PageContext,
                _candidates: &[LinkCandidate],
            ) -> crate::error::Result<Vec<String>> {
                Err(crate::error::ExploreError::Other("model offline".into()))
            }
        }

        let mut strategy =
            Strategy::new(StrategyKind::AiGuided, config()).with_oracle(Arc::new(FailingOracle));
        let node = node_at(0);
        let links = vec![
            link("https://example.com/blog", "Blog", false),
            link("https://example.com/pricing", "Pricing", false),
        ];
        match strategy.select_next_action(&node, &links, 1).await {
            ExplorationAction::Click(chosen) => {
                assert_eq!(chosen.href, "https://example.com/pricing")
            }
            other => panic!("expected click, got {:?}", other),
        }
        assert_eq!(strategy.stats().oracle_failures, 1);
    }

    #[tokio::test]
    async fn test_focus_ranks_matching_links_first() {
        let mut config = config();
        config.focus = Some("reports".to_string());
        let mut strategy = Strategy::new(StrategyKind::BreadthFirst, config);
        let node = node_at(0);
        let links = vec![
            link("https://example.com/pricing", "Pricing", true),
            link("https://example.com/reports", "Reports", false),
        ];
        match strategy.select_next_action(&node, &links, 1).await {
            ExplorationAction::Click(chosen) => {
                assert_eq!(chosen.href, "https://example.com/reports")
            }
            other => panic!("expected click, got {:?}", other),
        }
    }
}
