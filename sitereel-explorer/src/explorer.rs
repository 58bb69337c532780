//! Drives one browser session over a live site and builds the navigation
//! graph.
//!
//! Graph mode walks an explicit work-stack of frames instead of recursing,
//! so call-stack growth stays flat on deep sites and the per-node safety
//! counter is an invariant over the stack. Flat mode is the legacy surface:
//! homepage plus the top-ranked pages at depth 1, no backtracking, no SPA
//! awareness.

use crate::browser::{Browser, ClickTarget, RawLink};
use crate::error::{ExploreError, Result};
use crate::oracle::{KeywordRanker, LinkRanker, PageContext};
use crate::spa::SpaDetector;
use crate::strategy::{ExplorationAction, Strategy, StrategyConfig, StrategyKind, StrategyStats};
use serde::Serialize;
use sitereel_core::{EdgeKind, LinkCandidate, NavigationGraph, NavigationNode, NodeId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// At most this many outbound links are kept per page.
const LINK_CAP: usize = 50;

const ASSET_EXTENSIONS: [&str; 22] = [
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "css", "js", "mjs", "json", "xml", "pdf",
    "zip", "gz", "tar", "mp3", "mp4", "webm", "woff", "woff2", "ttf",
];

#[derive(Debug, Clone)]
pub struct ExplorerOptions {
    /// Ceiling on discovered states (the graph capacity)
    pub max_pages: usize,
    pub max_depth: usize,
    pub strategy: StrategyKind,
    /// Optional topic bias handed to the strategy
    pub focus: Option<String>,
    pub nav_timeout: Duration,
    pub settle_timeout: Duration,
    /// How long to poll for an SPA state change after a click
    pub state_change_timeout: Duration,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_depth: 3,
            strategy: StrategyKind::Priority,
            focus: None,
            nav_timeout: Duration::from_secs(10),
            settle_timeout: Duration::from_secs(3),
            state_change_timeout: Duration::from_secs(2),
        }
    }
}

/// Flat page row in the shape older callers expect.
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub depth: usize,
    pub links_found: usize,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct Exploration {
    pub run_id: String,
    pub start_url: String,
    pub spa: bool,
    pub framework: String,
    pub graph: NavigationGraph,
    pub pages: Vec<PageSummary>,
    pub stats: StrategyStats,
}

/// One entry of the explicit work-stack: a node being explored and how many
/// loop iterations it has consumed.
struct Frame {
    node_id: NodeId,
    iterations: usize,
}

impl Frame {
    fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            iterations: 0,
        }
    }
}

/// Orchestrates the browser and builds the graph. One explorer serves one
/// run; graph and strategy are exclusively owned by it.
pub struct SiteExplorer {
    browser: Arc<dyn Browser>,
    options: ExplorerOptions,
    ranker: Option<Arc<dyn LinkRanker>>,
}

impl SiteExplorer {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            browser,
            options: ExplorerOptions::default(),
            ranker: None,
        }
    }

    pub fn with_options(mut self, options: ExplorerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.options.max_pages = max_pages;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.options.strategy = strategy;
        self
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.options.focus = Some(focus.into());
        self
    }

    pub fn with_ranker(mut self, ranker: Arc<dyn LinkRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    /// Graph mode. Only failure to reach the start URL is fatal; everything
    /// after that is recovered locally and exploration continues.
    pub async fn explore(&self, start_url: &str) -> Result<Exploration> {
        let run_id = Uuid::new_v4().to_string();
        let base_domain = host_of(start_url)?;
        info!(run = %run_id, url = start_url, "starting graph exploration");

        self.browser
            .navigate(start_url, self.options.nav_timeout)
            .await
            .map_err(|e| ExploreError::StartUnreachable {
                url: start_url.to_string(),
                reason: e.to_string(),
            })?;
        let _ = self
            .browser
            .wait_for_load_settled(self.options.settle_timeout)
            .await;

        let mut detector = SpaDetector::new(self.browser.clone());
        let spa = detector.is_spa().await;
        let framework = detector.detect_framework().await;
        debug!(spa, framework = %framework, "site profile");

        // History instrumentation is diagnostics only; drivers without
        // scripting simply run without it.
        let interception = detector.intercept_navigation().await.ok();

        let mut graph = NavigationGraph::new(self.options.max_pages);
        let root_url = self
            .browser
            .current_url()
            .await
            .unwrap_or_else(|_| start_url.to_string());
        let root_title = self.browser.title().await.unwrap_or_default();
        let root_hash = if spa { detector.state_hash().await } else { None };
        let root = NavigationNode::new(root_url, root_hash, root_title, None, 0);
        let root_id = root.id.clone();
        graph.add_node(root)?;
        graph.set_root(&root_id)?;

        let mut strategy = Strategy::new(
            self.options.strategy,
            StrategyConfig {
                max_depth: self.options.max_depth,
                max_total_nodes: self.options.max_pages,
                focus: self.options.focus.clone(),
                base_domain: base_domain.clone(),
            },
        );
        if let Some(ref ranker) = self.ranker {
            strategy = strategy.with_oracle(ranker.clone());
        }

        let safety_limit = 2 * self.options.max_pages;
        let mut stack: Vec<Frame> = vec![Frame::new(root_id.clone())];
        self.arrive(&mut graph, &root_id, &base_domain).await;

        loop {
            let (node_id, tripped) = {
                let Some(top) = stack.last_mut() else { break };
                top.iterations += 1;
                (top.node_id.clone(), top.iterations > safety_limit)
            };

            let Some(node) = graph.get_node(&node_id).cloned() else {
                stack.pop();
                continue;
            };

            if tripped {
                warn!(url = %node.url, limit = safety_limit, "safety counter tripped, abandoning node");
                self.finish_frame(&mut graph, &mut stack, &detector).await;
                continue;
            }

            let action = strategy
                .select_next_action(&node, &node.unexplored_links, graph.size())
                .await;

            match action {
                ExplorationAction::Done | ExplorationAction::Back => {
                    self.finish_frame(&mut graph, &mut stack, &detector).await;
                }
                ExplorationAction::Click(link) => {
                    self.follow_link(&mut graph, &mut stack, &detector, spa, &node, &link, &base_domain)
                        .await;
                }
            }
        }

        if let Some(interception) = interception {
            if let Ok(events) = interception.drain_events().await {
                debug!(events = events.len(), "history events observed");
            }
            if let Err(e) = interception.uninstall().await {
                debug!("could not uninstall history instrumentation: {}", e);
            }
        }

        let stats = strategy.stats().clone();
        info!(
            nodes = graph.size(),
            edges = graph.edge_count(),
            "exploration finished"
        );

        Ok(Exploration {
            run_id,
            start_url: start_url.to_string(),
            spa,
            framework,
            pages: summarize(&graph),
            stats,
            graph,
        })
    }

    /// Legacy flat mode: homepage plus the top-ranked links at depth 1.
    pub async fn explore_flat(&self, start_url: &str) -> Result<Exploration> {
        let run_id = Uuid::new_v4().to_string();
        let base_domain = host_of(start_url)?;
        info!(run = %run_id, url = start_url, "starting flat exploration");

        self.browser
            .navigate(start_url, self.options.nav_timeout)
            .await
            .map_err(|e| ExploreError::StartUnreachable {
                url: start_url.to_string(),
                reason: e.to_string(),
            })?;
        let _ = self
            .browser
            .wait_for_load_settled(self.options.settle_timeout)
            .await;

        let mut graph = NavigationGraph::new(self.options.max_pages);
        let root_url = self
            .browser
            .current_url()
            .await
            .unwrap_or_else(|_| start_url.to_string());
        let root_title = self.browser.title().await.unwrap_or_default();
        let raw = self.browser.capture_links().await.unwrap_or_default();
        let links = filter_links(raw, &base_domain, &root_url);

        let mut root = NavigationNode::new(root_url.clone(), None, root_title.clone(), None, 0);
        root.record_visit();
        root.set_unexplored_links(links.clone());
        let root_id = root.id.clone();
        graph.add_node(root)?;
        graph.set_root(&root_id)?;

        let context = PageContext {
            url: root_url,
            title: root_title,
            is_spa: false,
        };
        let order = match &self.ranker {
            Some(ranker) => match ranker.rank_links(&context, &links).await {
                Ok(order) if !order.is_empty() => order,
                Ok(_) => KeywordRanker::rank(&links),
                Err(e) => {
                    warn!("ranking oracle failed: {}", e);
                    KeywordRanker::rank(&links)
                }
            },
            None => KeywordRanker::rank(&links),
        };

        for href in order
            .into_iter()
            .take(self.options.max_pages.saturating_sub(1))
        {
            if let Some(node) = graph.get_node_mut(&root_id) {
                node.mark_link_explored(&href);
            }
            if let Err(e) = self.browser.navigate(&href, self.options.nav_timeout).await {
                warn!(href = %href, "skipping page: {}", e);
                continue;
            }
            let _ = self
                .browser
                .wait_for_load_settled(self.options.settle_timeout)
                .await;

            let page_url = self
                .browser
                .current_url()
                .await
                .unwrap_or_else(|_| href.clone());
            let title = self.browser.title().await.unwrap_or_default();
            let mut child = NavigationNode::new(page_url, None, title, Some(root_id.clone()), 1);
            child.record_visit();
            let child_id = child.id.clone();
            let via = links.iter().find(|l| l.href == href).map(|l| l.text.clone());

            let inserted = match graph.add_node(child) {
                Ok(inserted) => inserted,
                Err(e) => {
                    debug!("stopping flat visits: {}", e);
                    break;
                }
            };
            if !inserted && let Some(existing) = graph.get_node_mut(&child_id) {
                // Two hrefs redirected to the same page; count the revisit.
                existing.record_visit();
            }
            let _ = graph.add_edge(&root_id, &child_id, via, EdgeKind::Load);
        }

        info!(nodes = graph.size(), "flat exploration finished");

        Ok(Exploration {
            run_id,
            start_url: start_url.to_string(),
            spa: false,
            framework: "unknown".to_string(),
            pages: summarize(&graph),
            stats: StrategyStats::default(),
            graph,
        })
    }

    /// Land on a node: count the visit and, on first arrival, capture and
    /// filter its outbound links.
    async fn arrive(&self, graph: &mut NavigationGraph, node_id: &NodeId, base_domain: &str) {
        let Some(node) = graph.get_node(node_id) else {
            return;
        };
        let first_visit = node.visit_count == 0;
        let node_url = node.url.clone();

        let links = if first_visit {
            let raw = self.browser.capture_links().await.unwrap_or_default();
            Some(filter_links(raw, base_domain, &node_url))
        } else {
            None
        };

        if let Some(node) = graph.get_node_mut(node_id) {
            node.record_visit();
            if let Some(links) = links {
                debug!(url = %node_url, links = links.len(), "captured outbound links");
                node.set_unexplored_links(links);
            }
        }
    }

    /// Pop the finished node and bring the session back to its parent. The
    /// unwind is itself an observed transition, so it gets an edge.
    async fn finish_frame(
        &self,
        graph: &mut NavigationGraph,
        stack: &mut Vec<Frame>,
        detector: &SpaDetector,
    ) {
        let Some(finished) = stack.pop() else { return };
        let Some(parent_frame) = stack.last() else {
            return;
        };
        let Some(parent) = graph.get_node(&parent_frame.node_id).cloned() else {
            return;
        };
        let kind = self.return_to(detector, &parent).await;
        let _ = graph.add_edge(&finished.node_id, &parent.id, None, kind);
    }

    /// Issue one link: click (or direct-load), diff URL and state hash, and
    /// either discard, record a revisit, or create and descend into a child.
    #[allow(clippy::too_many_arguments)]
    async fn follow_link(
        &self,
        graph: &mut NavigationGraph,
        stack: &mut Vec<Frame>,
        detector: &SpaDetector,
        spa: bool,
        node: &NavigationNode,
        link: &LinkCandidate,
        base_domain: &str,
    ) {
        // The link is spent the moment it is issued, whatever happens next.
        if let Some(n) = graph.get_node_mut(&node.id) {
            n.mark_link_explored(&link.href);
        }

        let before_url = self.browser.current_url().await.ok();
        let before_hash = if spa { detector.state_hash().await } else { None };

        let mut via_load = false;
        let clicked = self
            .browser
            .click(&ClickTarget::Selector(link.selector.clone()))
            .await
            .is_ok();
        if clicked {
            self.settle_after_transition(detector, spa, before_hash.as_deref())
                .await;
        }

        let mut after_url = self.browser.current_url().await.ok();
        let mut after_hash = if spa { detector.state_hash().await } else { None };

        if !clicked || (after_url == before_url && after_hash == before_hash) {
            // The click went nowhere; try the address bar instead.
            if let Err(e) = self.browser.navigate(&link.href, self.options.nav_timeout).await {
                debug!(href = %link.href, "navigation failed: {}", e);
                return;
            }
            via_load = true;
            let _ = self
                .browser
                .wait_for_load_settled(self.options.settle_timeout)
                .await;
            after_url = self.browser.current_url().await.ok();
            after_hash = if spa { detector.state_hash().await } else { None };
        }

        let Some(after_url) = after_url else {
            debug!(href = %link.href, "post-click URL unknown, discarding");
            return;
        };
        if spa && after_hash.is_none() {
            // Hash unobtainable mid-navigation: conservatively no change.
            debug!(href = %link.href, "post-click state unknown, discarding");
            self.return_to(detector, node).await;
            return;
        }
        if Some(&after_url) == before_url.as_ref() && after_hash == before_hash {
            debug!(href = %link.href, "click changed nothing, discarding");
            return;
        }

        let kind = if via_load { EdgeKind::Load } else { EdgeKind::Click };
        let child_id = NodeId::derive(&after_url, after_hash.as_deref());
        if child_id == node.id {
            return;
        }

        if graph.contains(&child_id) {
            // A state we already hold; keep the non-tree edge and go back.
            if let Some(existing) = graph.get_node_mut(&child_id) {
                existing.record_visit();
            }
            let _ = graph.add_edge(&node.id, &child_id, Some(link.text.clone()), kind);
            self.return_to(detector, node).await;
            return;
        }

        let title = self.browser.title().await.unwrap_or_default();
        let child = NavigationNode::new(
            after_url,
            after_hash,
            title,
            Some(node.id.clone()),
            node.depth + 1,
        );
        let child_id = child.id.clone();
        let child_depth = child.depth;
        if let Err(e) = graph.add_node(child) {
            debug!("could not add node: {}", e);
            self.return_to(detector, node).await;
            return;
        }
        let _ = graph.add_edge(&node.id, &child_id, Some(link.text.clone()), kind);
        debug!(id = %child_id, depth = child_depth, "discovered state");

        if child_depth < self.options.max_depth {
            stack.push(Frame::new(child_id.clone()));
            self.arrive(graph, &child_id, base_domain).await;
        } else {
            if let Some(n) = graph.get_node_mut(&child_id) {
                n.record_visit();
            }
            self.return_to(detector, node).await;
        }
    }

    async fn settle_after_transition(
        &self,
        detector: &SpaDetector,
        spa: bool,
        baseline: Option<&str>,
    ) {
        match baseline {
            Some(baseline) if spa => {
                detector
                    .wait_for_state_change(baseline, self.options.state_change_timeout)
                    .await;
            }
            _ => {
                let _ = self
                    .browser
                    .wait_for_load_settled(self.options.settle_timeout)
                    .await;
            }
        }
    }

    /// Bring the session back to `node`: native history back confirmed by
    /// re-hashing, else a direct URL reload. The reload may not restore pure
    /// client-state-only routes; that gap is accepted.
    async fn return_to(&self, detector: &SpaDetector, node: &NavigationNode) -> EdgeKind {
        if detector.can_navigate_back().await
            && detector
                .navigate_back(&node.url, node.state_hash.as_deref(), self.options.settle_timeout)
                .await
        {
            return EdgeKind::History;
        }
        debug!(url = %node.url, "history back not confirmed, reloading directly");
        if let Err(e) = self.browser.navigate(&node.url, self.options.nav_timeout).await {
            warn!(url = %node.url, "failed to restore position: {}", e);
        }
        let _ = self
            .browser
            .wait_for_load_settled(self.options.settle_timeout)
            .await;
        EdgeKind::Load
    }
}

fn host_of(url: &str) -> Result<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .ok_or_else(|| ExploreError::InvalidUrl(url.to_string()))
}

fn summarize(graph: &NavigationGraph) -> Vec<PageSummary> {
    graph
        .nodes()
        .map(|node| PageSummary {
            url: node.url.clone(),
            title: node.title.clone(),
            depth: node.depth,
            links_found: node.unexplored_links.len() + node.processed_links.len(),
        })
        .collect()
}

/// Shared link filter: same-host only, no asset extensions, one candidate
/// per path-and-query, capped, and never the page itself.
fn filter_links(raw: Vec<RawLink>, base_domain: &str, current_url: &str) -> Vec<LinkCandidate> {
    let mut seen = HashSet::new();
    if let Ok(current) = Url::parse(current_url) {
        seen.insert(page_key(&current));
    }

    let mut out = Vec::new();
    for link in raw {
        if out.len() >= LINK_CAP {
            break;
        }
        let Ok(parsed) = Url::parse(&link.href) else {
            continue;
        };
        let Some(host) = parsed.host_str() else {
            continue;
        };
        if host != base_domain && !host.ends_with(&format!(".{}", base_domain)) {
            continue;
        }
        if is_asset_path(parsed.path()) {
            continue;
        }
        if !seen.insert(page_key(&parsed)) {
            continue;
        }
        out.push(LinkCandidate {
            text: link.text,
            href: link.href,
            selector: link.selector,
            is_nav: link.is_nav,
        });
    }
    out
}

fn page_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn is_asset_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    ASSET_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}
