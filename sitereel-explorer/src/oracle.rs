//! Optional external oracles and their mandatory deterministic fallbacks.
//!
//! An AI service can rank links or analyze page content, but the pipeline
//! never depends on one being present or healthy: every consumer falls
//! back to [`KeywordRanker`] (or, for analyses, the generic timeline).

use crate::error::Result;
use async_trait::async_trait;
use sitereel_core::{ContentAnalysis, LinkCandidate};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Context handed to a ranker alongside the candidates.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    pub is_spa: bool,
}

/// Ranks candidate links by expected demo value. Returns an ordered subset
/// of the candidates' hrefs; anything omitted is considered uninteresting.
#[async_trait]
pub trait LinkRanker: Send + Sync {
    async fn rank_links(
        &self,
        context: &PageContext,
        candidates: &[LinkCandidate],
    ) -> Result<Vec<String>>;
}

/// Supplies per-URL section/interaction analyses for timeline building.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<ContentAnalysis>;
}

/// Run an analyzer over a set of URLs, dropping failures. Pages the
/// analyzer could not cover fall back to the generic timeline pattern.
pub async fn collect_analyses(
    analyzer: &dyn ContentAnalyzer,
    urls: impl IntoIterator<Item = String>,
) -> HashMap<String, ContentAnalysis> {
    let mut analyses = HashMap::new();
    for url in urls {
        match analyzer.analyze(&url).await {
            Ok(analysis) => {
                analyses.insert(url, analysis);
            }
            Err(e) => debug!(url = %url, "content analysis unavailable: {}", e),
        }
    }
    analyses
}

// Higher is more demo-worthy. First match on path or link text wins.
const KEYWORD_SCORES: [(&str, i64); 12] = [
    ("pricing", 90),
    ("feature", 85),
    ("product", 80),
    ("demo", 75),
    ("solution", 70),
    ("service", 65),
    ("docs", 60),
    ("about", 40),
    ("contact", 35),
    ("blog", 20),
    ("login", 5),
    ("signin", 5),
];

const UNMATCHED_SCORE: i64 = 30;
const NAV_BONUS: i64 = 10;
const SHALLOW_PATH_BONUS: i64 = 5;

/// The deterministic fallback ranker. No network, no model, no surprises.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordRanker;

impl KeywordRanker {
    pub fn score(link: &LinkCandidate) -> i64 {
        let path = Url::parse(&link.href)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| link.href.to_lowercase());
        let text = link.text.to_lowercase();

        let mut score = KEYWORD_SCORES
            .iter()
            .find(|(keyword, _)| path.contains(keyword) || text.contains(keyword))
            .map(|(_, score)| *score)
            .unwrap_or(UNMATCHED_SCORE);

        if link.is_nav {
            score += NAV_BONUS;
        }
        if path.trim_matches('/').split('/').count() <= 1 {
            score += SHALLOW_PATH_BONUS;
        }
        score
    }

    /// Candidates ordered by descending score; ties keep capture order.
    pub fn rank(candidates: &[LinkCandidate]) -> Vec<String> {
        let mut scored: Vec<(i64, &LinkCandidate)> = candidates
            .iter()
            .map(|link| (Self::score(link), link))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, link)| link.href.clone()).collect()
    }
}

#[async_trait]
impl LinkRanker for KeywordRanker {
    async fn rank_links(
        &self,
        _context: &PageContext,
        candidates: &[LinkCandidate],
    ) -> Result<Vec<String>> {
        Ok(Self::rank(candidates))
    }
}
