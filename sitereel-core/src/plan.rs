//! Demo plan generation.
//!
//! Consumes a finished [`NavigationGraph`] plus optional per-page content
//! analyses and produces an ordered, time-boxed schedule: which pages to
//! show, for how long, in what order, and what to do on each one. The
//! output is handed to an external recorder that walks the entries in
//! `start_time` order.

use crate::content::{ContentAnalysis, ContentDeduplicator, PageSection};
use crate::graph::{NavigationGraph, NavigationNode, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// How the recorder should reach a page from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionMethod {
    /// Address-bar navigation
    Navigate,
    /// Click the link that the graph says leads here
    Click,
    /// Browser history back
    Back,
}

impl TransitionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionMethod::Navigate => "navigate",
            TransitionMethod::Click => "click",
            TransitionMethod::Back => "back",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrativeStyle {
    Professional,
    Casual,
    Technical,
}

impl NarrativeStyle {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "professional" => Some(NarrativeStyle::Professional),
            "casual" => Some(NarrativeStyle::Casual),
            "technical" => Some(NarrativeStyle::Technical),
            _ => None,
        }
    }
}

/// What the recorder does during one timeline slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineAction {
    /// Let the page settle
    Wait,
    /// Scroll a specific section into view
    ScrollTo,
    /// Slow downward scroll
    Scroll,
    /// Scroll back to the top
    ReturnToTop,
    /// Hover a key element
    Hover,
    /// Gentle camera pan over a region
    Pan,
    /// Hold the final frame
    Hold,
}

impl TimelineAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineAction::Wait => "wait",
            TimelineAction::ScrollTo => "scroll_to",
            TimelineAction::Scroll => "scroll",
            TimelineAction::ReturnToTop => "return_to_top",
            TimelineAction::Hover => "hover",
            TimelineAction::Pan => "pan",
            TimelineAction::Hold => "hold",
        }
    }
}

/// One scheduled recorder action within a page. `start_time` is relative
/// to the owning page; entries are ordered and fit within the page's
/// duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub start_time: u64,
    pub duration: u64,
    pub action: TimelineAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    pub priority: u8,
    pub skippable: bool,
}

/// One page's slot in the schedule. `start_time` is absolute within the
/// recording; `duration` excludes the transition gap that follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    pub id: NodeId,
    pub url: String,
    pub title: String,
    pub duration: u64,
    pub priority: u8,
    pub start_time: u64,
    pub transition: TransitionMethod,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOptions {
    /// Total recording budget in milliseconds
    pub total_duration: u64,
    pub max_pages: usize,
    pub min_page_duration: u64,
    pub max_page_duration: u64,
    /// Gap reserved between consecutive pages, milliseconds
    pub transition_time: u64,
    pub style: NarrativeStyle,
    pub include_narrative: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            total_duration: 60_000,
            max_pages: 8,
            min_page_duration: 3_000,
            max_page_duration: 15_000,
            transition_time: 1_500,
            style: NarrativeStyle::Professional,
            include_narrative: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("graph has no nodes to plan")]
    EmptyGraph,

    #[error("total duration {total}ms is below the minimum page duration {min}ms")]
    BudgetTooSmall { total: u64, min: u64 },

    #[error("inconsistent plan options: {0}")]
    BadOptions(String),
}

/// Opening settle wait at the start of every page timeline.
const SETTLE_WAIT_MS: u64 = 1_000;
/// Closing hold at the end of every page timeline.
const CLOSING_HOLD_MS: u64 = 500;
/// Sections scoring at or below this are not worth a dedicated slot.
const SECTION_SCORE_FLOOR: u8 = 30;
/// At most this many sections get slots on one page.
const MAX_SECTIONS_PER_PAGE: usize = 5;
/// Viewport fold; sections starting below it get a scroll-to first.
const FOLD_PX: f64 = 600.0;

const TITLE_KEYWORDS: [&str; 7] = [
    "feature", "pricing", "product", "service", "solution", "demo", "about",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageCategory {
    Showcase, // features / products / solutions / services
    Pricing,
    Resources, // docs / blog / resources
    Company,   // about / team / contact
    Other,
}

impl PageCategory {
    fn classify(path: &str, title: &str) -> Self {
        let haystack = format!("{} {}", path.to_lowercase(), title.to_lowercase());
        if ["feature", "product", "solution", "service"]
            .iter()
            .any(|k| haystack.contains(k))
        {
            PageCategory::Showcase
        } else if haystack.contains("pricing") || haystack.contains("plans") {
            PageCategory::Pricing
        } else if ["docs", "documentation", "blog", "resources"]
            .iter()
            .any(|k| haystack.contains(k))
        {
            PageCategory::Resources
        } else if ["about", "team", "contact"].iter().any(|k| haystack.contains(k)) {
            PageCategory::Company
        } else {
            PageCategory::Other
        }
    }

    /// Narrative position: show-off content early, pricing mid, company
    /// pages late, everything else mid-range.
    fn ordinal(self) -> u8 {
        match self {
            PageCategory::Showcase => 10,
            PageCategory::Pricing => 50,
            PageCategory::Resources => 60,
            PageCategory::Company => 90,
            PageCategory::Other => 45,
        }
    }
}

/// Ordered, time-boxed action schedule derived from a navigation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoPlan {
    pub pages: Vec<PageEntry>,
    pub total_duration: u64,
    pub transition_time: u64,
}

impl DemoPlan {
    /// Build a complete plan: select pages, order them, split the time
    /// budget, and lay out per-page timelines.
    pub fn create(
        graph: &NavigationGraph,
        analyses: &HashMap<String, ContentAnalysis>,
        options: &PlanOptions,
    ) -> Result<Self, PlanError> {
        if graph.size() == 0 {
            return Err(PlanError::EmptyGraph);
        }
        if options.min_page_duration > options.max_page_duration {
            return Err(PlanError::BadOptions(format!(
                "min_page_duration {} > max_page_duration {}",
                options.min_page_duration, options.max_page_duration
            )));
        }
        if options.total_duration < options.min_page_duration {
            return Err(PlanError::BudgetTooSmall {
                total: options.total_duration,
                min: options.min_page_duration,
            });
        }

        let mut dedup = ContentDeduplicator::new();
        for analysis in analyses.values() {
            dedup.observe(analysis);
        }

        let mut pages = select_pages(graph, analyses, &dedup, options);
        optimize_order(graph, &mut pages);
        allocate_time(&mut pages, options);
        plan_transitions(&mut pages, options.transition_time);
        for page in pages.iter_mut() {
            let analysis = analyses.get(&page.url);
            page.timeline = build_timeline(page.duration, page.priority, analysis, &dedup);
        }
        if options.include_narrative {
            generate_narrative(&mut pages, options.style);
        }

        debug!(
            pages = pages.len(),
            total = options.total_duration,
            "demo plan assembled"
        );

        Ok(DemoPlan {
            pages,
            total_duration: options.total_duration,
            transition_time: options.transition_time,
        })
    }

    pub fn timeline_for_page(&self, id: &NodeId) -> Option<&[TimelineEntry]> {
        self.pages
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.timeline.as_slice())
    }

    /// The page and timeline entry active at absolute time `t`, if `t`
    /// falls inside some entry's window (transition gaps own no entry).
    pub fn action_at(&self, t: u64) -> Option<(&PageEntry, &TimelineEntry)> {
        let page = self
            .pages
            .iter()
            .find(|p| t >= p.start_time && t < p.start_time + p.duration)?;
        let offset = t - page.start_time;
        let entry = page
            .timeline
            .iter()
            .find(|e| offset >= e.start_time && offset < e.start_time + e.duration)?;
        Some((page, entry))
    }

    /// The first entry starting strictly after absolute time `t`.
    pub fn next_action(&self, t: u64) -> Option<(&PageEntry, &TimelineEntry)> {
        self.pages
            .iter()
            .flat_map(|p| p.timeline.iter().map(move |e| (p, e)))
            .filter(|(p, e)| p.start_time + e.start_time > t)
            .min_by_key(|(p, e)| p.start_time + e.start_time)
    }

    /// Shift every page starting strictly after `after` by `delta`
    /// milliseconds. Page-relative timeline offsets are untouched.
    pub fn adjust_timeline(&mut self, after: u64, delta: i64) {
        for page in self.pages.iter_mut() {
            if page.start_time > after {
                page.start_time = if delta.is_negative() {
                    page.start_time.saturating_sub(delta.unsigned_abs())
                } else {
                    page.start_time + delta as u64
                };
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stage 1: page selection
// ---------------------------------------------------------------------------

fn score_node(
    node: &NavigationNode,
    is_root: bool,
    analysis: Option<&ContentAnalysis>,
    dedup: &ContentDeduplicator,
) -> u8 {
    let mut score: i64 = 50;
    if is_root {
        score += 20;
    }
    let title = node.title.to_lowercase();
    if TITLE_KEYWORDS.iter().any(|k| title.contains(k)) {
        score += 10;
    }
    if let Some(analysis) = analysis {
        let sections = dedup.unique_sections(analysis);
        score += (sections.len() as i64 * 3).min(15);
        if !sections.is_empty() {
            let avg: i64 =
                sections.iter().map(|s| s.demo_score as i64).sum::<i64>() / sections.len() as i64;
            score += avg / 10;
        }
        score += (analysis.interactive_elements as i64).min(10);
    }
    if node.depth == 1 {
        score += 5;
    }
    if node.depth > 2 {
        score -= 5 * (node.depth as i64 - 2);
    }
    score.clamp(0, 100) as u8
}

fn select_pages(
    graph: &NavigationGraph,
    analyses: &HashMap<String, ContentAnalysis>,
    dedup: &ContentDeduplicator,
    options: &PlanOptions,
) -> Vec<PageEntry> {
    let root = graph.root();
    let mut scored: Vec<(u8, &NavigationNode)> = graph
        .nodes()
        .map(|node| {
            let is_root = Some(&node.id) == root;
            let score = score_node(node, is_root, analyses.get(&node.url), dedup);
            (score, node)
        })
        .collect();

    // Stable sort keeps visitation order among equal scores.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(options.max_pages);

    // Feasibility: shrink from the bottom until every page can get at
    // least min_page_duration inside the budget. The root survives cuts.
    loop {
        let n = scored.len() as u64;
        if n <= 1 {
            break;
        }
        let needed = n * options.min_page_duration + (n - 1) * options.transition_time;
        if needed <= options.total_duration {
            break;
        }
        let cut = scored
            .iter()
            .rposition(|(_, node)| Some(&node.id) != root)
            .unwrap_or(scored.len() - 1);
        let (_, dropped) = scored.remove(cut);
        debug!(url = %dropped.url, "dropped page to fit time budget");
    }

    // Home always leads the demo.
    if let Some(root_id) = root
        && let Some(pos) = scored.iter().position(|(_, node)| &node.id == root_id)
        && pos != 0
    {
        let entry = scored.remove(pos);
        scored.insert(0, entry);
    }

    scored
        .into_iter()
        .map(|(score, node)| PageEntry {
            id: node.id.clone(),
            url: node.url.clone(),
            title: node.title.clone(),
            duration: 0,
            priority: score,
            start_time: 0,
            transition: TransitionMethod::Navigate,
            timeline: Vec::new(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stage 2: narrative ordering + transition methods
// ---------------------------------------------------------------------------

fn optimize_order(graph: &NavigationGraph, pages: &mut Vec<PageEntry>) {
    if pages.len() > 2 {
        let mut rest = pages.split_off(1);
        rest.sort_by_key(|p| {
            let path = page_path(&p.url);
            PageCategory::classify(&path, &p.title).ordinal()
        });
        pages.extend(rest);
    }

    for i in 0..pages.len() {
        pages[i].transition = if i == 0 {
            TransitionMethod::Navigate
        } else {
            let prev = pages[i - 1].id.clone();
            let cur = pages[i].id.clone();
            if graph.direct_edge(&prev, &cur).is_some() {
                TransitionMethod::Click
            } else if graph.direct_edge(&cur, &prev).is_some() {
                TransitionMethod::Back
            } else {
                TransitionMethod::Navigate
            }
        };
    }
}

fn page_path(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .map(|u| u.path().to_string())
        .unwrap_or_else(|| url.to_string())
}

// ---------------------------------------------------------------------------
// Stage 3: time allocation
// ---------------------------------------------------------------------------

fn allocate_time(pages: &mut [PageEntry], options: &PlanOptions) {
    let n = pages.len() as u64;
    if n == 0 {
        return;
    }
    let reserved = (n - 1) * options.transition_time;
    let budget = options.total_duration.saturating_sub(reserved);

    let total_priority: u64 = pages.iter().map(|p| (p.priority as u64).max(1)).sum();
    for page in pages.iter_mut() {
        let share = budget * (page.priority as u64).max(1) / total_priority;
        page.duration = share.clamp(options.min_page_duration, options.max_page_duration);
    }

    // Rounding/clamping drift goes to the top-priority page first, then to
    // whichever page can still absorb it without leaving the clamp range.
    let mut drift: i64 = budget as i64 - pages.iter().map(|p| p.duration as i64).sum::<i64>();
    if drift != 0 {
        let mut order: Vec<usize> = (0..pages.len()).collect();
        order.sort_by(|&a, &b| pages[b].priority.cmp(&pages[a].priority));
        for idx in order {
            if drift == 0 {
                break;
            }
            let page = &mut pages[idx];
            let adjusted = (page.duration as i64 + drift)
                .clamp(options.min_page_duration as i64, options.max_page_duration as i64);
            drift -= adjusted - page.duration as i64;
            page.duration = adjusted as u64;
        }
        if drift != 0 {
            debug!(drift, "time budget not fully distributable within clamps");
        }
    }
}

// ---------------------------------------------------------------------------
// Stage 4: transitions
// ---------------------------------------------------------------------------

fn plan_transitions(pages: &mut [PageEntry], transition_time: u64) {
    let mut cursor = 0u64;
    for page in pages.iter_mut() {
        page.start_time = cursor;
        cursor += page.duration + transition_time;
    }
}

// ---------------------------------------------------------------------------
// Stage 5: per-page timelines
// ---------------------------------------------------------------------------

fn build_timeline(
    duration: u64,
    page_priority: u8,
    analysis: Option<&ContentAnalysis>,
    dedup: &ContentDeduplicator,
) -> Vec<TimelineEntry> {
    if duration <= SETTLE_WAIT_MS + CLOSING_HOLD_MS {
        // Degenerate slot: nothing fits besides settling.
        return vec![entry(0, duration, TimelineAction::Wait, page_priority, false)];
    }
    let body = duration - SETTLE_WAIT_MS - CLOSING_HOLD_MS;

    let mut timeline = vec![entry(
        0,
        SETTLE_WAIT_MS,
        TimelineAction::Wait,
        page_priority,
        false,
    )];

    let sections: Vec<&PageSection> = analysis
        .map(|a| {
            let mut unique = dedup.unique_sections(a);
            unique.retain(|s| s.demo_score > SECTION_SCORE_FLOOR);
            unique.sort_by(|a, b| a.bounds.y.total_cmp(&b.bounds.y));
            unique.truncate(MAX_SECTIONS_PER_PAGE);
            unique
        })
        .unwrap_or_default();

    if sections.is_empty() {
        timeline.extend(generic_pattern(SETTLE_WAIT_MS, body, page_priority));
    } else {
        timeline.extend(section_pattern(SETTLE_WAIT_MS, body, &sections));
    }

    timeline.push(entry(
        duration - CLOSING_HOLD_MS,
        CLOSING_HOLD_MS,
        TimelineAction::Hold,
        page_priority,
        false,
    ));
    timeline
}

/// Fixed pan/scroll/return pattern for pages nobody analyzed.
fn generic_pattern(start: u64, body: u64, priority: u8) -> Vec<TimelineEntry> {
    let pan = body * 30 / 100;
    let scroll = body * 50 / 100;
    let back_up = body - pan - scroll;
    let mut cursor = start;
    let mut out = Vec::with_capacity(3);

    let mut pan_entry = entry(cursor, pan, TimelineAction::Pan, priority, true);
    pan_entry.x = Some(0.5);
    pan_entry.y = Some(0.3);
    out.push(pan_entry);
    cursor += pan;

    out.push(entry(cursor, scroll, TimelineAction::Scroll, priority, false));
    cursor += scroll;

    out.push(entry(cursor, back_up, TimelineAction::ReturnToTop, priority, true));
    out
}

/// Equal slice per qualifying section: scroll into view if it sits below
/// the fold, then hover its key elements (or pan when it has none).
fn section_pattern(start: u64, body: u64, sections: &[&PageSection]) -> Vec<TimelineEntry> {
    let slice = body / sections.len() as u64;
    let mut out = Vec::new();
    let mut cursor = start;

    for (i, section) in sections.iter().enumerate() {
        // Last slice absorbs division rounding so the hold lands flush.
        let slice = if i == sections.len() - 1 {
            start + body - cursor
        } else {
            slice
        };
        let mut remaining = slice;

        if section.bounds.y > FOLD_PX {
            let scroll = (slice / 5).clamp(1, 1_000).min(remaining);
            let mut e = entry(cursor, scroll, TimelineAction::ScrollTo, section.demo_score, false);
            e.target = Some(section.headline.clone());
            e.x = Some(section.bounds.x + section.bounds.width / 2.0);
            e.y = Some(section.bounds.y);
            out.push(e);
            cursor += scroll;
            remaining -= scroll;
        }

        let hovers: Vec<_> = section.key_elements.iter().take(3).collect();
        if hovers.is_empty() {
            let mut e = entry(cursor, remaining, TimelineAction::Pan, section.demo_score, true);
            e.target = Some(section.headline.clone());
            e.x = Some(section.bounds.x + section.bounds.width / 2.0);
            e.y = Some(section.bounds.y + section.bounds.height / 2.0);
            out.push(e);
            cursor += remaining;
        } else {
            let per_hover = remaining / hovers.len() as u64;
            for (j, element) in hovers.iter().enumerate() {
                let dur = if j == hovers.len() - 1 {
                    remaining - per_hover * (hovers.len() as u64 - 1)
                } else {
                    per_hover
                };
                let mut e = entry(cursor, dur, TimelineAction::Hover, section.demo_score, true);
                e.target = Some(element.selector.clone());
                e.x = Some(element.x);
                e.y = Some(element.y);
                out.push(e);
                cursor += dur;
            }
        }
    }
    out
}

fn entry(
    start_time: u64,
    duration: u64,
    action: TimelineAction,
    priority: u8,
    skippable: bool,
) -> TimelineEntry {
    TimelineEntry {
        start_time,
        duration,
        action,
        target: None,
        x: None,
        y: None,
        narrative: None,
        priority,
        skippable,
    }
}

// ---------------------------------------------------------------------------
// Stage 6: narrative seeds
// ---------------------------------------------------------------------------

fn generate_narrative(pages: &mut [PageEntry], style: NarrativeStyle) {
    let count = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        let path = page_path(&page.url);
        let category = PageCategory::classify(&path, &page.title);
        let intro = intro_phrase(style, i, count);
        let content = content_phrase(style, category, &page.title);
        let seed = format!("{} {}", intro, content);
        if let Some(first) = page.timeline.first_mut() {
            first.narrative = Some(seed);
        }
    }
}

fn intro_phrase(style: NarrativeStyle, index: usize, total: usize) -> &'static str {
    match (style, index, index + 1 == total) {
        (NarrativeStyle::Professional, 0, _) => "Welcome — let's take a tour.",
        (NarrativeStyle::Professional, _, true) => "Finally,",
        (NarrativeStyle::Professional, _, _) => "Next,",
        (NarrativeStyle::Casual, 0, _) => "Hey! Here's a quick look around.",
        (NarrativeStyle::Casual, _, true) => "Last stop:",
        (NarrativeStyle::Casual, _, _) => "Now check this out —",
        (NarrativeStyle::Technical, 0, _) => "Starting at the entry point.",
        (NarrativeStyle::Technical, _, true) => "To wrap up,",
        (NarrativeStyle::Technical, _, _) => "Moving on,",
    }
}

fn content_phrase(style: NarrativeStyle, category: PageCategory, title: &str) -> String {
    let subject = if title.is_empty() { "this page" } else { title };
    match (style, category) {
        (NarrativeStyle::Professional, PageCategory::Showcase) => {
            format!("here is what {} offers.", subject)
        }
        (NarrativeStyle::Professional, PageCategory::Pricing) => {
            format!("{} lays out the plans available.", subject)
        }
        (NarrativeStyle::Professional, PageCategory::Company) => {
            format!("{} introduces the team behind the product.", subject)
        }
        (NarrativeStyle::Casual, PageCategory::Showcase) => {
            format!("{} — this is the good stuff.", subject)
        }
        (NarrativeStyle::Casual, PageCategory::Pricing) => {
            format!("{} shows what it'll cost you.", subject)
        }
        (NarrativeStyle::Technical, PageCategory::Showcase) => {
            format!("{} documents the core capabilities.", subject)
        }
        (NarrativeStyle::Technical, PageCategory::Resources) => {
            format!("{} holds the reference material.", subject)
        }
        (_, _) => format!("a look at {}.", subject),
    }
}
