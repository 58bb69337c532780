// Content-analysis data model and repeated-chrome suppression

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Pixel bounds of a section within the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// An element worth hovering during a demo, as reported by an analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyElement {
    pub selector: String,
    pub x: f64,
    pub y: f64,
}

/// One analyzed section of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSection {
    /// Analyzer-assigned kind: "hero", "features", "testimonials", ...
    pub kind: String,
    pub bounds: SectionBounds,
    pub headline: String,
    /// 0-100, how demo-worthy the section looked to the analyzer
    pub demo_score: u8,
    /// Analyzer hint in milliseconds, advisory only
    pub suggested_duration: Option<u64>,
    #[serde(default)]
    pub key_elements: Vec<KeyElement>,
}

/// Per-URL output of an external content analyzer.
///
/// Optional everywhere it is consumed: pages without an analysis fall back
/// to a generic timeline pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub url: String,
    pub sections: Vec<PageSection>,
    pub interactive_elements: usize,
}

/// Fingerprints page sections across a run so repeated chrome
/// (header/footer/nav rendered on every page) can be suppressed from
/// scoring and timeline creation.
#[derive(Debug, Default)]
pub struct ContentDeduplicator {
    /// fingerprint -> number of distinct pages it appeared on
    seen: HashMap<String, usize>,
    pages_observed: usize,
}

/// A section present on at least this share of observed pages is chrome.
const CHROME_SHARE: f64 = 0.6;

/// Below this many pages there is not enough signal to call anything
/// repeated, so nothing is suppressed.
const MIN_PAGES_FOR_DEDUP: usize = 3;

impl ContentDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable fingerprint of a section: kind plus normalized headline text.
    pub fn fingerprint(section: &PageSection) -> String {
        let normalized: String = section
            .headline
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let mut hasher = Sha256::new();
        hasher.update(section.kind.as_bytes());
        hasher.update([0x1f]);
        hasher.update(normalized.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(16);
        for byte in &digest[..8] {
            out.push_str(&format!("{:02x}", byte));
        }
        out
    }

    /// Record one page's sections. Call once per analyzed page.
    pub fn observe(&mut self, analysis: &ContentAnalysis) {
        self.pages_observed += 1;
        // Count each fingerprint once per page, duplicates within one page
        // are that page's own problem.
        let mut page_prints: Vec<String> =
            analysis.sections.iter().map(Self::fingerprint).collect();
        page_prints.sort();
        page_prints.dedup();
        for print in page_prints {
            *self.seen.entry(print).or_insert(0) += 1;
        }
    }

    pub fn pages_observed(&self) -> usize {
        self.pages_observed
    }

    /// Whether this section looks like chrome repeated across the run.
    pub fn is_repeated(&self, section: &PageSection) -> bool {
        if self.pages_observed < MIN_PAGES_FOR_DEDUP {
            return false;
        }
        let print = Self::fingerprint(section);
        match self.seen.get(&print) {
            Some(&count) => count as f64 / self.pages_observed as f64 >= CHROME_SHARE,
            None => false,
        }
    }

    /// Sections of `analysis` that are not repeated chrome.
    pub fn unique_sections<'a>(&self, analysis: &'a ContentAnalysis) -> Vec<&'a PageSection> {
        analysis
            .sections
            .iter()
            .filter(|s| !self.is_repeated(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(kind: &str, headline: &str, score: u8) -> PageSection {
        PageSection {
            kind: kind.to_string(),
            bounds: SectionBounds {
                x: 0.0,
                y: 0.0,
                width: 1280.0,
                height: 400.0,
            },
            headline: headline.to_string(),
            demo_score: score,
            suggested_duration: None,
            key_elements: Vec::new(),
        }
    }

    fn analysis(url: &str, sections: Vec<PageSection>) -> ContentAnalysis {
        ContentAnalysis {
            url: url.to_string(),
            sections,
            interactive_elements: 0,
        }
    }

    #[test]
    fn test_fingerprint_ignores_whitespace_and_case() {
        let a = section("nav", "Main  Menu", 10);
        let b = section("nav", "main menu", 10);
        assert_eq!(
            ContentDeduplicator::fingerprint(&a),
            ContentDeduplicator::fingerprint(&b)
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_kind() {
        let a = section("nav", "Menu", 10);
        let b = section("footer", "Menu", 10);
        assert_ne!(
            ContentDeduplicator::fingerprint(&a),
            ContentDeduplicator::fingerprint(&b)
        );
    }

    #[test]
    fn test_repeated_chrome_detected() {
        let mut dedup = ContentDeduplicator::new();
        for i in 0..4 {
            dedup.observe(&analysis(
                &format!("https://example.com/p{}", i),
                vec![section("nav", "Main Menu", 5), section("hero", &format!("Hero {}", i), 80)],
            ));
        }
        assert!(dedup.is_repeated(&section("nav", "Main Menu", 5)));
        assert!(!dedup.is_repeated(&section("hero", "Hero 1", 80)));
    }

    #[test]
    fn test_too_few_pages_suppresses_nothing() {
        let mut dedup = ContentDeduplicator::new();
        dedup.observe(&analysis(
            "https://example.com/",
            vec![section("nav", "Main Menu", 5)],
        ));
        dedup.observe(&analysis(
            "https://example.com/a",
            vec![section("nav", "Main Menu", 5)],
        ));
        assert!(!dedup.is_repeated(&section("nav", "Main Menu", 5)));
    }

    #[test]
    fn test_unique_sections_filters() {
        let mut dedup = ContentDeduplicator::new();
        for i in 0..3 {
            dedup.observe(&analysis(
                &format!("https://example.com/p{}", i),
                vec![section("footer", "Copyright", 2), section("hero", &format!("H{}", i), 70)],
            ));
        }
        let page = analysis(
            "https://example.com/p0",
            vec![section("footer", "Copyright", 2), section("hero", "H0", 70)],
        );
        let unique = dedup.unique_sections(&page);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].kind, "hero");
    }
}
