// Report generation from exploration results

use crate::graph::{GraphSummary, NavigationGraph};
use crate::plan::DemoPlan;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
    Mermaid,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            "mermaid" | "mmd" => Some(ReportFormat::Mermaid),
            _ => None,
        }
    }
}

/// One row of the page table in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRow {
    pub url: String,
    pub title: String,
    pub depth: usize,
    pub visit_count: usize,
    pub links_remaining: usize,
    pub is_leaf: bool,
    pub has_state_hash: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub run_id: String,
    pub start_url: String,
    pub generated_at: String,
    pub spa: bool,
    pub framework: String,
    pub summary: GraphSummary,
    pub pages: Vec<PageRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<DemoPlan>,
    /// Included for the mermaid format and embedded in markdown
    pub mermaid: String,
}

pub fn gather_report_data(
    graph: &NavigationGraph,
    plan: Option<&DemoPlan>,
    run_id: &str,
    start_url: &str,
    spa: bool,
    framework: &str,
) -> ReportData {
    let pages = graph
        .nodes()
        .map(|node| PageRow {
            url: node.url.clone(),
            title: node.title.clone(),
            depth: node.depth,
            visit_count: node.visit_count,
            links_remaining: node.unexplored_links.len(),
            is_leaf: node.is_leaf,
            has_state_hash: node.state_hash.is_some(),
        })
        .collect();

    ReportData {
        run_id: run_id.to_string(),
        start_url: start_url.to_string(),
        generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        spa,
        framework: framework.to_string(),
        summary: graph.summary(),
        pages,
        plan: plan.cloned(),
        mermaid: graph.to_mermaid(),
    }
}

pub fn generate_report(data: &ReportData, format: &ReportFormat) -> String {
    match format {
        ReportFormat::Text => generate_text_report(data),
        ReportFormat::Json => generate_json_report(data),
        ReportFormat::Markdown => generate_markdown_report(data),
        ReportFormat::Mermaid => data.mermaid.clone(),
    }
}

pub fn write_report(data: &ReportData, format: &ReportFormat, path: &Path) -> std::io::Result<()> {
    let content = generate_report(data, format);
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Run: {}\n", data.run_id));
    report.push_str(&format!("  Start URL: {}\n", data.start_url));
    report.push_str(&format!("  Generated: {}\n", data.generated_at));
    report.push_str(&format!(
        "  SPA: {}{}\n",
        if data.spa { "yes" } else { "no" },
        if data.framework == "unknown" {
            String::new()
        } else {
            format!(" ({})", data.framework)
        }
    ));
    report.push_str(&format!("  States discovered: {}\n", data.summary.node_count));
    report.push_str(&format!("  Edges recorded: {}\n", data.summary.edge_count));
    report.push_str(&format!("  Max depth: {}\n", data.summary.max_depth));
    report.push_str(&format!("  Leaves: {}\n", data.summary.leaf_count));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Pages by depth:\n");
    for (depth, count) in &data.summary.by_depth {
        report.push_str(&format!("  depth {}: {} page(s)\n", depth, count));
    }
    report.push('\n');

    for page in &data.pages {
        let marker = if page.is_leaf { "·" } else { "+" };
        let title = if page.title.is_empty() {
            "(untitled)"
        } else {
            &page.title
        };
        report.push_str(&format!(
            "  {} [{}] {} — {}\n",
            marker, page.depth, page.url, title
        ));
    }

    if let Some(ref plan) = data.plan {
        report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
        report.push_str("# Demo plan:\n");
        report.push_str(&format!(
            "  Total duration: {:.1}s over {} page(s)\n\n",
            plan.total_duration as f64 / 1000.0,
            plan.pages.len()
        ));
        for page in &plan.pages {
            report.push_str(&format!(
                "  {:>7.1}s  {:<9} {:>5.1}s  {} (priority {})\n",
                page.start_time as f64 / 1000.0,
                page.transition.as_str(),
                page.duration as f64 / 1000.0,
                page.url,
                page.priority
            ));
        }
    }

    report
}

fn generate_json_report(data: &ReportData) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();
    report.push_str("# Sitereel Exploration Report\n\n");
    report.push_str(&format!("- **Run:** `{}`\n", data.run_id));
    report.push_str(&format!("- **Start URL:** {}\n", data.start_url));
    report.push_str(&format!("- **Generated:** {}\n", data.generated_at));
    report.push_str(&format!(
        "- **SPA:** {} ({})\n",
        if data.spa { "yes" } else { "no" },
        data.framework
    ));
    report.push_str(&format!(
        "- **States:** {} / **Edges:** {} / **Max depth:** {}\n\n",
        data.summary.node_count, data.summary.edge_count, data.summary.max_depth
    ));

    report.push_str("## Pages\n\n");
    report.push_str("| Depth | URL | Title | Visits | Leaf |\n");
    report.push_str("|------:|-----|-------|-------:|:----:|\n");
    for page in &data.pages {
        report.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            page.depth,
            page.url,
            page.title.replace('|', "\\|"),
            page.visit_count,
            if page.is_leaf { "yes" } else { "" }
        ));
    }

    if let Some(ref plan) = data.plan {
        report.push_str("\n## Demo plan\n\n");
        report.push_str("| Start | Transition | Duration | Priority | URL |\n");
        report.push_str("|------:|------------|---------:|---------:|-----|\n");
        for page in &plan.pages {
            report.push_str(&format!(
                "| {:.1}s | {} | {:.1}s | {} | {} |\n",
                page.start_time as f64 / 1000.0,
                page.transition.as_str(),
                page.duration as f64 / 1000.0,
                page.priority,
                page.url
            ));
        }
    }

    report.push_str("\n## Navigation map\n\n```mermaid\n");
    report.push_str(&data.mermaid);
    report.push_str("```\n");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NavigationNode};

    fn sample_data() -> ReportData {
        let mut graph = NavigationGraph::new(10);
        let root = NavigationNode::new("https://example.com/", None, "Home", None, 0);
        let root_id = root.id.clone();
        let child = NavigationNode::new(
            "https://example.com/pricing",
            None,
            "Pricing",
            Some(root_id.clone()),
            1,
        );
        let child_id = child.id.clone();
        graph.add_node(root).unwrap();
        graph.add_node(child).unwrap();
        graph.set_root(&root_id).unwrap();
        graph
            .add_edge(&root_id, &child_id, Some("Pricing".into()), EdgeKind::Click)
            .unwrap();
        gather_report_data(&graph, None, "run-1", "https://example.com/", false, "unknown")
    }

    #[test]
    fn test_format_from_str() {
        assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
        assert!(matches!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json)));
        assert!(matches!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown)));
        assert!(matches!(ReportFormat::from_str("mermaid"), Some(ReportFormat::Mermaid)));
        assert!(ReportFormat::from_str("csv").is_none());
    }

    #[test]
    fn test_text_report_lists_pages() {
        let data = sample_data();
        let report = generate_report(&data, &ReportFormat::Text);
        assert!(report.contains("States discovered: 2"));
        assert!(report.contains("https://example.com/pricing"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let data = sample_data();
        let report = generate_report(&data, &ReportFormat::Json);
        let parsed: ReportData = serde_json::from_str(&report).unwrap();
        assert_eq!(parsed.summary.node_count, 2);
        assert_eq!(parsed.pages.len(), 2);
    }

    #[test]
    fn test_markdown_report_embeds_mermaid() {
        let data = sample_data();
        let report = generate_report(&data, &ReportFormat::Markdown);
        assert!(report.contains("```mermaid"));
        assert!(report.contains("| 1 | https://example.com/pricing |"));
    }

    #[test]
    fn test_write_report_creates_file() {
        let data = sample_data();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_report(&data, &ReportFormat::Markdown, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Sitereel Exploration Report"));
    }
}
