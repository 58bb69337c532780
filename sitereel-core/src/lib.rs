pub mod content;
pub mod graph;
pub mod plan;
pub mod report;

pub use content::{ContentAnalysis, ContentDeduplicator, KeyElement, PageSection, SectionBounds};
pub use graph::{
    Edge, EdgeKind, GraphError, GraphSummary, LinkCandidate, NavigationGraph, NavigationNode,
    NodeId,
};
pub use plan::{
    DemoPlan, NarrativeStyle, PageEntry, PlanError, PlanOptions, TimelineAction, TimelineEntry,
    TransitionMethod,
};

pub fn print_banner() {
    println!(
        r#"
        _ __                       __
  _____(_) /____  ________  ___  / /
 / ___/ / __/ _ \/ ___/ _ \/ _ \/ /
(__  ) / /_/  __/ /  /  __/  __/ /
/____/_/\__/\___/_/   \___/\___/_/   v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
