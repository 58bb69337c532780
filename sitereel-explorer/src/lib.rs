pub mod browser;
pub mod error;
pub mod explorer;
pub mod oracle;
pub mod spa;
pub mod strategy;

pub use browser::{Browser, ClickTarget, StaticBrowser};
pub use error::{ExploreError, Result};
pub use explorer::{Exploration, ExplorerOptions, PageSummary, SiteExplorer};
pub use oracle::{ContentAnalyzer, KeywordRanker, LinkRanker, PageContext, collect_analyses};
pub use spa::{NavigationInterception, SpaDetector};
pub use strategy::{ExplorationAction, Strategy, StrategyConfig, StrategyKind, StrategyStats};
