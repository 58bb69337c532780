use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sitereel_core::plan::{DemoPlan, NarrativeStyle, PlanOptions};
use sitereel_core::report::{
    ReportData, ReportFormat, gather_report_data, generate_report, write_report,
};
use sitereel_explorer::{Exploration, SiteExplorer, StaticBrowser, StrategyKind};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

// Helper functions for the explore/plan handlers

/// Parse a user-supplied start URL, trying https:// if the scheme is
/// missing. Returns the normalized URL string.
pub fn parse_start_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed)
        && url.host_str().is_some()
    {
        return Some(url.to_string());
    }

    let with_scheme = format!("https://{}", trimmed);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some()
    {
        return Some(url.to_string());
    }
    None
}

/// Expand `~` in a user-supplied output path.
pub fn resolve_output_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Assemble plan options from CLI units (seconds at the flag surface,
/// milliseconds inside).
pub fn build_plan_options(
    max_pages: usize,
    duration_secs: u64,
    min_page_secs: u64,
    max_page_secs: u64,
    transition_ms: u64,
    style: &str,
    narrative: bool,
) -> PlanOptions {
    PlanOptions {
        total_duration: duration_secs * 1000,
        max_pages,
        min_page_duration: min_page_secs * 1000,
        max_page_duration: max_page_secs * 1000,
        transition_time: transition_ms,
        style: NarrativeStyle::from_str(style).unwrap_or(NarrativeStyle::Professional),
        include_narrative: narrative,
    }
}

pub async fn handle_explore(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let exploration = run_or_exit(sub_matches).await;
    announce(&exploration);

    let data = gather_report_data(
        &exploration.graph,
        None,
        &exploration.run_id,
        &exploration.start_url,
        exploration.spa,
        &exploration.framework,
    );
    emit_report(&data, sub_matches);
}

pub async fn handle_plan(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let exploration = run_or_exit(sub_matches).await;
    announce(&exploration);

    let options = build_plan_options(
        *sub_matches.get_one::<usize>("max-pages").unwrap_or(&20),
        *sub_matches.get_one::<u64>("duration").unwrap_or(&60),
        *sub_matches.get_one::<u64>("min-page").unwrap_or(&3),
        *sub_matches.get_one::<u64>("max-page").unwrap_or(&15),
        *sub_matches.get_one::<u64>("transition").unwrap_or(&1500),
        sub_matches
            .get_one::<String>("style")
            .map(String::as_str)
            .unwrap_or("professional"),
        sub_matches.get_flag("narrative"),
    );

    // No content analyzer is wired in here; pages fall back to the generic
    // timeline pattern.
    let plan = match DemoPlan::create(&exploration.graph, &HashMap::new(), &options) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{} Could not build a plan: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };
    println!(
        "{} Planned {} page(s) over {:.1}s",
        "✓".green().bold(),
        plan.pages.len(),
        plan.total_duration as f64 / 1000.0
    );

    let data = gather_report_data(
        &exploration.graph,
        Some(&plan),
        &exploration.run_id,
        &exploration.start_url,
        exploration.spa,
        &exploration.framework,
    );
    emit_report(&data, sub_matches);
}

async fn run_or_exit(sub_matches: &ArgMatches) -> Exploration {
    let raw_url = sub_matches.get_one::<String>("url").unwrap();
    let Some(start_url) = parse_start_url(raw_url) else {
        eprintln!("{} Not a usable URL: {}", "✗".red().bold(), raw_url);
        std::process::exit(1);
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Exploring {}", start_url));

    match run_exploration(sub_matches, &start_url).await {
        Ok(exploration) => {
            spinner.finish_and_clear();
            exploration
        }
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("{} Exploration failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

pub async fn run_exploration(
    sub_matches: &ArgMatches,
    start_url: &str,
) -> sitereel_explorer::Result<Exploration> {
    let max_pages = *sub_matches.get_one::<usize>("max-pages").unwrap_or(&20);
    let max_depth = *sub_matches.get_one::<usize>("max-depth").unwrap_or(&3);
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let strategy = sub_matches
        .get_one::<String>("strategy")
        .map(String::as_str)
        .and_then(StrategyKind::from_str)
        .unwrap_or(StrategyKind::Priority);

    let browser = Arc::new(StaticBrowser::with_timeout(timeout));
    let mut explorer = SiteExplorer::new(browser)
        .with_max_pages(max_pages)
        .with_max_depth(max_depth)
        .with_strategy(strategy);
    if let Some(focus) = sub_matches.get_one::<String>("focus") {
        explorer = explorer.with_focus(focus.clone());
    }

    if sub_matches.get_flag("flat") {
        explorer.explore_flat(start_url).await
    } else {
        explorer.explore(start_url).await
    }
}

fn announce(exploration: &Exploration) {
    let profile = if exploration.spa {
        format!("SPA ({})", exploration.framework)
    } else {
        "server-rendered".to_string()
    };
    println!(
        "\n{} Explored {} — {} state(s), {} edge(s)",
        "✓".green().bold(),
        profile.bright_white(),
        exploration.graph.size(),
        exploration.graph.edge_count()
    );
}

fn emit_report(data: &ReportData, sub_matches: &ArgMatches) {
    let format = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .and_then(ReportFormat::from_str)
        .unwrap_or(ReportFormat::Text);

    match sub_matches.get_one::<String>("output") {
        Some(raw) => {
            let path = resolve_output_path(raw);
            match write_report(data, &format, &path) {
                Ok(()) => println!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                ),
                Err(e) => {
                    eprintln!(
                        "{} Could not write {}: {}",
                        "✗".red().bold(),
                        path.display(),
                        e
                    );
                    std::process::exit(1);
                }
            }
        }
        None => print!("{}", generate_report(data, &format)),
    }
}
