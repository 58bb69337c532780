//! The browser capability seam.
//!
//! Everything the explorer needs from a browser goes through the [`Browser`]
//! trait. The low-level surface is a single `evaluate(js) -> JSON` call; the
//! typed probes the rest of the crate uses (page snapshot, link capture, SPA
//! markers, history hops) are default methods routed through `evaluate` with
//! fixed scripts, so a DOM-scriptable driver only has to implement the six
//! primitives. [`StaticBrowser`] is the built-in degenerate driver: plain
//! HTTP fetches parsed with `scraper`, raw `evaluate` unsupported, typed
//! probes answered from the parsed document.

use crate::error::{ExploreError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

/// Where a simulated click should land.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    Selector(String),
    Coords { x: f64, y: f64 },
}

/// An anchor as captured from the live page, before filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    pub text: String,
    pub href: String,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub is_nav: bool,
}

/// Bounded single-pass snapshot of the observable page state. Input to the
/// state hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageProbe {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_sample: String,
    #[serde(default)]
    pub active_nav: Option<String>,
    #[serde(default)]
    pub modal_open: bool,
    #[serde(default)]
    pub form_count: usize,
    #[serde(default)]
    pub headings: Vec<String>,
}

/// Signals feeding the SPA heuristic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpaMarkers {
    /// Framework names in detection order, e.g. ["nextjs", "react"]
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub framework_version: Option<String>,
    #[serde(default)]
    pub router_scripts: bool,
    #[serde(default)]
    pub history_api: bool,
    #[serde(default)]
    pub app_root: bool,
    #[serde(default)]
    pub service_worker: bool,
    /// Fraction of anchors carrying click handlers, 0.0 - 1.0
    #[serde(default)]
    pub handler_density: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryInfo {
    pub length: usize,
    pub can_go_back: bool,
}

pub(crate) const PAGE_PROBE_JS: &str = r#"
(() => {
  const cap = (s, n) => (s || '').replace(/\s+/g, ' ').trim().slice(0, n);
  const main = document.querySelector('main') || document.body;
  const active = document.querySelector(
    'nav [aria-current="page"], nav .active, [role="navigation"] .active');
  const headings = Array.from(document.querySelectorAll('h1, h2, h3'))
    .slice(0, 10).map(h => cap(h.textContent, 120));
  return JSON.stringify({
    url: location.href,
    title: document.title,
    content_sample: cap(main.innerText, 2048),
    active_nav: active ? cap(active.textContent, 120) : null,
    modal_open: !!document.querySelector('dialog[open], [role="dialog"]'),
    form_count: document.querySelectorAll('form').length,
    headings
  });
})()
"#;

pub(crate) const LINK_CAPTURE_JS: &str = r#"
(() => {
  const links = Array.from(document.querySelectorAll('a[href]')).map(a => ({
    text: (a.textContent || '').replace(/\s+/g, ' ').trim().slice(0, 120),
    href: a.href,
    selector: a.id ? 'a#' + a.id : 'a[href="' + a.getAttribute('href') + '"]',
    is_nav: !!a.closest('nav, header, [role="navigation"]')
  }));
  return JSON.stringify(links);
})()
"#;

pub(crate) const SPA_MARKER_JS: &str = r#"
(() => {
  const frameworks = [];
  let version = null;
  if (window.next || document.getElementById('__next')) { frameworks.push('nextjs'); }
  if (window.React || document.querySelector('[data-reactroot], [data-reactid]')
      || !!window.__REACT_DEVTOOLS_GLOBAL_HOOK__) { frameworks.push('react'); }
  if (window.Vue || document.querySelector('[data-v-app]')) {
    frameworks.push('vue');
    if (window.Vue && window.Vue.version) version = window.Vue.version;
  }
  const ng = document.querySelector('[ng-version]');
  if (window.angular || ng) {
    frameworks.push('angular');
    if (ng) version = ng.getAttribute('ng-version');
  }
  if (window.__svelte || document.querySelector('[class*="svelte-"]')) { frameworks.push('svelte'); }
  if (window.Ember) { frameworks.push('ember'); }
  const anchors = Array.from(document.querySelectorAll('a'));
  const handled = anchors.filter(a => a.onclick != null).length;
  return JSON.stringify({
    frameworks,
    framework_version: version,
    router_scripts: Array.from(document.scripts)
      .some(s => /router|history/i.test(s.src || '')),
    history_api: !!(window.history && typeof window.history.pushState === 'function'),
    app_root: !!document.querySelector('#root, #app, #__next, [data-app-root]'),
    service_worker: 'serviceWorker' in navigator,
    handler_density: anchors.length ? handled / anchors.length : 0
  });
})()
"#;

pub(crate) const HISTORY_INFO_JS: &str = r#"
(() => JSON.stringify({
  length: history.length,
  can_go_back: history.length > 1
}))()
"#;

pub(crate) const HISTORY_BACK_JS: &str = "history.back(); JSON.stringify(true)";
pub(crate) const HISTORY_FORWARD_JS: &str = "history.forward(); JSON.stringify(true)";

fn parse_probe<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    // Drivers may hand back the JSON directly or as a string payload.
    let value = match value {
        Value::String(s) => {
            serde_json::from_str(&s).map_err(|e| ExploreError::ParseError(e.to_string()))?
        }
        v => v,
    };
    serde_json::from_value(value).map_err(|e| ExploreError::ParseError(e.to_string()))
}

/// A controlled, DOM-scriptable browser session.
///
/// Every call may fail (navigation mid-flight, detached frame); callers
/// treat probe failure as "state unknown" and never propagate it as fatal.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Run a script in the page and return its JSON result.
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Best-effort click; an inert click is not an error.
    async fn click(&self, target: &ClickTarget) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    async fn wait_for_load_settled(&self, timeout: Duration) -> Result<()>;

    async fn page_probe(&self) -> Result<PageProbe> {
        parse_probe(self.evaluate(PAGE_PROBE_JS).await?)
    }

    async fn capture_links(&self) -> Result<Vec<RawLink>> {
        parse_probe(self.evaluate(LINK_CAPTURE_JS).await?)
    }

    async fn spa_markers(&self) -> Result<SpaMarkers> {
        parse_probe(self.evaluate(SPA_MARKER_JS).await?)
    }

    async fn history_info(&self) -> Result<HistoryInfo> {
        parse_probe(self.evaluate(HISTORY_INFO_JS).await?)
    }

    async fn history_back(&self) -> Result<()> {
        self.evaluate(HISTORY_BACK_JS).await.map(|_| ())
    }

    async fn history_forward(&self) -> Result<()> {
        self.evaluate(HISTORY_FORWARD_JS).await.map(|_| ())
    }
}

struct ParsedPage {
    url: String,
    title: String,
    links: Vec<RawLink>,
    form_count: usize,
    headings: Vec<String>,
    content_sample: String,
    active_nav: Option<String>,
    modal_open: bool,
    markers: SpaMarkers,
}

struct SessionState {
    history: Vec<String>,
    cursor: usize,
    page: Option<ParsedPage>,
}

/// HTTP-backed [`Browser`] for sites that render server-side.
///
/// No scripting: raw `evaluate` reports [`ExploreError::Unsupported`] and
/// the typed probes are answered from the parsed document instead. History
/// is simulated by re-fetching, which is exactly the fidelity a static site
/// gives a real browser anyway.
pub struct StaticBrowser {
    client: Client,
    state: Mutex<SessionState>,
}

impl StaticBrowser {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Sitereel/0.1 (https://github.com/trapdoorsec/sitereel)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            state: Mutex::new(SessionState {
                history: Vec::new(),
                cursor: 0,
                page: None,
            }),
        }
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<ParsedPage> {
        debug!("Fetching {}", url);
        let response = tokio::time::timeout(timeout, self.client.get(url).send())
            .await
            .map_err(|_| ExploreError::Timeout(timeout))??;
        let final_url = response.url().to_string();
        let body = tokio::time::timeout(timeout, response.text())
            .await
            .map_err(|_| ExploreError::Timeout(timeout))??;
        Ok(parse_page(&body, &final_url))
    }

    /// Load `url` at the given history slot, dropping any forward entries.
    async fn load(&self, url: &str, timeout: Duration, push: bool) -> Result<()> {
        let page = self.fetch(url, timeout).await?;
        let mut state = self.state.lock().await;
        if push {
            if !state.history.is_empty() {
                let keep = state.cursor + 1;
                state.history.truncate(keep);
            }
            state.history.push(page.url.clone());
            state.cursor = state.history.len() - 1;
        }
        state.page = Some(page);
        Ok(())
    }
}

impl Default for StaticBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Browser for StaticBrowser {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        Url::parse(url).map_err(|e| ExploreError::InvalidUrl(format!("{}: {}", url, e)))?;
        self.load(url, timeout, true).await
    }

    async fn evaluate(&self, _script: &str) -> Result<Value> {
        Err(ExploreError::Unsupported("raw JavaScript evaluation"))
    }

    async fn click(&self, target: &ClickTarget) -> Result<()> {
        let href = {
            let state = self.state.lock().await;
            let page = state.page.as_ref().ok_or(ExploreError::NoPage)?;
            match target {
                ClickTarget::Selector(selector) => page
                    .links
                    .iter()
                    .find(|l| &l.selector == selector || &l.href == selector)
                    .map(|l| l.href.clone()),
                // Coordinates mean nothing without a layout engine.
                ClickTarget::Coords { .. } => None,
            }
        };
        match href {
            // A click on an anchor is just a navigation here.
            Some(href) => self.load(&href, Duration::from_secs(10), true).await,
            None => Ok(()),
        }
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.state.lock().await;
        state
            .page
            .as_ref()
            .map(|p| p.url.clone())
            .ok_or(ExploreError::NoPage)
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock().await;
        state
            .page
            .as_ref()
            .map(|p| p.title.clone())
            .ok_or(ExploreError::NoPage)
    }

    async fn wait_for_load_settled(&self, _timeout: Duration) -> Result<()> {
        // Static documents are settled the moment the body arrives.
        Ok(())
    }

    async fn page_probe(&self) -> Result<PageProbe> {
        let state = self.state.lock().await;
        let page = state.page.as_ref().ok_or(ExploreError::NoPage)?;
        Ok(PageProbe {
            url: page.url.clone(),
            title: page.title.clone(),
            content_sample: page.content_sample.clone(),
            active_nav: page.active_nav.clone(),
            modal_open: page.modal_open,
            form_count: page.form_count,
            headings: page.headings.clone(),
        })
    }

    async fn capture_links(&self) -> Result<Vec<RawLink>> {
        let state = self.state.lock().await;
        let page = state.page.as_ref().ok_or(ExploreError::NoPage)?;
        Ok(page.links.clone())
    }

    async fn spa_markers(&self) -> Result<SpaMarkers> {
        let state = self.state.lock().await;
        let page = state.page.as_ref().ok_or(ExploreError::NoPage)?;
        Ok(page.markers.clone())
    }

    async fn history_info(&self) -> Result<HistoryInfo> {
        let state = self.state.lock().await;
        Ok(HistoryInfo {
            length: state.history.len(),
            can_go_back: state.cursor > 0,
        })
    }

    async fn history_back(&self) -> Result<()> {
        let url = {
            let mut state = self.state.lock().await;
            if state.cursor == 0 {
                return Ok(());
            }
            state.cursor -= 1;
            state.history[state.cursor].clone()
        };
        self.load(&url, Duration::from_secs(10), false).await
    }

    async fn history_forward(&self) -> Result<()> {
        let url = {
            let mut state = self.state.lock().await;
            if state.cursor + 1 >= state.history.len() {
                return Ok(());
            }
            state.cursor += 1;
            state.history[state.cursor].clone()
        };
        self.load(&url, Duration::from_secs(10), false).await
    }
}

fn parse_page(html: &str, current_url: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let link_selector = Selector::parse("a[href]").unwrap();
    let mut links = Vec::new();
    let mut onclick_count = 0usize;
    let mut anchor_count = 0usize;
    for element in document.select(&link_selector) {
        anchor_count += 1;
        if element.value().attr("onclick").is_some() {
            onclick_count += 1;
        }
        if let Some(href) = element.value().attr("href")
            && let Some(absolute) = resolve_url(current_url, href)
        {
            let text = element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let selector = match element.value().attr("id") {
                Some(id) if !id.is_empty() => format!("a#{}", id),
                _ => format!("a[href=\"{}\"]", href),
            };
            links.push(RawLink {
                text: text.chars().take(120).collect(),
                href: absolute,
                selector,
                is_nav: is_within_nav(element),
            });
        }
    }

    let form_selector = Selector::parse("form").unwrap();
    let form_count = document.select(&form_selector).count();

    let heading_selector = Selector::parse("h1, h2, h3").unwrap();
    let headings: Vec<String> = document
        .select(&heading_selector)
        .take(10)
        .map(|h| {
            h.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(120)
                .collect()
        })
        .collect();

    let main_selector = Selector::parse("main").unwrap();
    let body_selector = Selector::parse("body").unwrap();
    let content_root = document
        .select(&main_selector)
        .next()
        .or_else(|| document.select(&body_selector).next());
    let content_sample: String = content_root
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
        .chars()
        .take(2048)
        .collect();

    let active_selector =
        Selector::parse("nav [aria-current=\"page\"], nav .active, [role=\"navigation\"] .active")
            .unwrap();
    let active_nav = document.select(&active_selector).next().map(|el| {
        el.text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    });

    let modal_selector = Selector::parse("dialog[open], [role=\"dialog\"]").unwrap();
    let modal_open = document.select(&modal_selector).next().is_some();

    let markers = detect_markers(html, &document, anchor_count, onclick_count);

    ParsedPage {
        url: current_url.to_string(),
        title,
        links,
        form_count,
        headings,
        content_sample,
        active_nav,
        modal_open,
        markers,
    }
}

fn is_within_nav(element: ElementRef<'_>) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|a| {
        let value = a.value();
        matches!(value.name(), "nav" | "header")
            || value.attr("role") == Some("navigation")
    })
}

fn detect_markers(
    html: &str,
    document: &Html,
    anchor_count: usize,
    onclick_count: usize,
) -> SpaMarkers {
    let mut frameworks = Vec::new();
    let mut framework_version = None;

    if html.contains("__NEXT_DATA__") || document_has(document, "#__next") {
        frameworks.push("nextjs".to_string());
    }
    if html.contains("data-reactroot") || html.contains("data-reactid") {
        frameworks.push("react".to_string());
    }
    if document_has(document, "[data-v-app]") {
        frameworks.push("vue".to_string());
    }
    if let Some(version) = attr_of(document, "[ng-version]", "ng-version") {
        frameworks.push("angular".to_string());
        framework_version = Some(version);
    }
    if html.contains("svelte-") {
        frameworks.push("svelte".to_string());
    }

    let script_selector = Selector::parse("script[src]").unwrap();
    let router_scripts = document.select(&script_selector).any(|s| {
        s.value()
            .attr("src")
            .map(|src| {
                let src = src.to_lowercase();
                src.contains("router") || src.contains("history")
            })
            .unwrap_or(false)
    });

    SpaMarkers {
        frameworks,
        framework_version,
        router_scripts,
        history_api: html.contains("pushState"),
        app_root: document_has(document, "#root, #app, #__next, [data-app-root]"),
        service_worker: html.contains("serviceWorker"),
        handler_density: if anchor_count == 0 {
            0.0
        } else {
            onclick_count as f64 / anchor_count as f64
        },
    }
}

fn document_has(document: &Html, selector: &str) -> bool {
    Selector::parse(selector)
        .ok()
        .map(|s| document.select(&s).next().is_some())
        .unwrap_or(false)
}

fn attr_of(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(String::from)
}

/// Resolve an href against the current page, skipping pseudo-links and
/// stripping fragments the way address-bar navigation would.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_page(server: &MockServer, route: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(html.into_bytes()),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_resolve_url_skips_pseudo_links() {
        assert!(resolve_url("https://example.com/", "javascript:void(0)").is_none());
        assert!(resolve_url("https://example.com/", "mailto:x@y.z").is_none());
        assert!(resolve_url("https://example.com/", "tel:123").is_none());
        assert!(resolve_url("https://example.com/", "#section").is_none());
        assert!(resolve_url("https://example.com/", "").is_none());
    }

    #[test]
    fn test_resolve_url_strips_fragment() {
        let resolved = resolve_url("https://example.com/docs", "/page#anchor").unwrap();
        assert_eq!(resolved, "https://example.com/page");
    }

    #[test]
    fn test_parse_page_extracts_structure() {
        let html = r#"<html><head><title>Acme</title></head><body>
            <nav><a href="/features">Features</a></nav>
            <main><h1>Welcome</h1><p>Build things faster.</p>
              <a href="/pricing" id="pricing-link">Pricing</a>
              <form></form>
            </main></body></html>"#;
        let page = parse_page(html, "https://example.com/");
        assert_eq!(page.title, "Acme");
        assert_eq!(page.links.len(), 2);
        assert!(page.links[0].is_nav);
        assert!(!page.links[1].is_nav);
        assert_eq!(page.links[1].selector, "a#pricing-link");
        assert_eq!(page.form_count, 1);
        assert_eq!(page.headings, vec!["Welcome".to_string()]);
        assert!(page.content_sample.contains("Build things faster."));
    }

    #[test]
    fn test_detect_markers_react_app() {
        let html = r#"<html><body>
            <div id="root" data-reactroot=""></div>
            <script src="/static/js/router.min.js"></script>
            <script>history.pushState({}, '', '/');</script>
        </body></html>"#;
        let page = parse_page(html, "https://example.com/");
        assert!(page.markers.frameworks.contains(&"react".to_string()));
        assert!(page.markers.router_scripts);
        assert!(page.markers.history_api);
        assert!(page.markers.app_root);
    }

    #[tokio::test]
    async fn test_navigate_and_probe() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            format!(
                r#"<html><head><title>Home</title></head><body>
                <nav><a href="{0}/features">Features</a></nav>
                <a href="{0}/blog">Blog</a>
                </body></html>"#,
                server.uri()
            ),
        )
        .await;

        let browser = StaticBrowser::new();
        browser
            .navigate(&server.uri(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(browser.title().await.unwrap(), "Home");
        let links = browser.capture_links().await.unwrap();
        assert_eq!(links.len(), 2);
        assert!(links[0].is_nav);
        assert!(!links[1].is_nav);

        let probe = browser.page_probe().await.unwrap();
        assert_eq!(probe.title, "Home");
    }

    #[tokio::test]
    async fn test_click_selector_navigates() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            format!(
                r#"<html><head><title>Home</title></head><body>
                <a href="{}/next" id="go">Next</a></body></html>"#,
                server.uri()
            ),
        )
        .await;
        mount_page(
            &server,
            "/next",
            "<html><head><title>Next</title></head><body>done</body></html>".to_string(),
        )
        .await;

        let browser = StaticBrowser::new();
        browser
            .navigate(&server.uri(), Duration::from_secs(5))
            .await
            .unwrap();
        browser
            .click(&ClickTarget::Selector("a#go".to_string()))
            .await
            .unwrap();
        assert_eq!(browser.title().await.unwrap(), "Next");

        // Unknown selector is an inert click, not an error.
        browser
            .click(&ClickTarget::Selector("a#missing".to_string()))
            .await
            .unwrap();
        assert_eq!(browser.title().await.unwrap(), "Next");
    }

    #[tokio::test]
    async fn test_history_back_and_forward() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            "<html><head><title>One</title></head><body></body></html>".to_string(),
        )
        .await;
        mount_page(
            &server,
            "/two",
            "<html><head><title>Two</title></head><body></body></html>".to_string(),
        )
        .await;

        let browser = StaticBrowser::new();
        browser
            .navigate(&server.uri(), Duration::from_secs(5))
            .await
            .unwrap();
        browser
            .navigate(&format!("{}/two", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        let info = browser.history_info().await.unwrap();
        assert_eq!(info.length, 2);
        assert!(info.can_go_back);

        browser.history_back().await.unwrap();
        assert_eq!(browser.title().await.unwrap(), "One");
        assert!(!browser.history_info().await.unwrap().can_go_back);

        browser.history_forward().await.unwrap();
        assert_eq!(browser.title().await.unwrap(), "Two");
    }

    #[tokio::test]
    async fn test_evaluate_unsupported() {
        let browser = StaticBrowser::new();
        let result = browser.evaluate("1 + 1").await;
        assert!(matches!(result, Err(ExploreError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_probe_without_page_is_no_page() {
        let browser = StaticBrowser::new();
        assert!(matches!(
            browser.page_probe().await,
            Err(ExploreError::NoPage)
        ));
    }
}
