//! SPA detection, state fingerprinting and history navigation.

use crate::browser::{Browser, PageProbe};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Cumulative marker score required to call a site an SPA.
const SPA_SCORE_THRESHOLD: u32 = 30;

/// How often the state hash is re-sampled while waiting for a change.
const STATE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Detects client-side routing and fingerprints application states.
///
/// One detector serves one exploration run; the SPA verdict is computed
/// once and held for the detector's lifetime.
pub struct SpaDetector {
    browser: Arc<dyn Browser>,
    verdict: Option<bool>,
    framework: Option<String>,
}

impl SpaDetector {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            browser,
            verdict: None,
            framework: None,
        }
    }

    /// Weighted heuristic over framework markers, router scripts,
    /// History-API availability, a dominant app-root element, a service
    /// worker, and anchor click-handler density. Sticky once computed.
    pub async fn is_spa(&mut self) -> bool {
        if let Some(verdict) = self.verdict {
            return verdict;
        }
        let markers = match self.browser.spa_markers().await {
            Ok(markers) => markers,
            Err(e) => {
                // State unknown; do not pin the verdict on a failed probe.
                debug!("SPA marker probe failed: {}", e);
                return false;
            }
        };

        let mut score: u32 = 0;
        if !markers.frameworks.is_empty() {
            score += 25;
        }
        if markers.router_scripts {
            score += 15;
        }
        if markers.history_api {
            score += 20;
        }
        if markers.app_root {
            score += 15;
        }
        if markers.service_worker {
            score += 10;
        }
        score += (markers.handler_density.clamp(0.0, 1.0) * 15.0) as u32;

        let verdict = score >= SPA_SCORE_THRESHOLD;
        debug!(score, verdict, "SPA detection");
        self.verdict = Some(verdict);
        self.framework = Some(match markers.frameworks.first() {
            Some(name) => match &markers.framework_version {
                Some(version) => format!("{} {}", name, version),
                None => name.clone(),
            },
            None => "unknown".to_string(),
        });
        verdict
    }

    /// Best-effort framework name/version. Informational only.
    pub async fn detect_framework(&mut self) -> String {
        if self.framework.is_none() {
            self.is_spa().await;
        }
        self.framework.clone().unwrap_or_else(|| "unknown".to_string())
    }

    /// Deterministic fingerprint of the observable page state, or `None`
    /// when the DOM cannot be probed (navigation mid-flight, detached
    /// frame). Callers treat `None` as "state unknown".
    pub async fn state_hash(&self) -> Option<String> {
        match self.browser.page_probe().await {
            Ok(probe) => Some(hash_probe(&probe)),
            Err(e) => {
                debug!("state probe failed: {}", e);
                None
            }
        }
    }

    /// Poll the state hash until it differs from `baseline` or the timeout
    /// elapses. Returns whether a change was observed.
    pub async fn wait_for_state_change(&self, baseline: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(hash) = self.state_hash().await
                && hash != baseline
            {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(STATE_POLL_INTERVAL.min(timeout)).await;
        }
    }

    pub async fn can_navigate_back(&self) -> bool {
        self.browser
            .history_info()
            .await
            .map(|info| info.can_go_back)
            .unwrap_or(false)
    }

    /// History-back, confirmed by re-hashing. Returns whether the browser
    /// landed on the expected state; on `false` the caller falls back to a
    /// direct URL load.
    pub async fn navigate_back(
        &self,
        expected_url: &str,
        expected_hash: Option<&str>,
        settle: Duration,
    ) -> bool {
        if self.browser.history_back().await.is_err() {
            return false;
        }
        let _ = self.browser.wait_for_load_settled(settle).await;
        self.confirm_position(expected_url, expected_hash).await
    }

    /// History-forward counterpart of [`navigate_back`].
    pub async fn navigate_forward(
        &self,
        expected_url: &str,
        expected_hash: Option<&str>,
        settle: Duration,
    ) -> bool {
        if self.browser.history_forward().await.is_err() {
            return false;
        }
        let _ = self.browser.wait_for_load_settled(settle).await;
        self.confirm_position(expected_url, expected_hash).await
    }

    async fn confirm_position(&self, expected_url: &str, expected_hash: Option<&str>) -> bool {
        let url_matches = self
            .browser
            .current_url()
            .await
            .map(|url| url == expected_url)
            .unwrap_or(false);
        if !url_matches {
            return false;
        }
        match expected_hash {
            Some(expected) => match self.state_hash().await {
                Some(actual) => actual == expected,
                // Unknown state: conservatively not confirmed.
                None => false,
            },
            None => true,
        }
    }

    /// Start a scoped history-instrumentation session. The caller owns the
    /// session and must call [`NavigationInterception::uninstall`]; the
    /// page is never left patched implicitly.
    pub async fn intercept_navigation(&self) -> Result<NavigationInterception> {
        self.browser.evaluate(INSTALL_INTERCEPTION_JS).await?;
        Ok(NavigationInterception {
            browser: self.browser.clone(),
            installed: true,
        })
    }
}

/// Computed over a bounded, order-sensitive snapshot: URL, title, capped
/// main-content text, active nav item, modal presence, form count and the
/// first headings. One DOM pass, stable absent real change.
fn hash_probe(probe: &PageProbe) -> String {
    let mut hasher = Sha256::new();
    hasher.update(probe.url.as_bytes());
    hasher.update([0x1f]);
    hasher.update(probe.title.as_bytes());
    hasher.update([0x1f]);
    hasher.update(probe.content_sample.as_bytes());
    hasher.update([0x1f]);
    hasher.update(probe.active_nav.as_deref().unwrap_or("").as_bytes());
    hasher.update([0x1f]);
    hasher.update([probe.modal_open as u8]);
    hasher.update((probe.form_count as u64).to_le_bytes());
    for heading in &probe.headings {
        hasher.update([0x1f]);
        hasher.update(heading.as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for byte in &digest[..8] {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// A canonical navigation event re-emitted by the interception session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavEvent {
    pub kind: String,
    pub url: String,
}

const INSTALL_INTERCEPTION_JS: &str = r#"
(() => {
  if (window.__sitereelNav) { return JSON.stringify(false); }
  const session = {
    events: [],
    origPush: history.pushState,
    origReplace: history.replaceState,
    onPop: () => session.events.push({ kind: 'popstate', url: location.href }),
    onHash: () => session.events.push({ kind: 'hashchange', url: location.href })
  };
  history.pushState = function (...args) {
    const r = session.origPush.apply(this, args);
    session.events.push({ kind: 'pushstate', url: location.href });
    return r;
  };
  history.replaceState = function (...args) {
    const r = session.origReplace.apply(this, args);
    session.events.push({ kind: 'replacestate', url: location.href });
    return r;
  };
  window.addEventListener('popstate', session.onPop);
  window.addEventListener('hashchange', session.onHash);
  window.__sitereelNav = session;
  return JSON.stringify(true);
})()
"#;

const DRAIN_EVENTS_JS: &str = r#"
(() => {
  const session = window.__sitereelNav;
  if (!session) { return JSON.stringify([]); }
  return JSON.stringify(session.events.splice(0, session.events.length));
})()
"#;

const UNINSTALL_INTERCEPTION_JS: &str = r#"
(() => {
  const session = window.__sitereelNav;
  if (!session) { return JSON.stringify(false); }
  history.pushState = session.origPush;
  history.replaceState = session.origReplace;
  window.removeEventListener('popstate', session.onPop);
  window.removeEventListener('hashchange', session.onHash);
  delete window.__sitereelNav;
  return JSON.stringify(true);
})()
"#;

/// A live history-instrumentation session. Diagnostics only: the explorer
/// works from state hashes, not these events.
pub struct NavigationInterception {
    browser: Arc<dyn Browser>,
    installed: bool,
}

impl NavigationInterception {
    /// Collect and clear the events buffered since the last drain.
    pub async fn drain_events(&self) -> Result<Vec<NavEvent>> {
        let value = self.browser.evaluate(DRAIN_EVENTS_JS).await?;
        let value = match value {
            serde_json::Value::String(s) => serde_json::from_str(&s)
                .map_err(|e| crate::error::ExploreError::ParseError(e.to_string()))?,
            v => v,
        };
        serde_json::from_value(value)
            .map_err(|e| crate::error::ExploreError::ParseError(e.to_string()))
    }

    /// Restore the original history functions and drop the session.
    pub async fn uninstall(mut self) -> Result<()> {
        self.browser.evaluate(UNINSTALL_INTERCEPTION_JS).await?;
        self.installed = false;
        Ok(())
    }
}

impl Drop for NavigationInterception {
    fn drop(&mut self) {
        if self.installed {
            // Can't evaluate from a sync drop; flag it instead of leaving
            // the patch in place silently.
            warn!("navigation interception dropped without uninstall");
        }
    }
}
