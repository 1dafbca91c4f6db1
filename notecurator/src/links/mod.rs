//! Link verification: external reachability and internal cross-reference resolution.

pub mod cache;
pub mod external;
pub mod internal;

use crate::config::defaults;
use crate::models::{ProcessingPreferences, TypeProfile};
use cache::LinkCache;
use futures_util::stream::{self, StreamExt};
use notecurator_types::{Document, ExternalCheck, InternalCheck, LinkStatus};
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Verification results for one document, in first-appearance order with duplicates removed
#[derive(Debug, Clone, Default)]
pub struct LinkReport {
    pub external: Vec<(String, ExternalCheck)>,
    pub internal: Vec<(String, InternalCheck)>,
}

/// Shared verifier: one HTTP client and one result cache per process.
#[derive(Clone)]
pub struct LinkVerifier {
    client: Client,
    cache: LinkCache,
    timeout: Duration,
    concurrency: usize,
    search_depth: usize,
    check_external: bool,
}

impl LinkVerifier {
    pub fn new(prefs: &ProcessingPreferences) -> Self {
        let timeout = Duration::from_secs(prefs.link_timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("notecurator/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            cache: LinkCache::new(Duration::from_secs(
                prefs
                    .link_cache_ttl_hours
                    .min(defaults::MAX_LINK_CACHE_TTL_HOURS)
                    .saturating_mul(3600),
            )),
            timeout,
            concurrency: prefs.link_concurrency.max(1),
            search_depth: prefs.search_depth.max(1),
            check_external: prefs.check_external_links,
        }
    }

    /// Override the per-request timeout (mainly for tests against slow mocks).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check one URL, consulting the cache first. Timeouts are not cached.
    pub async fn verify_external(&self, url: &str) -> ExternalCheck {
        if let Some(hit) = self.cache.get(url) {
            log::debug!("[LINKS] Cache hit for {}", url);
            return hit;
        }

        let check = external::check_url(&self.client, url, self.timeout).await;
        log::debug!("[LINKS] {} -> {}", url, check.status);
        if check.status != LinkStatus::Timeout {
            self.cache.insert(url, check.clone());
        }
        check
    }

    pub fn verify_internal(&self, reference: &str, from: &Path) -> InternalCheck {
        internal::resolve_reference(reference, from, self.search_depth)
    }

    /// Verify every link in `doc`. External links are skipped when disabled for the category or globally.
    pub async fn verify_document(&self, doc: &Document, profile: &TypeProfile) -> LinkReport {
        let mut report = LinkReport::default();

        let mut internal_targets: Vec<&str> = Vec::new();
        for link in doc.internal_links() {
            if !internal_targets.contains(&link.target.as_str()) {
                internal_targets.push(&link.target);
            }
        }
        report.internal = internal_targets
            .into_iter()
            .map(|t| (t.to_string(), self.verify_internal(t, &doc.path)))
            .collect();

        if !(self.check_external && profile.content.fetch_links) {
            log::debug!("[LINKS] External link checks disabled for '{}'", profile.name);
            return report;
        }

        let mut external_targets: Vec<String> = Vec::new();
        for link in doc.external_links() {
            if !external_targets.contains(&link.target) {
                external_targets.push(link.target.clone());
            }
        }

        let mut results: HashMap<String, ExternalCheck> = stream::iter(external_targets.iter().cloned())
            .map(|url| async move {
                let check = self.verify_external(&url).await;
                (url, check)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        report.external = external_targets
            .into_iter()
            .filter_map(|url| results.remove(&url).map(|check| (url, check)))
            .collect();

        log::info!(
            "[LINKS] Verified {} external and {} internal link(s) in {}",
            report.external.len(),
            report.internal.len(),
            doc.path.display()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::parse_content;
    use std::fs;
    use tempfile::tempdir;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_cache_short_circuits_network() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = LinkVerifier::new(&ProcessingPreferences::default());
        let url = format!("{}/page", server.uri());
        assert_eq!(verifier.verify_external(&url).await.status, LinkStatus::Valid);
        assert_eq!(verifier.verify_external(&url).await.status, LinkStatus::Valid);
    }

    #[tokio::test]
    async fn test_verify_document_dedupes_and_respects_switch() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Other.md"), "x").unwrap();
        let url = format!("{}/gone", server.uri());
        let body = format!("[a]({url}) [b]({url}) [[Other]] [[Other|again]] [[Missing]]\n");
        let (doc, _) = parse_content(dir.path().join("note.md"), &body, body.len() as u64, None);

        let verifier = LinkVerifier::new(&ProcessingPreferences::default());
        let profile = TypeProfile::named("x");
        let report = verifier.verify_document(&doc, &profile).await;
        assert_eq!(report.external.len(), 1);
        assert_eq!(report.external[0].1.status, LinkStatus::Broken);
        assert_eq!(report.internal.len(), 2);
        assert_eq!(report.internal[0].1.status, LinkStatus::Valid);
        assert_eq!(report.internal[1].1.status, LinkStatus::Broken);

        let mut offline = TypeProfile::named("y");
        offline.content.fetch_links = false;
        let report = verifier.verify_document(&doc, &offline).await;
        assert!(report.external.is_empty());
        assert_eq!(report.internal.len(), 2);
    }

    #[test]
    fn test_huge_cache_ttl_is_capped() {
        let prefs = ProcessingPreferences {
            link_cache_ttl_hours: u64::MAX,
            ..Default::default()
        };
        let verifier = LinkVerifier::new(&prefs);
        assert_eq!(verifier.concurrency, defaults::LINK_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_slow_link_does_not_hold_up_others() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/fast"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let slow = format!("{}/slow", server.uri());
        let fast = format!("{}/fast", server.uri());
        let body = format!("[s]({slow}) and [f]({fast})\n");
        let (doc, _) = parse_content("/vault/note.md".into(), &body, body.len() as u64, None);

        let timeout = Duration::from_millis(400);
        let verifier = LinkVerifier::new(&ProcessingPreferences::default()).with_timeout(timeout);
        let started = Instant::now();
        let report = verifier.verify_document(&doc, &TypeProfile::named("x")).await;
        let elapsed = started.elapsed();

        assert_eq!(report.external.len(), 2);
        assert_eq!(report.external[0].0, slow);
        assert_eq!(report.external[0].1.status, LinkStatus::Timeout);
        assert_eq!(report.external[1].0, fast);
        assert_eq!(report.external[1].1.status, LinkStatus::Valid);
        assert!(elapsed < timeout * 2, "took {:?}", elapsed);
    }
}
