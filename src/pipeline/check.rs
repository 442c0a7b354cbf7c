// src/pipeline/check.rs

//! One checking pass over every configured target.

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{CheckResult, CheckerConfig, Target, TargetState};
use crate::services::{ChangeDetector, HtmlLocator};
use crate::storage::StateStore;
use crate::utils::http::PageFetcher;

/// Caller-selected behavior for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Hide unmodified/first-run results (and repeated errors) from the report
    pub only_show_changes: bool,
    /// Write the updated state when the run finishes
    pub save_changes: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            only_show_changes: false,
            save_changes: true,
        }
    }
}

/// Results of a run, in target order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<CheckResult>,
    /// Whether the state file was written
    pub saved: bool,
    only_show_changes: bool,
}

impl RunReport {
    /// Results the reporter should show.
    pub fn visible(&self) -> impl Iterator<Item = &CheckResult> {
        let only_changes = self.only_show_changes;
        self.results
            .iter()
            .filter(move |result| result.is_visible(only_changes))
    }

    pub fn modified_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.status.is_modified())
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.status.is_error())
            .count()
    }
}

/// Check every target and persist the new state.
///
/// Fetches run concurrently (bounded by `max_concurrent`). Decisions are made
/// against the state loaded at the start, and the mapping is only updated
/// after every target has a result, then saved in one write.
pub async fn run_checks(
    config: &CheckerConfig,
    targets: &[Target],
    fetcher: &dyn PageFetcher,
    store: &dyn StateStore,
    options: &RunOptions,
) -> Result<RunReport> {
    let mut states = store.load().await?;
    let detector = ChangeDetector::new(HtmlLocator);
    let concurrency = config.max_concurrent.max(1);

    log::info!("Checking {} targets", targets.len());

    let mut decided: Vec<(usize, CheckResult, Option<TargetState>)> = {
        let prior_states = &states;
        let mut fetches = stream::iter(targets.iter().enumerate())
            .map(|(index, target)| async move {
                let since = prior_states
                    .get(&target.name)
                    .and_then(|state| state.last_modified.as_deref())
                    .filter(|_| target.header_mode_allowed());

                log::debug!("Checking {} ({})", target.name, target.url);
                (index, fetcher.fetch(&target.url, since).await)
            })
            .buffer_unordered(concurrency);

        let mut decided = Vec::with_capacity(targets.len());
        while let Some((index, fetched)) = fetches.next().await {
            let target = &targets[index];
            let decision = detector.decide(target, prior_states.get(&target.name), fetched);
            decided.push((index, decision.result, decision.next_state));
        }
        decided
    };

    decided.sort_by_key(|(index, ..)| *index);

    let mut results = Vec::with_capacity(decided.len());
    for (index, result, next_state) in decided {
        if let Some(next) = next_state {
            states.insert(targets[index].name.clone(), next);
        }
        results.push(result);
    }

    let saved = if options.save_changes {
        store.save(&states).await?;
        true
    } else {
        log::info!("Not saving changes");
        false
    };

    let report = RunReport {
        results,
        saved,
        only_show_changes: options.only_show_changes,
    };

    log::info!(
        "Checked {} targets: {} modified, {} failed",
        report.results.len(),
        report.modified_count(),
        report.error_count()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::{
        CheckError, CheckStatus, FetchOutcome, FetchedPage, SelectionCriterion, StateMap,
    };
    use crate::services::fingerprint;
    use crate::storage::LocalStateStore;

    /// Serves canned pages by URL; unknown URLs fail.
    #[derive(Default)]
    struct FakeFetcher {
        pages: Mutex<HashMap<String, FetchedPage>>,
        requests: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakeFetcher {
        fn serve(&self, url: &str, page: FetchedPage) {
            self.pages.lock().unwrap().insert(url.to_string(), page);
        }

        fn remove(&self, url: &str) {
            self.pages.lock().unwrap().remove(url);
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(
            &self,
            url: &str,
            if_modified_since: Option<&str>,
        ) -> std::result::Result<FetchOutcome, CheckError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), if_modified_since.map(str::to_string)));
            self.pages
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .map(FetchOutcome::Fetched)
                .ok_or_else(|| CheckError::fetch_failed(url, "connection refused"))
        }
    }

    fn statuses(report: &RunReport) -> Vec<CheckStatus> {
        report.results.iter().map(|r| r.status.clone()).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_override_target() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path().join("data.json"));
        let fetcher = FakeFetcher::default();
        let config = CheckerConfig::default();
        let options = RunOptions::default();
        let url = "https://example.com/a";
        let targets = vec![Target::new("A", url).with_override_last_modified(true)];

        fetcher.serve(url, FetchedPage::new("<div id=x>1</div>"));
        let run1 = run_checks(&config, &targets, &fetcher, &store, &options)
            .await
            .unwrap();
        assert_eq!(statuses(&run1), [CheckStatus::FirstRun]);
        assert!(run1.saved);
        let h1 = fingerprint(b"<div id=x>1</div>");
        assert_eq!(
            store.load().await.unwrap().get("A"),
            Some(&TargetState::with_hash(h1))
        );

        let run2 = run_checks(&config, &targets, &fetcher, &store, &options)
            .await
            .unwrap();
        assert_eq!(statuses(&run2), [CheckStatus::Unmodified]);

        fetcher.serve(url, FetchedPage::new("<div id=x>2</div>"));
        let run3 = run_checks(&config, &targets, &fetcher, &store, &options)
            .await
            .unwrap();
        assert_eq!(statuses(&run3), [CheckStatus::ModifiedByHash]);
        let h2 = fingerprint(b"<div id=x>2</div>");
        assert_eq!(
            store.load().await.unwrap().get("A"),
            Some(&TargetState::with_hash(h2))
        );

        // Override targets never send a conditional request.
        let requests = fetcher.requests.lock().unwrap();
        assert!(requests.iter().all(|(_, since)| since.is_none()));
    }

    #[tokio::test]
    async fn test_dont_save_reports_first_run_twice() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        let store = LocalStateStore::new(&path);
        let fetcher = FakeFetcher::default();
        let config = CheckerConfig::default();
        let options = RunOptions {
            save_changes: false,
            ..RunOptions::default()
        };
        let targets = vec![Target::new("A", "https://example.com/a")];
        fetcher.serve("https://example.com/a", FetchedPage::new("same"));

        for _ in 0..2 {
            let report = run_checks(&config, &targets, &fetcher, &store, &options)
                .await
                .unwrap();
            assert_eq!(statuses(&report), [CheckStatus::FirstRun]);
            assert!(!report.saved);
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path().join("data.json"));
        let fetcher = FakeFetcher::default();
        let config = CheckerConfig {
            max_concurrent: 3,
            ..CheckerConfig::default()
        };
        let options = RunOptions::default();
        let targets = vec![
            Target::new("one", "https://example.com/1"),
            Target::new("two", "https://example.com/2"),
            Target::new("three", "https://example.com/3"),
        ];
        for (i, target) in targets.iter().enumerate() {
            fetcher.serve(&target.url, FetchedPage::new(format!("page {i}")));
        }
        run_checks(&config, &targets, &fetcher, &store, &options)
            .await
            .unwrap();

        fetcher.remove("https://example.com/2");
        fetcher.serve("https://example.com/3", FetchedPage::new("page 3 changed"));
        let report = run_checks(&config, &targets, &fetcher, &store, &options)
            .await
            .unwrap();

        let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["one", "two", "three"]);
        assert_eq!(report.results[0].status, CheckStatus::Unmodified);
        assert!(matches!(
            report.results[1].status,
            CheckStatus::Error(CheckError::FetchFailed { .. })
        ));
        assert_eq!(report.results[2].status, CheckStatus::ModifiedByHash);

        let states = store.load().await.unwrap();
        let two = &states["two"];
        assert!(two.last_error);
        assert_eq!(two.hash, Some(fingerprint(b"page 1")));
        assert!(!states["one"].last_error);
    }

    #[tokio::test]
    async fn test_header_mode_sends_conditional_request() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path().join("data.json"));
        let fetcher = FakeFetcher::default();
        let config = CheckerConfig::default();
        let options = RunOptions::default();
        let last_modified = "Wed, 21 Oct 2015 07:28:00 GMT";
        // Criteria would not match, but header mode never looks.
        let targets = vec![
            Target::new("A", "https://example.com/a")
                .with_criteria(SelectionCriterion::tag("missing")),
        ];
        fetcher.serve(
            "https://example.com/a",
            FetchedPage::new("<p>x</p>").with_last_modified(last_modified),
        );

        let run1 = run_checks(&config, &targets, &fetcher, &store, &options)
            .await
            .unwrap();
        assert_eq!(statuses(&run1), [CheckStatus::FirstRun]);

        let run2 = run_checks(&config, &targets, &fetcher, &store, &options)
            .await
            .unwrap();
        assert_eq!(statuses(&run2), [CheckStatus::Unmodified]);

        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests[0].1, None);
        assert_eq!(requests[1].1.as_deref(), Some(last_modified));

        let states = store.load().await.unwrap();
        assert_eq!(states["A"], TargetState::with_last_modified(last_modified));
    }

    #[tokio::test]
    async fn test_untouched_records_are_preserved() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"removed": {"hash": "old", "last_error": false, "extra": [1, 2]}}"#,
        )
        .unwrap();
        let store = LocalStateStore::new(&path);
        let fetcher = FakeFetcher::default();
        fetcher.serve("https://example.com/a", FetchedPage::new("a"));
        let targets = vec![Target::new("A", "https://example.com/a")];

        run_checks(
            &CheckerConfig::default(),
            &targets,
            &fetcher,
            &store,
            &RunOptions::default(),
        )
        .await
        .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["removed"]["extra"], serde_json::json!([1, 2]));
        assert_eq!(raw["removed"]["hash"], "old");
        assert!(raw["A"]["hash"].is_string());
    }

    #[tokio::test]
    async fn test_corrupt_state_aborts_before_fetching() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(&path, "[]").unwrap();
        let store = LocalStateStore::new(&path);
        let fetcher = FakeFetcher::default();
        let targets = vec![Target::new("A", "https://example.com/a")];

        let result = run_checks(
            &CheckerConfig::default(),
            &targets,
            &fetcher,
            &store,
            &RunOptions::default(),
        )
        .await;

        assert!(result.is_err());
        assert!(fetcher.requests.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_only_show_changes_filters_report() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path().join("data.json"));
        let mut seeded = StateMap::new();
        let mut failing = TargetState::default();
        failing.last_error = true;
        seeded.insert("down".to_string(), failing);
        store.save(&seeded).await.unwrap();

        let fetcher = FakeFetcher::default();
        fetcher.serve("https://example.com/new", FetchedPage::new("n"));
        let targets = vec![
            Target::new("down", "https://example.com/down"),
            Target::new("new", "https://example.com/new"),
        ];
        let options = RunOptions {
            only_show_changes: true,
            ..RunOptions::default()
        };

        let report = run_checks(&CheckerConfig::default(), &targets, &fetcher, &store, &options)
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.visible().count(), 0);
    }
}
