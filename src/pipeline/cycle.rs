// src/pipeline/cycle.rs

//! A single poll cycle.
//!
//! Every per-record operation is contained: one failed lookup, dispatch
//! or mark is logged and never starves the remaining records or the
//! heartbeat check. Only the startup connect phase can take the process
//! down.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, Utc};
use log::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::extract::{Extractor, Layout};
use crate::fetch::PageFetcher;
use crate::heartbeat::{HEARTBEAT_TTL_SECS, HeartbeatSchedule, heartbeat_key, heartbeat_message};
use crate::models::Show;
use crate::notify::Notifier;
use crate::store::NoveltyStore;

/// Summary of one poll cycle.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Shows extracted this cycle
    pub found: usize,
    /// Whether the fallback layout supplied the shows
    pub from_fallback: bool,
    /// Notifications dispatched for new shows
    pub notified: usize,
    /// Contained per-record failures (lookup, dispatch or mark)
    pub failures: usize,
    /// Whether the daily heartbeat went out this cycle
    pub heartbeat_sent: bool,
    /// Whether both sources came back empty
    pub sources_empty: bool,
}

/// Orchestrator for the fetch/diff/notify/heartbeat cycle.
///
/// All external collaborators are injected, so a cycle runs unchanged
/// against test doubles.
pub struct Watcher {
    url: String,
    alt_url: String,
    extractor: Extractor,
    heartbeat: HeartbeatSchedule,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn NoveltyStore>,
    notifier: Arc<dyn Notifier>,
}

impl Watcher {
    /// Build a watcher from configuration and injected collaborators.
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn NoveltyStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Ok(Self {
            url: config.watcher.url.clone(),
            alt_url: config.watcher.alt_url.clone(),
            extractor: Extractor::new(&config.extract)?,
            heartbeat: HeartbeatSchedule::new(
                config.watcher.heartbeat_hour,
                config.watcher.heartbeat_minute,
            ),
            fetcher,
            store,
            notifier,
        })
    }

    /// Run one cycle against the current clocks.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.run_cycle_at(Utc::now(), Local::now().time()).await
    }

    /// Run one cycle with explicit clocks.
    ///
    /// The heartbeat due-check reads the local wall-clock time while the
    /// marker key and message timestamp derive from `now_utc`; the two
    /// are passed separately on purpose (see the heartbeat module docs).
    pub async fn run_cycle_at(&self, now_utc: DateTime<Utc>, local_time: NaiveTime) -> CycleOutcome {
        let mut outcome = self.check_new_shows().await;
        outcome.heartbeat_sent = self.check_heartbeat(now_utc, local_time).await;
        outcome
    }

    /// Fetch, extract with fallback, diff and notify.
    async fn check_new_shows(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();

        info!("Checking afisha at {}", self.url);
        let mut shows = self.fetch_and_extract(&self.url, Layout::Primary).await;

        if shows.is_empty() {
            warn!("Primary page yielded no shows, trying alternate page");
            shows = self.fetch_and_extract(&self.alt_url, Layout::Fallback).await;
            outcome.from_fallback = true;
        }

        if shows.is_empty() {
            warn!("Alternate page is empty too");
            outcome.sources_empty = true;
            let diagnostic = format!(
                "⚠️ Афиша пуста на обеих страницах.\n🔗 {}\n🔗 {}",
                self.url, self.alt_url
            );
            if let Err(e) = self.notifier.send_text(&diagnostic).await {
                warn!("Failed to send empty-afisha diagnostic: {e}");
                outcome.failures += 1;
            }
            return outcome;
        }

        outcome.found = shows.len();
        info!(
            "Found {} shows{}",
            shows.len(),
            if outcome.from_fallback {
                " (alternate page)"
            } else {
                ""
            }
        );
        if let (Some(first), Some(last)) = (shows.first(), shows.last()) {
            info!("First on page: {first}");
            info!("Last on page: {last}");
        }

        for show in &shows {
            self.process_show(show, &mut outcome).await;
        }

        if outcome.notified > 0 {
            info!("Dispatched {} new show notifications", outcome.notified);
        } else {
            info!("No new shows found");
        }

        outcome
    }

    /// Fetch one URL and extract with the given layout, failing soft.
    async fn fetch_and_extract(&self, url: &str, layout: Layout) -> Vec<Show> {
        match self.fetcher.fetch(url).await {
            Ok(html) => self.extractor.extract(&html, layout),
            Err(e) => {
                warn!("Failed to fetch {url}: {e}");
                Vec::new()
            }
        }
    }

    /// Diff one record against the store, dispatch and mark.
    ///
    /// Dispatch is fire-and-forget with respect to marking: the marker is
    /// written after the dispatch attempt either way, and a failed mark
    /// leaves the record eligible for re-notification next cycle
    /// (accepted at-least-once window).
    async fn process_show(&self, show: &Show, outcome: &mut CycleOutcome) {
        let key = show.identity_key();

        match self.store.is_marked(&key).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                warn!("Store lookup failed for {key}: {e}");
                outcome.failures += 1;
                return;
            }
        }

        info!("New show: {show}");
        match self.notifier.send_text(&show.message()).await {
            Ok(()) => outcome.notified += 1,
            Err(e) => {
                warn!("Failed to notify about {show}: {e}");
                outcome.failures += 1;
            }
        }

        if let Err(e) = self.store.mark(&key, None).await {
            warn!("Failed to mark {key}, will re-notify next cycle: {e}");
            outcome.failures += 1;
        }
    }

    /// Send the daily heartbeat if it is due and not yet marked.
    async fn check_heartbeat(&self, now_utc: DateTime<Utc>, local_time: NaiveTime) -> bool {
        let key = heartbeat_key(now_utc);

        match self.store.is_marked(&key).await {
            Ok(true) => return false,
            Ok(false) => {}
            Err(e) => {
                warn!("Heartbeat marker lookup failed: {e}");
                return false;
            }
        }

        if !self.heartbeat.is_past(&local_time) {
            return false;
        }

        if let Err(e) = self.notifier.send_text(&heartbeat_message(now_utc)).await {
            warn!("Failed to send heartbeat: {e}");
        }
        if let Err(e) = self.store.mark(&key, Some(HEARTBEAT_TTL_SECS)).await {
            warn!("Failed to mark heartbeat {key}: {e}");
            return false;
        }

        info!("Daily heartbeat sent");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::error::AppError;
    use crate::store::MemoryStore;

    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, p)| (u.to_string(), p.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::config(format!("no page for {url}")))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        attempts: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            let notifier = Self::default();
            notifier.fail.store(true, Ordering::SeqCst);
            notifier
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_text(&self, text: &str) -> Result<()> {
            self.attempts.lock().unwrap().push(text.to_string());
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::notify("channel down"));
            }
            Ok(())
        }
    }

    /// Store whose mark calls always fail, for at-least-once tests.
    struct FailingMarkStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl NoveltyStore for FailingMarkStore {
        async fn is_marked(&self, key: &str) -> Result<bool> {
            self.inner.is_marked(key).await
        }

        async fn mark(&self, _key: &str, _ttl_secs: Option<u64>) -> Result<()> {
            Err(AppError::notify("write refused"))
        }
    }

    const MAIN_URL: &str = "https://puppet-minsk.by/afisha";
    const ALT_URL: &str = "https://puppet-minsk.by/bilety/afisha";
    const EMPTY_PAGE: &str = "<html><body></body></html>";

    const TWO_SHOWS: &str = r#"
        <div class="afisha_item">
            <a class="afisha_item-hover" href="https://x/a"></a>
            <div class="afisha-day">01.12.2024</div>
            <div class="afisha-time">19:00</div>
            <div class="afisha-title">Show A</div>
        </div>
        <div class="afisha_item">
            <a class="afisha_item-hover" href="https://x/b"></a>
            <div class="afisha-day">02.12.2024</div>
            <div class="afisha-time">11:00</div>
            <div class="afisha-title">Show B</div>
        </div>
    "#;

    const ALT_TABLE: &str = r#"
        <table>
            <tr><th>Дата</th><th>Спектакль</th></tr>
            <tr><td>03.12.2024 14:00</td><td><a href="/bilety/c">Show C</a></td></tr>
        </table>
    "#;

    fn watcher(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn NoveltyStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Watcher {
        Watcher::new(&Config::default(), fetcher, store, notifier).unwrap()
    }

    fn night() -> NaiveTime {
        NaiveTime::from_hms_opt(0, 30, 0).unwrap()
    }

    fn morning() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_only_unmarked_shows_are_dispatched() {
        let fetcher = Arc::new(FakeFetcher::new(&[(MAIN_URL, TWO_SHOWS)]));
        let store = Arc::new(MemoryStore::new());
        store
            .mark("01.12.2024|19:00|Show A|https://x/a", None)
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(fetcher, store.clone(), notifier.clone());

        let outcome = watcher.run_cycle_at(noon_utc(), night()).await;

        assert_eq!(outcome.found, 2);
        assert_eq!(outcome.notified, 1);
        assert_eq!(outcome.failures, 0);
        let attempts = notifier.attempts();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].contains("Show B"));
        assert_eq!(
            store.ttl_of("02.12.2024|11:00|Show B|https://x/b"),
            Some(None)
        );
    }

    #[tokio::test]
    async fn test_fallback_layout_used_when_primary_empty() {
        let fetcher = Arc::new(FakeFetcher::new(&[
            (MAIN_URL, EMPTY_PAGE),
            (ALT_URL, ALT_TABLE),
        ]));
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(fetcher, store.clone(), notifier.clone());

        let outcome = watcher.run_cycle_at(noon_utc(), night()).await;

        assert!(outcome.from_fallback);
        assert_eq!(outcome.notified, 1);
        assert!(notifier.attempts()[0].contains("Show C"));
        assert!(
            store
                .is_marked("03.12.2024|14:00|Show C|https://puppet-minsk.by/bilety/c")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_both_sources_empty_sends_one_diagnostic_and_writes_nothing() {
        let fetcher = Arc::new(FakeFetcher::new(&[
            (MAIN_URL, EMPTY_PAGE),
            (ALT_URL, EMPTY_PAGE),
        ]));
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(fetcher, store.clone(), notifier.clone());

        let outcome = watcher.run_cycle_at(noon_utc(), night()).await;

        assert!(outcome.sources_empty);
        let attempts = notifier.attempts();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].contains(MAIN_URL));
        assert!(attempts[0].contains(ALT_URL));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_then_diagnoses() {
        // No pages at all: both fetches fail, same diagnostic path.
        let fetcher = Arc::new(FakeFetcher::new(&[]));
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(fetcher, store.clone(), notifier.clone());

        let outcome = watcher.run_cycle_at(noon_utc(), night()).await;

        assert!(outcome.sources_empty);
        assert_eq!(notifier.attempts().len(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_does_not_block_later_records() {
        let fetcher = Arc::new(FakeFetcher::new(&[(MAIN_URL, TWO_SHOWS)]));
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::failing());
        let watcher = watcher(fetcher, store.clone(), notifier.clone());

        let outcome = watcher.run_cycle_at(noon_utc(), night()).await;

        // Both records were attempted despite the first failure, and both
        // were still marked (dispatch is fire-and-forget w.r.t. marking).
        assert_eq!(notifier.attempts().len(), 2);
        assert_eq!(outcome.notified, 0);
        assert_eq!(outcome.failures, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_failure_leaves_record_eligible_for_renotification() {
        let fetcher = Arc::new(FakeFetcher::new(&[(MAIN_URL, TWO_SHOWS)]));
        let store = Arc::new(FailingMarkStore {
            inner: MemoryStore::new(),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(fetcher, store, notifier.clone());

        let first = watcher.run_cycle_at(noon_utc(), night()).await;
        assert_eq!(first.notified, 2);
        assert_eq!(first.failures, 2);

        // Nothing was marked, so the next cycle re-notifies both shows.
        let second = watcher.run_cycle_at(noon_utc(), night()).await;
        assert_eq!(second.notified, 2);
        assert_eq!(notifier.attempts().len(), 4);
    }

    #[tokio::test]
    async fn test_heartbeat_sent_once_per_day() {
        let fetcher = Arc::new(FakeFetcher::new(&[(MAIN_URL, TWO_SHOWS)]));
        let store = Arc::new(MemoryStore::new());
        store
            .mark("01.12.2024|19:00|Show A|https://x/a", None)
            .await
            .unwrap();
        store
            .mark("02.12.2024|11:00|Show B|https://x/b", None)
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(fetcher, store.clone(), notifier.clone());

        let outcome = watcher.run_cycle_at(noon_utc(), morning()).await;
        assert!(outcome.heartbeat_sent);
        let attempts = notifier.attempts();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].starts_with("✅ Бот работает"));
        assert_eq!(
            store.ttl_of("heartbeat|2024-12-01"),
            Some(Some(HEARTBEAT_TTL_SECS))
        );

        // Same day again: marker present, nothing more goes out.
        let again = watcher.run_cycle_at(noon_utc(), morning()).await;
        assert!(!again.heartbeat_sent);
        assert_eq!(notifier.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_not_due_before_threshold() {
        let fetcher = Arc::new(FakeFetcher::new(&[(MAIN_URL, TWO_SHOWS)]));
        let store = Arc::new(MemoryStore::new());
        store
            .mark("01.12.2024|19:00|Show A|https://x/a", None)
            .await
            .unwrap();
        store
            .mark("02.12.2024|11:00|Show B|https://x/b", None)
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(fetcher, store.clone(), notifier.clone());

        let early = NaiveTime::from_hms_opt(8, 59, 0).unwrap();
        let outcome = watcher.run_cycle_at(noon_utc(), early).await;

        assert!(!outcome.heartbeat_sent);
        assert!(notifier.attempts().is_empty());
        assert_eq!(store.ttl_of("heartbeat|2024-12-01"), None);
    }
}
