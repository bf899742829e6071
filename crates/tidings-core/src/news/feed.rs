//! Headlines fetch-state holder
//!
//! Tracks the selected country and a tri-state status for its headlines.
//! Each fetch takes a request token; only the most recently issued request
//! may publish its result, so a slow response for a country the user has
//! already moved away from is dropped.
//!
//! On failure the previous articles are cleared: the published state is
//! either loading, failed, or loaded, never a mix.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::client::NewsSource;
use super::country::Country;
use super::models::Article;
use crate::error::FetchError;

/// What the list view should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Loading,
    Failed(String),
    Loaded(Vec<Article>),
}

impl Default for FetchState {
    fn default() -> Self {
        FetchState::Loaded(Vec::new())
    }
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    /// Loaded articles; empty while loading or after a failure
    pub fn articles(&self) -> &[Article] {
        match self {
            FetchState::Loaded(articles) => articles,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// How a finished request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Result was published; carries the article count
    Applied(usize),
    /// A newer request was issued first; result dropped
    Superseded,
}

struct Inner {
    source: Arc<dyn NewsSource>,
    /// Token of the most recently issued request
    latest: Mutex<u64>,
    state_tx: watch::Sender<FetchState>,
    country_tx: watch::Sender<Country>,
}

impl Inner {
    fn latest(&self) -> MutexGuard<'_, u64> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run(&self, token: u64, country: Country) -> Result<FetchOutcome, FetchError> {
        let result = self.source.top_headlines(&country).await;

        // Hold the token lock while publishing so a new request can't slip in
        let latest = self.latest();
        if *latest != token {
            debug!(
                "Dropping headlines for {} (request {} superseded by {})",
                country.code, token, *latest
            );
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(response) => {
                let count = response.articles.len();
                info!("Loaded {} articles for {}", count, country.code);
                self.state_tx
                    .send_replace(FetchState::Loaded(response.articles));
                Ok(FetchOutcome::Applied(count))
            }
            Err(e) => {
                warn!("Failed to fetch headlines for {}: {}", country.code, e);
                self.state_tx.send_replace(FetchState::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Headlines for the selected country
#[derive(Clone)]
pub struct Headlines {
    inner: Arc<Inner>,
}

impl Headlines {
    pub fn new(source: Arc<dyn NewsSource>, country: Country) -> Self {
        let (state_tx, _) = watch::channel(FetchState::default());
        let (country_tx, _) = watch::channel(country);
        Self {
            inner: Arc::new(Inner {
                source,
                latest: Mutex::new(0),
                state_tx,
                country_tx,
            }),
        }
    }

    pub fn state(&self) -> FetchState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<FetchState> {
        self.inner.state_tx.subscribe()
    }

    pub fn selected_country(&self) -> Country {
        *self.inner.country_tx.borrow()
    }

    pub fn watch_country(&self) -> watch::Receiver<Country> {
        self.inner.country_tx.subscribe()
    }

    /// Select `country` and fetch its headlines
    ///
    /// The state is `Loading` by the time this returns. The request runs on
    /// a spawned task; awaiting the handle is optional.
    pub fn fetch(&self, country: Country) -> JoinHandle<Result<FetchOutcome, FetchError>> {
        let token = {
            let mut latest = self.inner.latest();
            *latest += 1;
            self.inner.country_tx.send_replace(country);
            self.inner.state_tx.send_replace(FetchState::Loading);
            *latest
        };
        debug!("Request {} for {}", token, country.code);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(token, country).await })
    }

    /// Switch to another country, triggering exactly one fetch
    pub fn change_country(&self, country: Country) -> JoinHandle<Result<FetchOutcome, FetchError>> {
        info!("Country changed to {}", country.name);
        self.fetch(country)
    }

    /// Fetch the currently selected country again
    pub fn refresh(&self) -> JoinHandle<Result<FetchOutcome, FetchError>> {
        self.fetch(self.selected_country())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::models::{NewsResponse, Source};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    type Reply = Result<NewsResponse, FetchError>;

    /// Source whose responses are released by the test, per country
    #[derive(Default)]
    struct ScriptedSource {
        pending: Mutex<HashMap<&'static str, oneshot::Receiver<Reply>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn expect(&self, code: &'static str) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().insert(code, rx);
            tx
        }
    }

    #[async_trait]
    impl NewsSource for ScriptedSource {
        async fn top_headlines(&self, country: &Country) -> Reply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rx = self
                .pending
                .lock()
                .unwrap()
                .remove(country.code)
                .expect("unexpected request");
            rx.await.unwrap()
        }
    }

    fn article(title: &str) -> Article {
        Article {
            source: Source {
                id: None,
                name: "Wire".to_string(),
            },
            author: None,
            title: title.to_string(),
            description: None,
            url: format!("https://example.com/{}", title),
            url_to_image: None,
            published_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn response(titles: &[&str]) -> Reply {
        Ok(NewsResponse {
            total_results: titles.len() as u64,
            status: "ok".to_string(),
            articles: titles.iter().map(|t| article(t)).collect(),
        })
    }

    fn setup() -> (Arc<ScriptedSource>, Headlines) {
        let source = Arc::new(ScriptedSource::default());
        let headlines = Headlines::new(source.clone(), Country::default());
        (source, headlines)
    }

    fn gb() -> Country {
        Country::from_code("gb").unwrap()
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (_source, headlines) = setup();
        assert_eq!(headlines.state(), FetchState::Loaded(Vec::new()));
        assert_eq!(headlines.selected_country().code, "us");
    }

    #[tokio::test]
    async fn test_loading_until_resolved() {
        let (source, headlines) = setup();
        let reply = source.expect("gb");

        let handle = headlines.change_country(gb());
        assert!(headlines.state().is_loading());
        assert_eq!(headlines.selected_country(), gb());

        reply.send(response(&["a", "b"])).unwrap();
        assert_eq!(handle.await.unwrap(), Ok(FetchOutcome::Applied(2)));
        assert_eq!(headlines.state().articles().len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_fetch_per_change() {
        let (source, headlines) = setup();
        source.expect("gb").send(response(&[])).unwrap();
        source.expect("de").send(response(&[])).unwrap();

        headlines.change_country(gb()).await.unwrap().unwrap();
        headlines
            .change_country(Country::from_code("de").unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_response_is_loaded() {
        let (source, headlines) = setup();
        source.expect("us").send(response(&[])).unwrap();

        headlines.refresh().await.unwrap().unwrap();
        let state = headlines.state();
        assert_eq!(state, FetchState::Loaded(Vec::new()));
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_failure_clears_articles() {
        let (source, headlines) = setup();
        source.expect("us").send(response(&["old"])).unwrap();
        headlines.refresh().await.unwrap().unwrap();

        source
            .expect("us")
            .send(Err(FetchError::Decode("missing field `title`".into())))
            .unwrap();
        let result = headlines.refresh().await.unwrap();

        assert!(matches!(result, Err(FetchError::Decode(_))));
        let state = headlines.state();
        assert!(!state.error().unwrap().is_empty());
        assert!(state.articles().is_empty());
    }

    #[tokio::test]
    async fn test_stale_response_is_dropped() {
        let (source, headlines) = setup();
        let slow = source.expect("us");
        let fast = source.expect("gb");

        let first = headlines.fetch(Country::default());
        let second = headlines.change_country(gb());

        // Newer request completes first
        fast.send(response(&["gb news"])).unwrap();
        assert_eq!(second.await.unwrap(), Ok(FetchOutcome::Applied(1)));

        // Older one arrives late and must not overwrite
        slow.send(response(&["us news", "more"])).unwrap();
        assert_eq!(first.await.unwrap(), Ok(FetchOutcome::Superseded));

        let state = headlines.state();
        assert_eq!(state.articles().len(), 1);
        assert_eq!(state.articles()[0].title, "gb news");
        assert_eq!(headlines.selected_country(), gb());
    }

    #[tokio::test]
    async fn test_stale_error_is_dropped() {
        let (source, headlines) = setup();
        let slow = source.expect("us");
        let fast = source.expect("gb");

        let first = headlines.fetch(Country::default());
        let second = headlines.change_country(gb());
        fast.send(response(&["ok"])).unwrap();
        second.await.unwrap().unwrap();

        slow.send(Err(FetchError::Network("reset".into()))).unwrap();
        assert_eq!(first.await.unwrap(), Ok(FetchOutcome::Superseded));
        assert!(headlines.state().error().is_none());
    }
}
