//! Category content store.
//!
//! Tracks the selected browsing category and its paginated content list.
//! First pages of cacheable categories are kept in a [`CategoryCache`] so
//! switching back to a recently browsed category is instant.
//!
//! Every selection change bumps a generation counter. A fetch that completes
//! after its generation has been superseded is discarded, so a slow response
//! for a previous category can never overwrite the current one.

use std::sync::{Arc, Mutex, MutexGuard};

use reelbox_api::traits::{ContentProvider, SessionProvider};
use reelbox_core::cache::{CacheKey, CategoryCache, Clock, SystemClock};
use reelbox_core::config::{AppConfig, BrowseConfig};
use reelbox_core::history::{recent_items, HistoryProvider};
use reelbox_core::models::{Category, ContentItem, ContentKind, ContentPage};

use crate::error::LoadError;

/// Snapshot of the store as seen by the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub categories: Vec<Category>,
    pub selected: Option<Category>,
    pub content: Vec<ContentItem>,
    /// First page of the selected category is loading.
    pub loading: bool,
    /// A later page is loading.
    pub loading_more: bool,
    /// Offset of the next item to fetch.
    pub page_start: usize,
    pub has_more: bool,
    pub error: Option<String>,
}

impl StoreState {
    fn new(categories: Vec<Category>) -> Self {
        let selected = categories
            .first()
            .cloned()
            .map(Category::resolve_default_tag);
        Self {
            categories,
            selected,
            content: Vec::new(),
            loading: true,
            loading_more: false,
            page_start: 0,
            has_more: true,
            error: None,
        }
    }

    fn reset_list(&mut self) {
        self.content.clear();
        self.page_start = 0;
        self.has_more = true;
        self.error = None;
    }
}

struct Inner {
    state: StoreState,
    cache: CategoryCache,
    api_base_url: String,
    generation: u64,
    /// Generation of the fetch currently running, if any.
    in_flight: Option<u64>,
}

impl Inner {
    /// Switch to `category`, abandoning whatever the previous one was loading.
    fn begin_selection(&mut self, category: Option<Category>) {
        self.generation += 1;
        self.in_flight = None;
        self.state.selected = category;
        self.state.reset_list();
        self.state.loading = false;
        self.state.loading_more = false;
    }
}

/// What one fetch produced.
enum Fetched {
    /// Play history, complete in one shot.
    Records(Vec<ContentItem>),
    /// One catalog page.
    Page(ContentPage),
    /// Nothing to fetch for this category shape.
    Exhausted { clear: bool },
}

/// Clears the in-flight marker and loading flags however the fetch ends,
/// including when its future is dropped mid-flight.
struct InFlightGuard<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl InFlightGuard<'_> {
    /// Give the in-flight slot back without touching the loading flags.
    ///
    /// Returns `false` when the generation was superseded in the meantime.
    fn release(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.generation != self.generation {
            return false;
        }
        inner.in_flight = None;
        true
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.in_flight == Some(self.generation) {
            inner.in_flight = None;
            inner.state.loading = false;
            inner.state.loading_more = false;
        }
    }
}

/// Category-scoped content store over injected collaborators.
pub struct CategoryStore<C, S, H> {
    content: C,
    session: S,
    history: H,
    browse: BrowseConfig,
    record_category: Category,
    inner: Mutex<Inner>,
}

impl<C, S, H> CategoryStore<C, S, H>
where
    C: ContentProvider,
    S: SessionProvider,
    H: HistoryProvider,
{
    pub fn new(config: &AppConfig, content: C, session: S, history: H) -> Self {
        Self::with_clock(config, content, session, history, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &AppConfig,
        content: C,
        session: S,
        history: H,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let record_category = config
            .categories
            .iter()
            .find(|c| c.is_record())
            .cloned()
            .unwrap_or_else(Category::recently_played);

        Self {
            content,
            session,
            history,
            browse: config.browse.clone(),
            record_category,
            inner: Mutex::new(Inner {
                state: StoreState::new(config.categories.clone()),
                cache: CategoryCache::new(config.cache.clone(), clock),
                api_base_url: config.server.api_base_url.clone(),
                generation: 0,
                in_flight: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state snapshot.
    pub fn state(&self) -> StoreState {
        self.lock().state.clone()
    }

    pub fn set_api_base_url(&self, url: &str) {
        self.lock().api_base_url = url.to_string();
    }

    /// Number of cached category snapshots.
    pub fn cached_categories(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn clear_error(&self) {
        self.lock().state.error = None;
    }

    /// Select a category and show its content.
    ///
    /// A tag group without a tag gets its first tag. Re-selecting the current
    /// category is a no-op. Otherwise the list is reset, then filled from a
    /// valid cache snapshot or from the network.
    #[tracing::instrument(name = "select_category", skip(self, category), fields(title = %category.title))]
    pub async fn select_category(&self, category: Category) {
        let category = category.resolve_default_tag();

        let needs_fetch = {
            let mut inner = self.lock();
            if inner
                .state
                .selected
                .as_ref()
                .is_some_and(|current| current.same_selection(&category))
            {
                tracing::debug!("Category already selected");
                return;
            }
            inner.begin_selection(Some(category.clone()));

            if self.browse.is_always_fresh(&category) {
                true
            } else {
                let key = CacheKey::for_category(&category);
                let hit = inner
                    .cache
                    .get_valid(&key)
                    .map(|entry| (entry.items.clone(), entry.next_offset, entry.has_more));
                match hit {
                    Some((items, next_offset, has_more)) => {
                        tracing::debug!(%key, count = items.len(), "Cache hit");
                        inner.state.page_start = next_offset;
                        inner.state.content = items;
                        inner.state.has_more = has_more;
                        false
                    }
                    None => {
                        tracing::debug!(%key, "Cache miss");
                        true
                    }
                }
            }
        };

        if needs_fetch {
            self.fetch_initial_data().await;
        }
    }

    /// Re-select the current category with a different tag.
    pub async fn select_tag(&self, tag: &str) {
        let current = self.lock().state.selected.clone();
        if let Some(category) = current {
            self.select_category(category.with_tag(tag)).await;
        }
    }

    /// Re-validate the session, then reload the selected category from page one.
    ///
    /// The list is reset and marked in flight before the session check, so a
    /// `load_more` arriving during the check is a no-op.
    #[tracing::instrument(name = "fetch_initial_data", skip(self))]
    pub async fn fetch_initial_data(&self) {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            let generation = inner.generation;
            inner.in_flight = Some(generation);
            inner.state.reset_list();
            inner.state.loading = true;
            inner.state.loading_more = false;
            generation
        };
        let pending = InFlightGuard {
            inner: &self.inner,
            generation,
        };

        self.check_session().await;

        if !pending.release() {
            tracing::debug!("Selection changed during session check");
            return;
        }
        drop(pending);
        self.load_more().await;
    }

    /// Load the next page of the selected category.
    ///
    /// No-op while a load for the same selection is running or once the
    /// category is exhausted. Failures land in `error`.
    pub async fn load_more(&self) {
        let (category, generation, offset) = {
            let mut inner = self.lock();
            if inner.in_flight == Some(inner.generation) || !inner.state.has_more {
                return;
            }
            let Some(category) = inner.state.selected.clone() else {
                inner.state.has_more = false;
                inner.state.loading = false;
                return;
            };
            let generation = inner.generation;
            let offset = inner.state.page_start;
            inner.in_flight = Some(generation);
            if offset == 0 {
                inner.state.loading = true;
            } else {
                inner.state.loading_more = true;
            }
            (category, generation, offset)
        };
        let _guard = InFlightGuard {
            inner: &self.inner,
            generation,
        };

        let outcome = self.fetch(&category, offset).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(title = %category.title, "Discarding stale result");
            return;
        }

        match outcome {
            Ok(Fetched::Records(items)) => {
                inner.state.page_start = items.len();
                inner.state.content = items;
                inner.state.has_more = false;
            }
            Ok(Fetched::Page(page)) => {
                self.apply_page(&mut inner, &category, offset, page);
            }
            Ok(Fetched::Exhausted { clear }) => {
                if clear {
                    inner.state.content.clear();
                }
                inner.state.has_more = false;
            }
            Err(e) => {
                tracing::warn!(title = %category.title, error = %e, "Failed to load content");
                inner.state.error = Some(e.user_message().to_string());
            }
        }
    }

    async fn fetch(&self, category: &Category, offset: usize) -> Result<Fetched, LoadError> {
        match (category.kind, category.tag.as_deref()) {
            (Some(ContentKind::Record), _) => {
                if !self.session.is_logged_in() {
                    return Ok(Fetched::Exhausted { clear: true });
                }
                let records = self.history.get_all().await?;
                Ok(Fetched::Records(recent_items(&records)))
            }
            (Some(kind), Some(tag)) => {
                let page = self
                    .content
                    .fetch_page(kind, tag, self.browse.page_size, offset)
                    .await?;
                Ok(Fetched::Page(page))
            }
            _ if category.tags.is_some() => Ok(Fetched::Exhausted { clear: true }),
            _ => Ok(Fetched::Exhausted { clear: false }),
        }
    }

    /// Merge a catalog page. The cursor advances by the rows the provider
    /// served, not by the rows that survived validation.
    fn apply_page(
        &self,
        inner: &mut Inner,
        category: &Category,
        offset: usize,
        page: ContentPage,
    ) {
        let has_more = !page.is_exhausted();
        let cacheable = !self.browse.is_always_fresh(category);
        let key = CacheKey::for_category(category);

        if offset == 0 {
            if cacheable {
                inner.cache.put_first_page(key, category.kind, &page);
            }
            inner.state.page_start = page.fetched;
            inner.state.content = page.items;
        } else {
            if cacheable {
                inner.cache.append_page(&key, &page);
            }
            inner.state.page_start += page.fetched;
            inner.state.content.extend(page.items);
        }
        inner.state.has_more = has_more;
    }

    async fn check_session(&self) {
        let base = self.lock().api_base_url.clone();
        if let Err(e) = self.session.check_login_status(&base).await {
            tracing::warn!(error = %e, "Session check failed");
        }
    }

    /// Reconcile the "recently played" category with the play history, then
    /// reload the selected category.
    ///
    /// If the history cannot be read the categories are left alone; the
    /// reload still runs and the history error is reported unless the reload
    /// failed on its own.
    #[tracing::instrument(name = "refresh_play_records", skip(self))]
    pub async fn refresh_play_records(&self) {
        self.check_session().await;

        let has_records = if self.session.is_logged_in() {
            self.history.get_all().await.map(|records| !records.is_empty())
        } else {
            Ok(false)
        };

        match has_records {
            Ok(has_records) => {
                self.reconcile_record_category(has_records);
                self.fetch_initial_data().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read play history");
                let message = LoadError::from(e).user_message();
                self.fetch_initial_data().await;
                self.lock()
                    .state
                    .error
                    .get_or_insert_with(|| message.to_string());
            }
        }
    }

    fn reconcile_record_category(&self, has_records: bool) {
        let mut inner = self.lock();
        let exists = inner.state.categories.iter().any(Category::is_record);
        if has_records && !exists {
            tracing::debug!("Adding recently played category");
            inner
                .state
                .categories
                .insert(0, self.record_category.clone());
        } else if !has_records && exists {
            tracing::debug!("Removing recently played category");
            inner.state.categories.retain(|c| !c.is_record());
            let record_selected = inner
                .state
                .selected
                .as_ref()
                .is_some_and(Category::is_record);
            if record_selected {
                let next = inner
                    .state
                    .categories
                    .first()
                    .cloned()
                    .map(Category::resolve_default_tag);
                inner.begin_selection(next);
            }
        }
    }
}
