//! One user's selection state.
//!
//! Selection events are handled one at a time. Only a year change can
//! suspend (while the year's dataset is fetched); the short critical
//! sections around the selection never await. Each year change takes a
//! ticket, and a fetch that completes after a newer year change has
//! taken another ticket publishes nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ecopulse_dataset::{CacheError, ScoreSource};
use ecopulse_geography::CityRegistry;
use ecopulse_score_models::{Language, MonthSelector};
use tokio::sync::watch;

use crate::SessionError;
use crate::engine::Engine;
use crate::view::{ScoreView, Selection};

/// What happened to the view after a year change.
#[derive(Debug, Clone)]
pub enum Publication {
    /// The year's data was available and the view was published.
    Published(Arc<ScoreView>),
    /// The year's data could not be fetched; the published view uses the
    /// baseline scores.
    Fallback {
        /// The published baseline view.
        view: Arc<ScoreView>,
        /// Why the year's data is unavailable.
        error: CacheError,
    },
    /// Another year was selected while this one was loading. Nothing was
    /// published.
    Superseded,
}

impl Publication {
    /// Returns the published view, if any.
    #[must_use]
    pub const fn view(&self) -> Option<&Arc<ScoreView>> {
        match self {
            Self::Published(view) | Self::Fallback { view, .. } => Some(view),
            Self::Superseded => None,
        }
    }
}

struct State {
    selection: Selection,
    year_ticket: u64,
}

/// Selection state plus the published view.
pub struct Session {
    engine: Arc<Engine>,
    state: Mutex<State>,
    views: watch::Sender<Arc<ScoreView>>,
}

impl Session {
    /// Loads the startup data from `source` and publishes the initial
    /// view (the default [`Selection`]).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the baseline or the forecast cannot be
    /// loaded.
    pub async fn start(
        source: Arc<dyn ScoreSource>,
        registry: Option<CityRegistry>,
    ) -> Result<Self, SessionError> {
        let engine = Engine::load(source, registry).await?;
        Ok(Self::with_engine(Arc::new(engine)))
    }

    /// Creates a session over an already-loaded engine.
    #[must_use]
    pub fn with_engine(engine: Arc<Engine>) -> Self {
        let selection = Selection::default();
        let view = Arc::new(engine.view(&selection));
        let (views, _) = watch::channel(view);

        Self {
            engine,
            state: Mutex::new(State {
                selection,
                year_ticket: 0,
            }),
            views,
        }
    }

    #[must_use]
    pub const fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Subscribes to published views. The receiver starts at the current
    /// view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<ScoreView>> {
        self.views.subscribe()
    }

    /// The most recently published view.
    #[must_use]
    pub fn current(&self) -> Arc<ScoreView> {
        Arc::clone(&self.views.borrow())
    }

    /// The current selection.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.lock_state().selection.clone()
    }

    /// Selects `year`, fetching its dataset if it is not cached.
    ///
    /// A failed fetch is not an error: the view falls back to the
    /// year's baseline scores and the failure is reported in
    /// [`Publication::Fallback`]. If another year is selected before the
    /// fetch completes, this call publishes nothing.
    pub async fn select_year(&self, year: i32) -> Publication {
        let ticket = {
            let mut state = self.lock_state();
            state.selection.year = year;
            state.year_ticket += 1;
            state.year_ticket
        };

        let loaded = self.engine.ensure_year(year).await;

        let state = self.lock_state();
        if state.year_ticket != ticket {
            log::debug!("Discarding stale {year} result");
            return Publication::Superseded;
        }
        let view = self.publish(&state.selection);

        match loaded {
            Ok(_) => Publication::Published(view),
            Err(error) => {
                log::warn!("Showing baseline scores for {year}: {error}");
                Publication::Fallback { view, error }
            }
        }
    }

    /// Selects a month (or the whole year).
    pub fn select_month(&self, month: MonthSelector) -> Arc<ScoreView> {
        self.update(|selection| selection.month = month)
    }

    /// Selects a city for the insight panel.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownCity`] if the city is not on the
    /// map. The selection is left unchanged.
    pub fn select_city(&self, city: &str) -> Result<Arc<ScoreView>, SessionError> {
        self.engine.check_city(city)?;
        Ok(self.update(|selection| selection.city = Some(city.to_string())))
    }

    /// Clears the selected city.
    pub fn clear_city(&self) -> Arc<ScoreView> {
        self.update(|selection| selection.city = None)
    }

    /// Switches the display language.
    pub fn select_language(&self, language: Language) -> Arc<ScoreView> {
        self.update(|selection| selection.language = language)
    }

    fn update(&self, change: impl FnOnce(&mut Selection)) -> Arc<ScoreView> {
        let mut state = self.lock_state();
        change(&mut state.selection);
        self.publish(&state.selection)
    }

    /// Publishes the view for `selection`. Called with the state lock
    /// held so views go out in selection order.
    fn publish(&self, selection: &Selection) -> Arc<ScoreView> {
        let view = Arc::new(self.engine.view(selection));
        self.views.send_replace(Arc::clone(&view));
        view
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
