//! Shared score data and view computation.

use std::sync::Arc;

use ecopulse_analytics::resolve;
use ecopulse_dataset::{CacheError, DatasetCache, ScoreSource};
use ecopulse_geography::CityRegistry;
use ecopulse_score_models::{CityScores, Dataset, FORECAST_YEAR, MonthSelector, YearlyScores};

use crate::SessionError;
use crate::view::{ScoreView, Selection, compose_view};

/// Everything a view is computed from. Immutable after startup apart
/// from the dataset cache filling up.
pub struct Engine {
    cache: Arc<DatasetCache>,
    baseline: YearlyScores,
    forecast: Arc<Dataset>,
    registry: Option<CityRegistry>,
}

impl Engine {
    /// Loads the baseline scores and the forecast from `source`
    /// concurrently and seeds the forecast into the cache under
    /// [`FORECAST_YEAR`].
    ///
    /// # Errors
    ///
    /// * [`SessionError::Fetch`] if either load fails
    /// * [`SessionError::Shape`] if the forecast is not a forecast dataset
    pub async fn load(
        source: Arc<dyn ScoreSource>,
        registry: Option<CityRegistry>,
    ) -> Result<Self, SessionError> {
        log::info!("Loading baseline scores and forecast from {}...", source.name());
        let (baseline, forecast) =
            tokio::try_join!(source.fetch_yearly(), source.fetch_forecast())?;
        forecast.as_forecast()?;

        log::info!(
            "Loaded baseline for {} years and forecast for {} cities",
            baseline.years().count(),
            forecast.city_count()
        );

        Ok(Self::new(
            Arc::new(DatasetCache::new(source)),
            baseline,
            forecast,
            registry,
        ))
    }

    /// Builds an engine from already-loaded parts, seeding `forecast`
    /// into the cache under [`FORECAST_YEAR`]. A forecast already cached
    /// there is kept.
    #[must_use]
    pub fn new(
        cache: Arc<DatasetCache>,
        baseline: YearlyScores,
        forecast: Dataset,
        registry: Option<CityRegistry>,
    ) -> Self {
        let forecast = cache.insert(FORECAST_YEAR, forecast);
        Self {
            cache,
            baseline,
            forecast,
            registry,
        }
    }

    /// The per-year dataset cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    /// Baseline annual scores for every year.
    #[must_use]
    pub const fn baseline(&self) -> &YearlyScores {
        &self.baseline
    }

    /// The forecast dataset, also cached under [`FORECAST_YEAR`].
    #[must_use]
    pub const fn forecast(&self) -> &Arc<Dataset> {
        &self.forecast
    }

    /// The map's city registry, if one was loaded.
    #[must_use]
    pub const fn registry(&self) -> Option<&CityRegistry> {
        self.registry.as_ref()
    }

    /// Makes sure `year`'s dataset is cached, fetching it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the fetch fails; views for
    /// the year then fall back to the baseline scores.
    pub async fn ensure_year(&self, year: i32) -> Result<Arc<Dataset>, CacheError> {
        self.cache.ensure_loaded(year).await
    }

    /// Resolves the scores for `year` and `month` from what is cached.
    #[must_use]
    pub fn scores(&self, year: i32, month: MonthSelector) -> CityScores {
        resolve(year, month, &self.cache, &self.baseline)
    }

    /// Computes the view for `selection` from what is cached.
    #[must_use]
    pub fn view(&self, selection: &Selection) -> ScoreView {
        compose_view(
            selection.clone(),
            self.scores(selection.year, selection.month),
            Some(&*self.forecast),
            self.registry.as_ref(),
        )
    }

    /// Checks that `city` can be selected. Every city is accepted when
    /// there is no registry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownCity`] if the registry does not
    /// list `city`.
    pub fn check_city(&self, city: &str) -> Result<(), SessionError> {
        match &self.registry {
            Some(registry) if !registry.contains(city) => Err(SessionError::UnknownCity {
                city: city.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
