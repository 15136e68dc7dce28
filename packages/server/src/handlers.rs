//! HTTP handler functions for the EcoPulse API.

use actix_files::NamedFile;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use ecopulse_ingest::{IngestError, ScoreStore};
use ecopulse_score_models::{Language, MonthSelector};
use ecopulse_server_models::{ApiHealth, ApiMessage, DatasetPayload, ViewQueryParams};
use ecopulse_session::{INITIAL_YEAR, Selection};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/scores/yearly`
///
/// Baseline annual scores, keyed by year then city.
pub async fn yearly_scores(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.baseline())
}

/// `GET /api/scores/{year}`
///
/// Monthly scores for historical years, quarterly forecast scores from
/// the forecast year on. Years without data return an empty payload.
pub async fn year_scores(state: web::Data<AppState>, path: web::Path<i32>) -> HttpResponse {
    let dataset = state.store.dataset_for_year(path.into_inner());
    HttpResponse::Ok().json(DatasetPayload::from(&dataset))
}

/// `GET /api/daily/{city}`
///
/// Today's observation for the city.
pub async fn daily_today(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let today = chrono::Local::now().date_naive();
    daily_response(&state.store, &path.into_inner(), today)
}

fn daily_response(store: &ScoreStore, city: &str, date: NaiveDate) -> HttpResponse {
    match store.daily_for(city, date) {
        Ok(observation) => HttpResponse::Ok().json(observation),
        Err(IngestError::CityNotFound { .. }) => {
            HttpResponse::NotFound().json(ApiMessage::new("City not found"))
        }
        Err(IngestError::NoData { .. }) => {
            HttpResponse::NotFound().json(ApiMessage::new("No data for today"))
        }
        Err(e) => {
            log::error!("Failed to look up daily data for {city}: {e}");
            HttpResponse::InternalServerError().json(ApiMessage::new("Failed to load daily data"))
        }
    }
}

/// `GET /api/view`
///
/// The complete map view for a selection, computed server-side. Loads
/// the year's dataset first if needed; if that fails the view uses the
/// baseline scores.
pub async fn view(state: web::Data<AppState>, params: web::Query<ViewQueryParams>) -> HttpResponse {
    let selection = match parse_selection(&params) {
        Ok(selection) => selection,
        Err(message) => return HttpResponse::BadRequest().json(ApiMessage::new(message)),
    };

    if let Some(city) = &selection.city
        && let Err(e) = state.engine.check_city(city)
    {
        return HttpResponse::NotFound().json(ApiMessage::new(e.to_string()));
    }

    if let Err(e) = state.engine.ensure_year(selection.year).await {
        log::debug!("Serving baseline scores: {e}");
    }

    HttpResponse::Ok().json(state.engine.view(&selection))
}

/// `GET /`
pub async fn index(state: web::Data<AppState>) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open(state.frontend_dir.join("index.html"))?)
}

fn parse_selection(params: &ViewQueryParams) -> Result<Selection, String> {
    let month = params
        .month
        .as_deref()
        .map(str::parse::<MonthSelector>)
        .transpose()
        .map_err(|e| e.to_string())?
        .unwrap_or_default();

    let language = params
        .lang
        .as_deref()
        .map(|lang| {
            lang.parse::<Language>()
                .map_err(|_| format!("Unsupported language '{lang}'"))
        })
        .transpose()?
        .unwrap_or_default();

    Ok(Selection {
        year: params.year.unwrap_or(INITIAL_YEAR),
        month,
        city: params
            .city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
            .map(str::to_string),
        language,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use actix_web::{App, test, web};
    use ecopulse_geography::CityRegistry;
    use ecopulse_ingest::{DailyObservation, ForecastRecord, MonthlyRecord};
    use ecopulse_score_models::{FORECAST_YEAR, Month, Quarter, Score};
    use serde_json::Value;

    use super::*;
    use crate::configure_api;

    fn monthly(city: &str, m: u8, v: f64) -> MonthlyRecord {
        MonthlyRecord {
            city: city.to_string(),
            year: 2021,
            month: Month::new(m).unwrap(),
            score: Score::new(v).unwrap(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn store() -> ScoreStore {
        ScoreStore::new(
            vec![
                monthly("Adana", 1, 50.0),
                monthly("Adana", 2, 54.0),
                monthly("Bolu", 1, 60.0),
            ],
            vec![ForecastRecord {
                city: "Adana".to_string(),
                year: FORECAST_YEAR,
                quarter: Quarter::Q1,
                score: Score::new(52.0).unwrap(),
            }],
            vec![DailyObservation {
                city: "Adana".to_string(),
                date: day(),
                no2: Some(38.5),
                temp_day: Some(24.0),
                temp_night: None,
                precipitation: None,
            }],
        )
    }

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(
            store(),
            Some(CityRegistry::new(["Adana", "Bolu", "Van"])),
            PathBuf::from("frontend"),
        ))
    }

    async fn get(uri: &str) -> (u16, Value) {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let response = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = response.status().as_u16();
        (status, test::read_body_json(response).await)
    }

    #[actix_rt::test]
    async fn health_reports_version() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["healthy"], true);
    }

    #[actix_rt::test]
    async fn yearly_scores_are_rounded_means() {
        let (status, body) = get("/api/scores/yearly").await;
        assert_eq!(status, 200);
        assert_eq!(body["2021"]["Adana"], 52.0);
        assert_eq!(body["2021"]["Bolu"], 60.0);
    }

    #[actix_rt::test]
    async fn year_scores_by_shape() {
        let (_, monthly) = get("/api/scores/2021").await;
        assert_eq!(monthly["type"], "monthly");
        assert_eq!(monthly["scores"]["Adana"]["2"], 54.0);

        let (_, forecast) = get("/api/scores/2027").await;
        assert_eq!(forecast["type"], "forecast");
        assert_eq!(forecast["scores"]["Adana"]["q1"], 52.0);

        let (status, empty) = get("/api/scores/2019").await;
        assert_eq!(status, 200);
        assert_eq!(empty["scores"], serde_json::json!({}));
    }

    #[actix_rt::test]
    async fn daily_unknown_city_is_not_found() {
        let (status, body) = get("/api/daily/Atlantis").await;
        assert_eq!(status, 404);
        assert_eq!(body["message"], "City not found");
    }

    #[actix_rt::test]
    async fn daily_lookup_by_date() {
        let store = store();
        assert_eq!(daily_response(&store, "Adana", day()).status().as_u16(), 200);

        let other_day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let response = daily_response(&store, "Adana", other_day);
        assert_eq!(response.status().as_u16(), 404);
        let body: Value =
            serde_json::from_slice(&actix_web::body::to_bytes(response.into_body()).await.unwrap())
                .unwrap();
        assert_eq!(body["message"], "No data for today");
    }

    #[actix_rt::test]
    async fn view_for_month_with_insight() {
        let (status, body) = get("/api/view?year=2021&month=2&city=Adana&lang=en").await;
        assert_eq!(status, 200);
        assert_eq!(body["selection"]["month"], "02");
        assert_eq!(body["scores"]["Adana"], 54.0);
        // No February value for Bolu: baseline.
        assert_eq!(body["scores"]["Bolu"], 60.0);
        assert_eq!(body["map"].as_array().unwrap().len(), 3);

        let insight = &body["insight"];
        assert_eq!(insight["rank"], 2);
        assert_eq!(insight["forecast"]["quarter"], "q1");
        assert_eq!(insight["forecast"]["status"], "worse");
        assert_eq!(insight["advisory"]["language"], "en");
    }

    #[actix_rt::test]
    async fn view_defaults_to_initial_selection() {
        let (status, body) = get("/api/view").await;
        assert_eq!(status, 200);
        assert_eq!(body["selection"]["year"], 2020);
        assert_eq!(body["selection"]["language"], "tr");
        assert!(body["insight"].is_null());
    }

    #[actix_rt::test]
    async fn view_rejects_bad_parameters() {
        assert_eq!(get("/api/view?month=13").await.0, 400);
        assert_eq!(get("/api/view?lang=de").await.0, 400);
        assert_eq!(get("/api/view?city=Atlantis").await.0, 404);
    }
}
