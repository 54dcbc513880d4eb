use axum::{extract::State, http::StatusCode, Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{options, FilterOptions, FilterSet, RecommendationResponse},
    services::{prompt::DEFAULT_USER_PROMPT, recommendations::MODEL_UNAVAILABLE_MESSAGE},
};

use super::AppState;

// Request types

/// Form body of the recommendation endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationForm {
    #[serde(default)]
    pub prompt: String,
    pub genre: Option<String>,
    pub subgenre: Option<String>,
    pub mood: Option<String>,
    pub bpm: Option<String>,
    pub activity: Option<String>,
    pub era: Option<String>,
    pub time_of_day: Option<String>,
    pub weather: Option<String>,
}

impl RecommendationForm {
    /// Splits the form into the user's prompt and normalized filters
    fn into_request(self) -> (String, FilterSet) {
        let prompt = match self.prompt.trim() {
            "" => DEFAULT_USER_PROMPT.to_string(),
            prompt => prompt.to_string(),
        };
        let filters = FilterSet {
            genre: self.genre,
            subgenre: self.subgenre,
            mood: self.mood,
            bpm_range: self.bpm,
            activity: self.activity,
            era: self.era,
            time_of_day: self.time_of_day,
            weather: self.weather,
        }
        .normalized();
        (prompt, filters)
    }
}

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
}

/// Turns a pipeline failure into the `{error}` body the UI shows
fn error_response(err: AppError) -> RecommendationResponse {
    let error = match err {
        AppError::ModelUnavailable(_) => MODEL_UNAVAILABLE_MESSAGE.to_string(),
        other => other.to_string(),
    };
    RecommendationResponse::Error { error }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Option lists for every filter
pub async fn get_options() -> Json<FilterOptions> {
    Json(FilterOptions::catalog())
}

/// Recommends five songs for the submitted prompt and filters.
///
/// Filter values outside the option lists are rejected with 400. Pipeline
/// failures are reported in the `{error}` body.
pub async fn recommend(
    State(state): State<AppState>,
    Form(form): Form<RecommendationForm>,
) -> AppResult<Json<RecommendationResponse>> {
    let (prompt, filters) = form.into_request();
    options::validate(&filters)?;

    if !filters.has_any_filter() {
        tracing::warn!("No filter options provided, recommending from general charts");
    }

    tracing::info!(
        genre = filters.genre.as_deref().unwrap_or("any"),
        era = filters.era.as_deref().unwrap_or("any"),
        mood = filters.mood.as_deref().unwrap_or("any"),
        "Recommendation requested"
    );

    let response = match state.recommendations.recommend(&prompt, &filters).await {
        Ok(result) => RecommendationResponse::from(result),
        Err(e) => {
            tracing::error!(error = %e, "Recommendation failed");
            error_response(e)
        }
    };

    Ok(Json(response))
}

/// Sends a prompt straight to the model and returns its raw answer
pub async fn prompt(
    State(state): State<AppState>,
    Form(form): Form<PromptForm>,
) -> AppResult<Json<RecommendationResponse>> {
    let prompt = form.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::InvalidInput("Prompt is required".to_string()));
    }

    let response = match state.recommendations.raw_prompt(prompt).await {
        Ok(content) => RecommendationResponse::Content { content },
        Err(e) => {
            tracing::error!(error = %e, "Prompt passthrough failed");
            error_response(e)
        }
    };

    Ok(Json(response))
}
