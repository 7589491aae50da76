// HTTP front end: trip form, planning endpoint, health probe

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::planner::TripPlanner;
use crate::render::{PageRenderer, RenderError};
use crate::trip::TripForm;

pub struct AppState {
    pub planner: TripPlanner,
    pub renderer: PageRenderer,
    pub currency: String,
}

#[derive(Debug)]
pub enum AppError {
    Render(RenderError),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Render(err) => {
                error!("Page rendering failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plan", get(index).post(plan_trip))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    Ok(Html(state.renderer.render_form(&TripForm::default(), None)?))
}

async fn health() -> &'static str {
    "ok"
}

async fn plan_trip(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let (request, brief) = match form.assemble(&state.currency) {
        Ok(assembled) => assembled,
        Err(e) => {
            info!(error = %e, "Rejected trip form");
            let page = state.renderer.render_form(&form, Some(&e.to_string()))?;
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        }
    };

    let plan = state.planner.plan(&request, &brief).await;
    let page = state.renderer.render_plan(&request, &brief, &plan)?;
    Ok(Html(page).into_response())
}
