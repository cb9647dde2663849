//! Status and preview HTTP API
//!
//! Read-only view of what the display is doing: the current slide's
//! snapshot, PNG previews of the held frame or of any configured slide, and
//! per-slide collector diagnostics.

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use homelab_hud_core::{
    CollectorContext, CollectorPool, ConfigProvider, CurrentSlidePublisher, Frame, SlideRenderer, SlideTypeRegistry,
};
use homelab_hud_types::SlideConfig;
use log::{debug, error, info};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handles shared with the scheduler
#[derive(Clone)]
pub struct ApiState {
    pub publisher: CurrentSlidePublisher,
    pub collectors: CollectorPool,
    pub config: Arc<dyn ConfigProvider>,
    pub registry: Arc<SlideTypeRegistry>,
    pub renderer: Arc<dyn SlideRenderer>,
    pub use_mocks: bool,
}

impl ApiState {
    /// Draw `slide` now, fetching through its pooled collector
    async fn render(&self, slide: &SlideConfig) -> Result<Frame> {
        let Some(slide_type) = self.registry.lookup(&slide.slide_type) else {
            debug!("Previewing slide {} of unknown type '{}'", slide.id, slide.slide_type);
            return self.renderer.render(&slide.slide_type, None, slide);
        };

        let ctx = CollectorContext::new(self.config.get_api_config()?, self.use_mocks);
        let collector = self.collectors.resolve(slide, slide_type.as_ref(), &ctx);
        let data = match &collector {
            Some(collector) => collector.get_data().await,
            None => None,
        };
        slide_type.render(self.renderer.as_ref(), data.as_ref(), slide)
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/current-slide", get(current_slide))
        .route("/api/preview/current", get(preview_current))
        .route("/api/preview/:slide_id", get(preview_slide))
        .route("/api/stats", get(stats))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(json!({"error": message.to_string()}))).into_response()
}

fn png_response(frame: &Frame, slide_id: u32) -> Response {
    match frame.to_png() {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            error!("Failed to encode preview for slide {}: {:#}", slide_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn render_response(state: &ApiState, slide: &SlideConfig) -> Response {
    match state.render(slide).await {
        Ok(frame) => png_response(&frame, slide.id),
        Err(e) => {
            error!("Failed to preview slide {}: {:#}", slide.id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

async fn current_slide(State(state): State<ApiState>) -> Json<Value> {
    match state.publisher.current() {
        Some(current) => Json(json!(current.status())),
        None => Json(json!({"error": "No current slide", "current": null})),
    }
}

/// The held frame, or the first slide of the rotation when nothing is up
async fn preview_current(State(state): State<ApiState>) -> Response {
    // Encoding happens on our own Arc, never under the publisher lock
    if let Some(current) = state.publisher.current() {
        return png_response(&current.frame, current.slide.id);
    }

    let slides = match state.config.get_slides_config() {
        Ok(slides) => slides,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)),
    };
    match slides.rotation().first() {
        Some(first) => render_response(&state, first).await,
        None => error_response(StatusCode::NOT_FOUND, "No slides configured"),
    }
}

/// Any configured slide, enabled or not, rendered on demand
async fn preview_slide(State(state): State<ApiState>, Path(slide_id): Path<u32>) -> Response {
    let slides = match state.config.get_slides_config() {
        Ok(slides) => slides,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)),
    };
    match slides.slides.iter().find(|s| s.id == slide_id) {
        Some(slide) => render_response(&state, slide).await,
        None => error_response(StatusCode::NOT_FOUND, "Slide not found"),
    }
}

async fn stats(State(state): State<ApiState>) -> Json<Value> {
    let collectors: Vec<Value> = state
        .collectors
        .statuses()
        .await
        .into_iter()
        .map(|(slide_id, status)| {
            let mut entry = json!(status);
            if let Some(map) = entry.as_object_mut() {
                map.insert("slide_id".to_string(), json!(slide_id));
            }
            entry
        })
        .collect();
    Json(json!({ "collectors": collectors }))
}

/// Serve the API until `running` goes false
pub async fn serve(state: ApiState, port: u16, running: Arc<AtomicBool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind status API on port {}", port))?;
    info!("Status API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        })
        .await
        .context("Status API failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builtin_registry, PlaceholderRenderer};
    use homelab_hud_core::{CurrentSlide, StaticConfigProvider};
    use homelab_hud_types::{ApiConfig, SlidesConfig};

    fn state_with(slides: SlidesConfig) -> ApiState {
        ApiState {
            publisher: CurrentSlidePublisher::new(),
            collectors: CollectorPool::new(),
            config: Arc::new(StaticConfigProvider::new(slides, ApiConfig::default())),
            registry: Arc::new(builtin_registry()),
            renderer: Arc::new(PlaceholderRenderer::new(64, 56)),
            use_mocks: true,
        }
    }

    fn state() -> ApiState {
        state_with(SlidesConfig { slides: Vec::new() })
    }

    fn is_png(response: &Response) -> bool {
        response.status() == StatusCode::OK && response.headers()[header::CONTENT_TYPE] == "image/png"
    }

    #[tokio::test]
    async fn test_current_slide_without_snapshot() {
        let Json(body) = current_slide(State(state())).await;
        assert_eq!(body["error"], json!("No current slide"));
        assert!(body["current"].is_null());
    }

    #[tokio::test]
    async fn test_current_slide_reports_snapshot() {
        let state = state();
        let mut slide = SlideConfig::new(3, "clock", "Clock");
        slide.conditional = true;
        state
            .publisher
            .publish(CurrentSlide::new(slide, None, Frame::blank(8, 8)));

        let Json(body) = current_slide(State(state)).await;
        assert_eq!(body["id"], json!(3));
        assert_eq!(body["type"], json!("clock"));
        assert_eq!(body["has_data"], json!(false));
        assert_eq!(body["conditional"], json!(true));
    }

    #[tokio::test]
    async fn test_preview_current_serves_held_frame() {
        let state = state();
        let missing = preview_current(State(state.clone())).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        state
            .publisher
            .publish(CurrentSlide::new(SlideConfig::new(1, "clock", "Clock"), None, Frame::blank(8, 8)));
        let found = preview_current(State(state)).await;
        assert!(is_png(&found));
    }

    #[tokio::test]
    async fn test_preview_current_falls_back_to_first_slide() {
        let state = state_with(SlidesConfig::default());
        let response = preview_current(State(state.clone())).await;
        assert!(is_png(&response));

        // Rendered through the first slide's pooled collector
        let pooled = state.collectors.collectors();
        assert_eq!(pooled.len(), 1);
        assert_eq!(pooled[0].0, 1);
        assert_eq!(pooled[0].1.name(), "pihole");
    }

    #[tokio::test]
    async fn test_preview_any_configured_slide() {
        let mut note = SlideConfig::new(5, "static_text", "Note");
        note.text = Some("Backups ran".to_string());
        note.enabled = false;
        let mut retired = SlideConfig::new(6, "retired_widget", "Old");
        retired.order = 1;
        let state = state_with(SlidesConfig { slides: vec![note, retired] });

        assert!(is_png(&preview_slide(State(state.clone()), Path(5)).await));
        assert!(is_png(&preview_slide(State(state.clone()), Path(6)).await));
        assert_eq!(
            preview_slide(State(state), Path(99)).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_stats_lists_collectors() {
        let Json(body) = stats(State(state())).await;
        assert_eq!(body["collectors"], json!([]));

        let state = state_with(SlidesConfig::default());
        preview_slide(State(state.clone()), Path(1)).await;
        let Json(body) = stats(State(state)).await;
        assert_eq!(body["collectors"][0]["slide_id"], json!(1));
        assert_eq!(body["collectors"][0]["name"], json!("pihole"));
        assert_eq!(body["collectors"][0]["healthy"], json!(true));
    }
}
