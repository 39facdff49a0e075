//! HTTP server for the order form.
//!
//! `GET /` answers a fixed liveness string. `POST /` and `POST /orders` take
//! the form's JSON document as the raw body, whatever content type the
//! browser sent, and reply with the `{status, ...}` envelope.

use axum::{
	extract::{DefaultBodyLimit, State},
	http::{HeaderValue, Method, StatusCode},
	response::{IntoResponse, Json, Response},
	routing::get,
	Router,
};
use orderdesk_config::ApiConfig;
use orderdesk_core::OrderDesk;
use orderdesk_types::APIError;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

/// Liveness reply for `GET /`.
pub const LIVENESS_MESSAGE: &str = "Order system is working!";

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub desk: Arc<OrderDesk>,
}

/// Builds the router with its middleware stack.
pub fn router(desk: Arc<OrderDesk>, api_config: &ApiConfig) -> Router {
	Router::new()
		.route("/", get(handle_liveness).post(handle_order))
		.route("/orders", axum::routing::post(handle_order))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api_config))
				.layer(TimeoutLayer::with_status_code(
					StatusCode::REQUEST_TIMEOUT,
					Duration::from_secs(api_config.timeout_seconds),
				)),
		)
		.layer(DefaultBodyLimit::max(api_config.max_request_size))
		.with_state(AppState { desk })
}

fn cors_layer(api_config: &ApiConfig) -> CorsLayer {
	let Some(cors) = &api_config.cors else {
		return CorsLayer::permissive();
	};

	let origins: Vec<HeaderValue> = cors
		.allowed_origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(e) => {
				tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(origins)
		.allow_methods([Method::GET, Method::POST])
		.allow_headers(Any)
}

/// Starts the HTTP server and runs until it fails.
pub async fn start_server(
	api_config: ApiConfig,
	desk: Arc<OrderDesk>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(desk, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /.
async fn handle_liveness() -> &'static str {
	LIVENESS_MESSAGE
}

/// Handles POST / and POST /orders.
async fn handle_order(State(state): State<AppState>, body: String) -> Response {
	let result = match state.desk.parse_request(&body) {
		Ok(request) => state.desk.handle(request).await,
		Err(e) => Err(e),
	};

	match result {
		Ok(response) => (StatusCode::OK, Json(response)).into_response(),
		Err(e) => {
			tracing::warn!("Order request failed: {}", e);
			APIError::from(e).into_response()
		},
	}
}
