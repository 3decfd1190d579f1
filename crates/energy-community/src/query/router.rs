use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use super::{EligibilityService, QueryError};
use crate::geometry::Point;
use crate::resolver::Resolution;

/// Router builder exposing the read-only lookup endpoints.
pub fn eligibility_router(service: Arc<EligibilityService>) -> Router {
    Router::new()
        .route("/api/v1/eligibility/:lng/:lat", get(eligibility_handler))
        .route("/api/v1/tract/:lng/:lat", get(tract_handler))
        .route("/api/v1/boundaries/:geoid/facts", get(facts_handler))
        .route("/api/v1/snapshot", get(snapshot_handler))
        .with_state(service)
}

pub(crate) async fn eligibility_handler(
    State(service): State<Arc<EligibilityService>>,
    Path((lng, lat)): Path<(String, String)>,
) -> Response {
    let point = match Point::parse(&lng, &lat) {
        Ok(point) => point,
        Err(error) => return query_error_response(error.into()),
    };
    match service.evaluate_point(point.lng, point.lat) {
        Ok(verdict) => (StatusCode::OK, axum::Json(verdict)).into_response(),
        Err(error) => query_error_response(error),
    }
}

pub(crate) async fn tract_handler(
    State(service): State<Arc<EligibilityService>>,
    Path((lng, lat)): Path<(String, String)>,
) -> Response {
    let point = match Point::parse(&lng, &lat) {
        Ok(point) => point,
        Err(error) => return query_error_response(error.into()),
    };
    match service.resolve(point.lng, point.lat) {
        Ok(located) if located.resolution == Resolution::Unresolved => {
            let payload = json!({
                "error": "point is outside every loaded census tract",
                "queried_point": located.queried_point,
                "generation": located.generation,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Ok(located) => (StatusCode::OK, axum::Json(located)).into_response(),
        Err(error) => query_error_response(error),
    }
}

pub(crate) async fn facts_handler(
    State(service): State<Arc<EligibilityService>>,
    Path(geoid): Path<String>,
) -> Response {
    match service.facts_for(&geoid) {
        Ok(facts) => (StatusCode::OK, axum::Json(facts)).into_response(),
        Err(error) => query_error_response(error),
    }
}

pub(crate) async fn snapshot_handler(State(service): State<Arc<EligibilityService>>) -> Response {
    (StatusCode::OK, axum::Json(service.snapshot_info())).into_response()
}

fn query_error_response(error: QueryError) -> Response {
    let status = match &error {
        QueryError::InvalidCoordinate(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QueryError::MalformedIdentifier(_) => StatusCode::BAD_REQUEST,
        QueryError::Attributes(_) | QueryError::Eligibility(_) => {
            tracing::error!(error = %error, "query failed against the serving snapshot");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::loaded_service;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    fn router() -> Router {
        eligibility_router(Arc::new(loaded_service()))
    }

    #[tokio::test]
    async fn eligibility_route_returns_verdict() {
        let (status, body) = get_json(router(), "/api/v1/eligibility/1.0/1.0").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["qualifies"], "true");
        assert_eq!(body["location"]["tract"], "54039000100");
        assert_eq!(body["reasons"][0]["path"], "coal_closure");
        assert_eq!(body["reasons"][0]["dataset_version"], "2.0");
    }

    #[tokio::test]
    async fn eligibility_route_rejects_out_of_range_latitude() {
        let (status, body) = get_json(router(), "/api/v1/eligibility/1.0/91.0").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().expect("message").contains("latitude"));
    }

    #[tokio::test]
    async fn non_numeric_coordinates_get_a_json_error() {
        let (status, body) = get_json(router(), "/api/v1/eligibility/abc/38.5").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().expect("message").contains("'abc'"));

        let (status, body) = get_json(router(), "/api/v1/tract/1.0/north").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().expect("message").contains("'north'"));
    }

    #[tokio::test]
    async fn tract_route_returns_not_found_outside_coverage() {
        let (status, body) = get_json(router(), "/api/v1/tract/-100.0/40.0").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["generation"], 1);

        let (status, body) = get_json(router(), "/api/v1/tract/6.0/1.0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "resolved");
        assert_eq!(body["county"], "54041");
    }

    #[tokio::test]
    async fn facts_route_validates_identifier() {
        let (status, _) = get_json(router(), "/api/v1/boundaries/54x39/facts").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(router(), "/api/v1/boundaries/54039/facts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["boundary"], "54039");
        assert_eq!(body["parent"], "54");
    }

    #[tokio::test]
    async fn snapshot_route_lists_loaded_data() {
        let (status, body) = get_json(router(), "/api/v1/snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generation"], 1);
        assert_eq!(body["datasets"].as_array().expect("datasets").len(), 3);
    }
}
