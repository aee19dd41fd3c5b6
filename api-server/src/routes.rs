use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::put,
    Router,
};
use chrono::Utc;
use shared::{Calendar, CalendarService};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

const ERR_CREATE_CALENDAR: &str = "error while creating new calendar entry";

pub fn router(service: CalendarService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/push", put(push))
        .with_state(service)
        .layer(cors)
}

/// Replace the caller's events for the submitted day.
///
/// The body is decoded by hand so that malformed JSON is reported like any
/// other server side failure, whatever the content type.
async fn push(State(service): State<CalendarService>, body: Bytes) -> Result<StatusCode, AppError> {
    let calendar: Calendar = serde_json::from_slice(&body).map_err(shared::Error::from)?;
    service.push(calendar, Utc::now()).await?;
    Ok(StatusCode::OK)
}

/// Logs the error and answers with its status code and an empty body.
pub struct AppError(shared::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "{}", ERR_CREATE_CALENDAR);
        StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response()
    }
}

impl From<shared::Error> for AppError {
    fn from(err: shared::Error) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use shared::day::{today, SECONDS_PER_DAY};
    use shared::db::create_memory_pool;
    use tower::ServiceExt;

    async fn app() -> (Router, CalendarService) {
        let service = CalendarService::new(create_memory_pool().await.unwrap());
        service.ensure_schema().await.unwrap();
        service.create_user("abc").await.unwrap();
        (router(service.clone()), service)
    }

    fn put_push(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::PUT)
            .uri("/push")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn payload(token: &str, date: i64, events: &str) -> String {
        format!(
            r#"{{"uuid":"","user_token":"{}","date":{},"events":{}}}"#,
            token, date, events
        )
    }

    #[tokio::test]
    async fn test_push_stores_events() {
        let (app, service) = app().await;
        let date = today(Utc::now());
        let events = r#"[{"uuid":"","calender_uuid":"","title":"standup","start_time":10,"end_time":20}]"#;

        let response = app.oneshot(put_push(payload("abc", date, events))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        let calendar_uuid = service.calendar_entry_exists("abc", date).await.unwrap();
        assert!(!calendar_uuid.is_empty());
        let stored = service.list_events(&calendar_uuid).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "standup");
    }

    #[tokio::test]
    async fn test_push_empty_events_clears_day() {
        let (app, service) = app().await;
        let date = today(Utc::now());
        let events = r#"[{"title":"standup","start_time":10,"end_time":20}]"#;

        let response = app
            .clone()
            .oneshot(put_push(payload("abc", date, events)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(put_push(payload("abc", date, "[]"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let calendar_uuid = service.calendar_entry_exists("abc", date).await.unwrap();
        assert!(!calendar_uuid.is_empty());
        assert!(service.list_events(&calendar_uuid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_token_is_bad_request() {
        let (app, _) = app().await;
        let date = today(Utc::now());

        let response = app.oneshot(put_push(payload("ghost", date, "[]"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_past_day_is_bad_request() {
        let (app, _) = app().await;
        let yesterday = today(Utc::now()) - SECONDS_PER_DAY;

        for token in ["abc", "ghost"] {
            let response = app
                .clone()
                .oneshot(put_push(payload(token, yesterday, "[]")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_server_error() {
        let (app, _) = app().await;

        let response = app.oneshot(put_push("{\"user_token\":")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (app, _) = app().await;

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/push")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let (app, _) = app().await;

        let request = Request::builder()
            .method(Method::GET)
            .uri("/push")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
