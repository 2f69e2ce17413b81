use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::{FromRequestParts, Query, Request};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service, ServiceExt};
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-session-id";
pub const SESSION_PARAM: &str = "session_id";
pub const SESSION_COOKIE: &str = "session_id";

/// Opaque session key scoping ledger and profile state.
///
/// Two-phase resolution:
/// 1. `SessionLayer` resolves or mints the id and injects it into extensions
/// 2. Handler extractor reads from extensions, or resolves from the request itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Header, then query parameter, then cookie. Empty values are skipped.
pub fn resolve(headers: &HeaderMap, uri: &Uri) -> Option<SessionId> {
    from_header(headers)
        .or_else(|| from_query(uri))
        .or_else(|| from_cookie(headers))
        .map(SessionId)
}

fn from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn from_query(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.get(SESSION_PARAM).filter(|v| !v.is_empty()).cloned()
}

fn from_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

fn session_cookie(id: &str, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

// --- Tower Layer/Service for session injection ---

/// Injects a `SessionId` into every request. When the client sent none, a
/// fresh UUID is minted and returned in a `Set-Cookie` header.
#[derive(Clone)]
pub struct SessionLayer {
    secure_cookies: bool,
}

impl SessionLayer {
    pub fn new(secure_cookies: bool) -> Self {
        Self { secure_cookies }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            secure_cookies: self.secure_cookies,
        }
    }
}

#[derive(Clone)]
pub struct SessionService<S> {
    inner: S,
    secure_cookies: bool,
}

impl<S> Service<Request> for SessionService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let not_ready = self.inner.clone();
        let ready = std::mem::replace(&mut self.inner, not_ready);
        let secure = self.secure_cookies;

        let (session, minted) = match resolve(req.headers(), req.uri()) {
            Some(session) => (session, false),
            None => (SessionId(Uuid::new_v4().to_string()), true),
        };
        let cookie = minted.then(|| session_cookie(session.as_str(), secure)).flatten();
        if minted {
            tracing::debug!(session_id = %session.as_str(), "minted new session");
        }
        req.extensions_mut().insert(session);

        Box::pin(async move {
            let mut response = ready.oneshot(req).await.into_response();
            if let Some(cookie) = cookie {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Ok(response)
        })
    }
}

// --- Extractor (used by handlers) ---

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Fast path: the session layer already resolved it
        if let Some(session) = parts.extensions.get::<SessionId>() {
            return Ok(session.clone());
        }

        // Slow path: router mounted without the layer (tests, tools)
        Ok(resolve(&parts.headers, &parts.uri)
            .unwrap_or_else(|| SessionId(Uuid::new_v4().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    async fn echo(session: SessionId) -> String {
        session.0
    }

    fn app(secure: bool) -> Router {
        Router::new()
            .route("/whoami", get(echo))
            .layer(SessionLayer::new(secure))
    }

    async fn call(app: Router, req: axum::http::Request<Body>) -> (Response, String) {
        let response = app.oneshot(req).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        (
            Response::from_parts(parts, Body::empty()),
            String::from_utf8(bytes.to_vec()).unwrap(),
        )
    }

    #[tokio::test]
    async fn header_wins_over_query_and_cookie() {
        let req = axum::http::Request::get("/whoami?session_id=from-query")
            .header("X-Session-ID", "from-header")
            .header("Cookie", "session_id=from-cookie")
            .body(Body::empty())
            .unwrap();
        let (response, body) = call(app(false), req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body, "from-header");
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn query_wins_over_cookie() {
        let req = axum::http::Request::get("/whoami?session_id=from-query")
            .header("Cookie", "theme=dark; session_id=from-cookie")
            .body(Body::empty())
            .unwrap();
        let (_, body) = call(app(false), req).await;
        assert_eq!(body, "from-query");
    }

    #[tokio::test]
    async fn cookie_is_used_last() {
        let req = axum::http::Request::get("/whoami")
            .header("Cookie", "theme=dark; session_id=from-cookie")
            .body(Body::empty())
            .unwrap();
        let (response, body) = call(app(false), req).await;
        assert_eq!(body, "from-cookie");
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn missing_session_mints_uuid_and_sets_cookie() {
        let req = axum::http::Request::get("/whoami")
            .header("X-Session-ID", "")
            .body(Body::empty())
            .unwrap();
        let (response, body) = call(app(false), req).await;

        assert!(Uuid::parse_str(&body).is_ok());
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert_eq!(cookie, format!("session_id={body}; Path=/; HttpOnly"));
    }

    #[tokio::test]
    async fn production_cookie_is_secure() {
        let req = axum::http::Request::get("/whoami").body(Body::empty()).unwrap();
        let (response, _) = call(app(true), req).await;
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.ends_with("; Secure"));
    }

    #[tokio::test]
    async fn extractor_resolves_without_layer() {
        let app = Router::new().route("/whoami", get(echo));
        let req = axum::http::Request::get("/whoami")
            .header("X-Session-ID", "direct")
            .body(Body::empty())
            .unwrap();
        let (_, body) = call(app, req).await;
        assert_eq!(body, "direct");
    }
}
