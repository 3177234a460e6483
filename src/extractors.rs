//! Authentication Extractors
//!
//! Axum extractors for the authenticated identity and request metadata.

use crate::error::AuthError;
use crate::models::Identity;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};
use uuid::Uuid;

/// Identity of the caller, as verified by [`require_auth`](crate::middleware::require_auth)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedIdentity(pub Identity);

impl AuthenticatedIdentity {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only the middleware puts an identity here; without it the route is unprotected.
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(AuthenticatedIdentity)
            .ok_or(AuthError::MissingToken)
    }
}

/// Client information (IP, user agent)
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Read client details from proxy and user-agent headers
    ///
    /// The first hop of `X-Forwarded-For` wins over `X-Real-IP`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let forwarded = header("x-forwarded-for")
            .and_then(|chain| chain.split(',').map(str::trim).find(|hop| !hop.is_empty()));

        Self {
            ip: forwarded.or_else(|| header("x-real-ip")).map(String::from),
            user_agent: header(USER_AGENT.as_str()).map(String::from),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_identity_from_extensions() {
        let identity = Identity::from(Uuid::new_v4());
        let (mut parts, _) = Request::builder()
            .extension(identity)
            .body(())
            .unwrap()
            .into_parts();

        let extracted = AuthenticatedIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(extracted.id(), identity.id);
    }

    #[tokio::test]
    async fn test_identity_missing() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();

        let result = AuthenticatedIdentity::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_client_info() {
        let (mut parts, _) = Request::builder()
            .header("X-Forwarded-For", "10.0.0.1, 10.0.0.2")
            .header("User-Agent", "curl/8.0")
            .body(())
            .unwrap()
            .into_parts();

        let info = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn test_client_info_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", " , ".parse().unwrap());
        headers.insert("x-real-ip", "192.168.1.7".parse().unwrap());

        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip.as_deref(), Some("192.168.1.7"));
        assert!(info.user_agent.is_none());
    }
}
