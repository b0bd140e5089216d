use crate::{ApiError, AppState};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// 認証済みの呼び出し元 ID（JWT の `sub`）
///
/// 認証そのものは外部の ID プロバイダーが行う。ここでは Bearer トークンを
/// 検証して ID を取り出すだけ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let claims = state.verifier.verify_bearer(header).map_err(|e| {
            tracing::debug!(error = %e, path = %parts.uri.path(), "rejected request without valid identity");
            ApiError::from(e)
        })?;

        Ok(CallerIdentity(claims.sub))
    }
}
