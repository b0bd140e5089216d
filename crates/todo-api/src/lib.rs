//! HTTP API（axum）
//!
//! サーバーレンダリングのフォーム（作成/編集）と、呼び出し元が所有する
//! Todo の JSON コレクションを提供します。

use axum::{body::Body, http::Request, routing::get, Router};
use handlebars::{Handlebars, TemplateError};
use infrastructure::OwnedTodoStore;
use shared::TokenVerifier;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod form;
pub mod handlers;
pub mod identity;

pub use error::ApiError;
pub use identity::CallerIdentity;

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    pub store: OwnedTodoStore,
    pub verifier: Arc<TokenVerifier>,
    pub templates: Arc<Handlebars<'static>>,
}

impl AppState {
    /// テンプレートを登録して状態を構築します。
    pub fn new(store: OwnedTodoStore, verifier: TokenVerifier) -> Result<Self, TemplateError> {
        Ok(Self {
            store,
            verifier: Arc::new(verifier),
            templates: Arc::new(form::templates()?),
        })
    }
}

/// ルータを構築して返します。
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route("/todos/new", get(handlers::new_form))
        .route(
            "/todos/:id",
            get(handlers::edit_form)
                .put(handlers::update_todo)
                .post(handlers::update_todo_via_form),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                shared::request_span(request.method().as_str(), request.uri().path())
            }),
        )
        .with_state(state)
}
