use crate::form::{accepts_json, BoundForm, FormView, InputFormat, TodoInput, FORM_TEMPLATE};
use crate::{ApiError, AppState, CallerIdentity};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use domain::{Todo, TodoId, ValidationErrors};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthBody {
    /// サービスの簡易ステータス
    status: &'static str,
}

/// ヘルスチェック用ハンドラ（認証不要）
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

/// GET /todos/new: 空の作成フォーム
pub async fn new_form(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Result<Html<String>, ApiError> {
    render(&state, &FormView::blank())
}

/// GET /todos/{id}
///
/// HTML では、見つからない（または他人の）Todo は空の作成フォームとして表示する。
/// `Accept: application/json` の場合は同じ状況を 404 とする。
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CallerIdentity(caller): CallerIdentity,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let todo = match id.parse::<TodoId>() {
        Ok(id) => state.store.find_by_id(&id, &caller).await?,
        Err(_) => None,
    };

    if accepts_json(&headers) {
        let todo = todo.ok_or(ApiError::NotFound)?;
        return Ok(Json(todo).into_response());
    }

    let view = match &todo {
        Some(todo) => FormView::edit(todo),
        None => FormView::blank(),
    };
    Ok(render(&state, &view)?.into_response())
}

/// POST /todos
pub async fn create_todo(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    input: TodoInput,
) -> Result<Response, ApiError> {
    let BoundForm { draft, errors } = input.form.bind();

    // バインドエラーがあれば status は未設定なので、検証も必ず失敗する
    let todo = match draft.clone().into_todo() {
        Ok(todo) => todo,
        Err(validation) => {
            let errors = errors.merge(validation);
            tracing::debug!(owner = %caller, errors = %errors, "create rejected");
            return rejected(&state, input.format, FormView::create(&draft, &errors), errors);
        }
    };

    let saved = state.store.save(todo, &caller).await?;
    let location = location_of(&saved)?;
    Ok(match input.format {
        InputFormat::Form => redirect_to(location),
        InputFormat::Json => (
            StatusCode::CREATED,
            [(header::LOCATION, location)],
            Json(saved),
        )
            .into_response(),
    })
}

/// PUT /todos/{id}
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CallerIdentity(caller): CallerIdentity,
    input: TodoInput,
) -> Result<Response, ApiError> {
    apply_update(&state, &id, &caller, input).await
}

/// POST /todos/{id}: `_method=PUT` を伴う HTML フォームからの更新
pub async fn update_todo_via_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CallerIdentity(caller): CallerIdentity,
    input: TodoInput,
) -> Result<Response, ApiError> {
    if !input.form.is_put_override() {
        return Err(ApiError::MethodNotAllowed);
    }
    apply_update(&state, &id, &caller, input).await
}

/// GET /todos: 呼び出し元の Todo 一覧（JSON）
pub async fn list_todos(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.store.find_all_for_caller(&caller).await?;
    Ok(Json(todos))
}

async fn apply_update(
    state: &AppState,
    id: &str,
    caller: &str,
    input: TodoInput,
) -> Result<Response, ApiError> {
    let id: TodoId = id.parse().map_err(|_| ApiError::NotFound)?;
    let mut todo = state
        .store
        .find_by_id(&id, caller)
        .await?
        .ok_or(ApiError::NotFound)?;

    let BoundForm { draft, errors } = input.form.bind();
    if let Err(validation) = todo.update_from(draft.clone()) {
        let errors = errors.merge(validation);
        tracing::debug!(owner = %caller, todo_id = %id, errors = %errors, "update rejected");
        return rejected(state, input.format, FormView::update(&id, &draft, &errors), errors);
    }

    let saved = state.store.save(todo, caller).await?;
    Ok(match input.format {
        InputFormat::Form => redirect_to(location_of(&saved)?),
        InputFormat::Json => Json(saved).into_response(),
    })
}

/// 検証エラー時の応答。フォームは 200 で再表示、JSON は 400
fn rejected(
    state: &AppState,
    format: InputFormat,
    view: FormView,
    errors: ValidationErrors,
) -> Result<Response, ApiError> {
    match format {
        InputFormat::Form => Ok(render(state, &view)?.into_response()),
        InputFormat::Json => Err(ApiError::Validation(errors)),
    }
}

fn render(state: &AppState, view: &FormView) -> Result<Html<String>, ApiError> {
    Ok(Html(state.templates.render(FORM_TEMPLATE, view)?))
}

fn location_of(todo: &Todo) -> Result<String, ApiError> {
    let id = todo
        .id()
        .ok_or_else(|| ApiError::Internal("saved todo has no id".to_string()))?;
    Ok(format!("/todos/{id}"))
}

fn redirect_to(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
