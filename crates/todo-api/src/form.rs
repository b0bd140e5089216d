//! フォーム入力のバインドと、フォーム画面のビューモデル

use domain::{
    Status, Todo, TodoDraft, TodoId, ValidationErrors, DESCRIPTION_EMPTY, DESCRIPTION_FIELD,
    STATUS_EMPTY, STATUS_FIELD, STATUS_INVALID,
};
use crate::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
    Form, Json,
};
use handlebars::{Handlebars, TemplateError};
use serde::{Deserialize, Serialize};

pub const FORM_TEMPLATE: &str = "form";

const FORM_TEMPLATE_SOURCE: &str = include_str!("../templates/form.hbs");

/// フォームテンプレートを登録したレンダラ
pub fn templates() -> Result<Handlebars<'static>, TemplateError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_template_string(FORM_TEMPLATE, FORM_TEMPLATE_SOURCE)?;
    Ok(handlebars)
}

/// 送信されたフォーム（urlencoded または JSON）
///
/// `id` や `owner_id` は受け取らない（送られてきても無視される）。
#[derive(Debug, Default, Deserialize)]
pub struct TodoForm {
    pub description: Option<String>,
    pub status: Option<String>,
    /// HTML フォームから PUT を送るための上書き指定
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

/// バインド結果。`errors` には型変換で失敗したフィールドが入る
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundForm {
    pub draft: TodoDraft,
    pub errors: ValidationErrors,
}

impl TodoForm {
    pub fn bind(self) -> BoundForm {
        let mut errors = ValidationErrors::new();
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(token) => match Status::from_string(token) {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.reject(STATUS_FIELD, STATUS_INVALID);
                    None
                }
            },
        };

        BoundForm {
            draft: TodoDraft::new(self.description, status),
            errors,
        }
    }

    pub fn is_put_override(&self) -> bool {
        self.method
            .as_deref()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case("PUT"))
    }
}

/// 入力の形式。応答の形（HTML か JSON か）もこれで決まる
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Form,
    Json,
}

/// `Content-Type` に応じて urlencoded または JSON から `TodoForm` を取り出す
#[derive(Debug)]
pub struct TodoInput {
    pub form: TodoForm,
    pub format: InputFormat,
}

#[async_trait]
impl<S> FromRequest<S> for TodoInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if has_json_content(req.headers()) {
            let Json(form) = Json::<TodoForm>::from_request(req, state)
                .await
                .map_err(|r| ApiError::InvalidBody {
                    status: r.status(),
                    message: r.body_text(),
                })?;
            return Ok(Self {
                form,
                format: InputFormat::Json,
            });
        }

        let Form(form) = Form::<TodoForm>::from_request(req, state)
            .await
            .map_err(|r| ApiError::InvalidBody {
                status: r.status(),
                message: r.body_text(),
            })?;
        Ok(Self {
            form,
            format: InputFormat::Form,
        })
    }
}

fn has_json_content(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("application/json"))
}

/// `Accept` に `application/json` が含まれていれば JSON で応答する
pub fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

#[derive(Debug, Serialize)]
struct TodoFields {
    description: String,
    status: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct StatusOption {
    value: &'static str,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct ErrorMessage {
    code: &'static str,
    message: &'static str,
}

#[derive(Debug, Default, Serialize)]
struct FieldMessages {
    description: Vec<ErrorMessage>,
    status: Vec<ErrorMessage>,
}

/// フォーム画面のモデル
#[derive(Debug, Serialize)]
pub struct FormView {
    id: Option<String>,
    todo: TodoFields,
    /// `POST`（作成）または `PUT`（更新）
    method: &'static str,
    action: String,
    statii: Vec<StatusOption>,
    errors: FieldMessages,
    has_errors: bool,
}

impl FormView {
    /// 空の作成フォーム
    pub fn blank() -> Self {
        Self::create(&TodoDraft::new(None, Some(Status::default())), &ValidationErrors::new())
    }

    /// 作成フォーム（再表示を含む）
    pub fn create(draft: &TodoDraft, errors: &ValidationErrors) -> Self {
        Self::build(None, draft, errors)
    }

    /// 既存 Todo の編集フォーム
    pub fn edit(todo: &Todo) -> Self {
        match todo.id() {
            Some(id) => Self::update(id, &TodoDraft::from(todo), &ValidationErrors::new()),
            None => Self::create(&TodoDraft::from(todo), &ValidationErrors::new()),
        }
    }

    /// 更新フォーム（再表示を含む）
    pub fn update(id: &TodoId, draft: &TodoDraft, errors: &ValidationErrors) -> Self {
        Self::build(Some(id), draft, errors)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    fn build(id: Option<&TodoId>, draft: &TodoDraft, errors: &ValidationErrors) -> Self {
        let messages = |field: &str| {
            errors
                .codes_for(field)
                .into_iter()
                .map(|code| ErrorMessage {
                    code,
                    message: message_for(code),
                })
                .collect::<Vec<_>>()
        };

        Self {
            id: id.map(ToString::to_string),
            todo: TodoFields {
                description: draft.description.clone().unwrap_or_default(),
                status: draft.status.map(|s| s.as_str()),
            },
            method: if id.is_some() { "PUT" } else { "POST" },
            action: match id {
                Some(id) => format!("/todos/{id}"),
                None => "/todos".to_string(),
            },
            statii: Status::ALL
                .iter()
                .map(|s| StatusOption {
                    value: s.as_str(),
                    selected: draft.status == Some(*s),
                })
                .collect(),
            errors: FieldMessages {
                description: messages(DESCRIPTION_FIELD),
                status: messages(STATUS_FIELD),
            },
            has_errors: !errors.is_empty(),
        }
    }
}

fn message_for(code: &str) -> &'static str {
    match code {
        DESCRIPTION_EMPTY => "Please describe what needs to be done.",
        STATUS_EMPTY => "Please choose a status.",
        STATUS_INVALID => "Unknown status.",
        _ => "Invalid value.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(description: Option<&str>, status: Option<&str>) -> TodoForm {
        TodoForm {
            description: description.map(String::from),
            status: status.map(String::from),
            method: None,
        }
    }

    #[test]
    fn test_bind_parses_status_token() {
        let bound = form(Some("Buy milk"), Some("DONE")).bind();
        assert!(bound.errors.is_empty());
        assert_eq!(
            bound.draft,
            TodoDraft::new(Some("Buy milk".into()), Some(Status::Done))
        );
    }

    #[test]
    fn test_bind_treats_blank_status_as_unset() {
        let bound = form(Some(""), Some("")).bind();
        assert!(bound.errors.is_empty());
        assert_eq!(bound.draft.status, None);
    }

    #[test]
    fn test_bind_reports_unknown_status() {
        let bound = form(Some("x"), Some("ERLEDIGT")).bind();
        assert_eq!(bound.errors.codes(), vec![STATUS_INVALID]);
        assert_eq!(bound.draft.status, None);
    }

    #[test]
    fn test_method_override_is_case_insensitive() {
        let mut f = form(None, None);
        assert!(!f.is_put_override());
        f.method = Some("put".into());
        assert!(f.is_put_override());
        f.method = Some("DELETE".into());
        assert!(!f.is_put_override());
    }

    #[test]
    fn test_json_body_binds_like_a_form() {
        let form: TodoForm = serde_json::from_value(serde_json::json!({
            "id": "99",
            "owner_id": "mallory",
            "description": "Buy milk",
            "status": "open",
        }))
        .unwrap();
        let bound = form.bind();
        assert!(bound.errors.is_empty());
        assert_eq!(
            bound.draft,
            TodoDraft::new(Some("Buy milk".into()), Some(Status::Open))
        );
    }

    #[test]
    fn test_accepts_json_reads_accept_header() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_json(&headers));
        headers.insert(header::ACCEPT, "text/html".parse().unwrap());
        assert!(!accepts_json(&headers));
        headers.insert(
            header::ACCEPT,
            "application/json, text/plain;q=0.5".parse().unwrap(),
        );
        assert!(accepts_json(&headers));
    }

    #[test]
    fn test_blank_view_is_a_create_form() {
        let view = FormView::blank();
        assert_eq!(view.id(), None);
        assert_eq!(view.method(), "POST");
        assert_eq!(view.action, "/todos");
        assert_eq!(view.todo.status, Some("OPEN"));
        assert_eq!(view.statii.len(), 2);
    }

    #[test]
    fn test_edit_view_is_an_update_form() {
        let id = TodoId::from_string("23".to_string()).unwrap();
        let view = FormView::edit(&Todo::restore(id, "alice", "test", Status::Done));
        assert_eq!(view.id(), Some("23"));
        assert_eq!(view.method(), "PUT");
        assert_eq!(view.action, "/todos/23");
        assert!(view.statii.iter().any(|o| o.value == "DONE" && o.selected));
    }

    #[test]
    fn test_errors_are_grouped_by_field() {
        let draft = TodoDraft::default();
        let errors = domain::validate(&draft);
        let view = FormView::create(&draft, &errors);
        assert!(view.has_errors);
        assert_eq!(view.errors.description[0].code, DESCRIPTION_EMPTY);
        assert_eq!(view.errors.status[0].code, STATUS_EMPTY);
    }

    #[test]
    fn test_template_renders_errors_and_options() {
        let draft = TodoDraft::default();
        let html = templates()
            .unwrap()
            .render(FORM_TEMPLATE, &FormView::create(&draft, &domain::validate(&draft)))
            .unwrap();
        assert!(html.contains(r#"data-method="POST""#));
        assert!(html.contains(r#"data-code="description.empty""#));
        assert!(html.contains(r#"data-code="status.empty""#));
        assert!(html.contains(r#"<option value="OPEN">"#));
        assert!(!html.contains(r#"name="_method""#));
    }
}
