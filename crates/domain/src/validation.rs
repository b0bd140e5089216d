//! Todo 候補のフィールド検証
//!
//! 検証は短絡しない。全フィールドを調べ、見つかったエラーをまとめて返す。

use crate::todo::TodoDraft;
use serde::Serialize;

pub const DESCRIPTION_FIELD: &str = "description";
pub const STATUS_FIELD: &str = "status";

pub const DESCRIPTION_EMPTY: &str = "description.empty";
pub const STATUS_EMPTY: &str = "status.empty";
/// フォームの値が既知の状態トークンではなかった（バインド時に付与）
pub const STATUS_INVALID: &str = "status.invalid";

/// フィールド単位のエラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
}

/// 検証結果。空なら有効
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同じ (field, code) は一度だけ記録する
    pub fn reject(&mut self, field: &'static str, code: &'static str) {
        let error = FieldError { field, code };
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has_field_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn codes_for(&self, field: &str) -> Vec<&'static str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.code)
            .collect()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.code).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// 別の検証結果を後ろに連結
    pub fn merge(mut self, other: ValidationErrors) -> Self {
        for error in other.errors {
            self.reject(error.field, error.code);
        }
        self
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: {}", self.codes().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Todo 候補を検証する
///
/// - `description` が未設定、またはトリム後に空なら `description.empty`
/// - `status` が未設定なら `status.empty`
pub fn validate(draft: &TodoDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let description_missing = draft
        .description
        .as_deref()
        .map_or(true, |d| d.trim().is_empty());
    if description_missing {
        errors.reject(DESCRIPTION_FIELD, DESCRIPTION_EMPTY);
    }

    if draft.status.is_none() {
        errors.reject(STATUS_FIELD, STATUS_EMPTY);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::Status;

    #[test]
    fn test_valid_draft_has_no_errors() {
        let draft = TodoDraft::new(Some("Foobar".into()), Some(Status::Open));
        assert!(validate(&draft).is_empty());
    }

    #[test]
    fn test_empty_draft_reports_both_fields() {
        let errors = validate(&TodoDraft::default());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.codes_for(DESCRIPTION_FIELD), vec![DESCRIPTION_EMPTY]);
        assert_eq!(errors.codes_for(STATUS_FIELD), vec![STATUS_EMPTY]);
    }

    #[test]
    fn test_blank_description_is_empty() {
        let draft = TodoDraft::new(Some(" \t\n".into()), Some(Status::Done));
        assert_eq!(validate(&draft).codes(), vec![DESCRIPTION_EMPTY]);
    }

    #[test]
    fn test_merge_skips_duplicates() {
        let mut binding = ValidationErrors::new();
        binding.reject(STATUS_FIELD, STATUS_INVALID);
        let merged = binding.merge(validate(&TodoDraft::default()));
        assert_eq!(
            merged.codes(),
            vec![STATUS_INVALID, DESCRIPTION_EMPTY, STATUS_EMPTY]
        );

        let again = merged.clone().merge(merged.clone());
        assert_eq!(again, merged);
    }

    #[test]
    fn test_display_lists_codes() {
        let errors = validate(&TodoDraft::default());
        assert_eq!(
            errors.to_string(),
            "validation failed: description.empty, status.empty"
        );
    }

    // プロパティベーステスト: 2 つの検査は互いに独立
    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = Option<Status>> {
            prop_oneof![Just(None), Just(Some(Status::Open)), Just(Some(Status::Done))]
        }

        proptest! {
            #[test]
            fn test_description_error_iff_blank(
                description in proptest::option::of(".{0,32}"),
                status in any_status(),
            ) {
                let blank = description.as_deref().map_or(true, |d| d.trim().is_empty());
                let errors = validate(&TodoDraft::new(description, status));
                prop_assert_eq!(errors.has_field_error(DESCRIPTION_FIELD), blank);
            }

            #[test]
            fn test_status_error_iff_unset(
                description in proptest::option::of(".{0,32}"),
                status in any_status(),
            ) {
                let errors = validate(&TodoDraft::new(description, status));
                prop_assert_eq!(errors.has_field_error(STATUS_FIELD), status.is_none());
            }
        }
    }
}
