use std::borrow::Cow;

pub mod models;
pub mod repositories;

/// ドメインエラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainErrorKind {
    /// 検証エラー
    Validation,
    /// エンティティが存在しない
    NotFound,
    /// ストレージの操作に失敗
    Repository,
    /// 処理がキャンセルされた
    Cancelled,
    /// 予期しないエラー
    Unexpected,
}

/// ドメインエラー
#[derive(Debug, thiserror::Error)]
#[error("{}", .messages.join(", "))]
pub struct DomainError {
    /// エラーの種類
    pub kind: DomainErrorKind,
    /// エラーメッセージ
    pub messages: Vec<Cow<'static, str>>,
    /// エラーの原因
    #[source]
    pub source: anyhow::Error,
}

/// ドメイン結果
pub type DomainResult<T> = Result<T, DomainError>;

/// メッセージを1つ持つドメインエラーを作成する。
pub fn domain_error(kind: DomainErrorKind, message: impl Into<Cow<'static, str>>) -> DomainError {
    let message = message.into();
    DomainError {
        kind,
        source: anyhow::anyhow!(message.clone()),
        messages: vec![message],
    }
}

/// 複数のメッセージを持つ検証エラーを作成する。
pub fn validation_error(messages: Vec<Cow<'static, str>>) -> DomainError {
    DomainError {
        kind: DomainErrorKind::Validation,
        source: anyhow::anyhow!(messages.join(", ")),
        messages,
    }
}

#[doc(hidden)]
pub fn starts_or_ends_with_whitespace(s: &str) -> bool {
    s.chars().next().is_some_and(|ch| ch.is_whitespace())
        || s.chars().last().is_some_and(|ch| ch.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_display_joins_messages() {
        let error = validation_error(vec!["firstName is required".into(), "email is invalid".into()]);
        assert_eq!(error.kind, DomainErrorKind::Validation);
        assert_eq!(error.to_string(), "firstName is required, email is invalid");
    }

    #[rstest::rstest]
    #[case("abc", false)]
    #[case(" abc", true)]
    #[case("abc ", true)]
    #[case("", false)]
    fn whitespace_at_edges(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(starts_or_ends_with_whitespace(s), expected);
    }
}
