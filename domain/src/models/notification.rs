use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::passenger::{Email, FirstName, FlightId, LastName, PassengerId};
use crate::models::primitives::Id;
use crate::{DomainResult, impl_string_primitive};

/// 通知ID
pub type NotificationId = Id<Notification>;

/// 通知内容
///
/// メッセージテンプレートの最大長と乗客名の最大長から、描画結果が必ず収まる長さにしている。
#[derive(Debug, Clone, PartialEq, Eq, garde::Validate)]
pub struct NotificationContent(#[garde(length(chars, min = 1, max = 10000))] pub String);
impl_string_primitive!(NotificationContent);

/// 通知
///
/// 作成後は変更されず、乗客が削除されたときにまとめて削除される。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// ID
    pub id: NotificationId,
    /// 内容
    pub content: NotificationContent,
    /// 宛先のEメールアドレス（作成時点の乗客のEメールアドレス）
    pub email: Email,
    /// 通知を所有する乗客のID
    pub passenger_id: PassengerId,
    /// 作成日時
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// フライト欠航通知のメッセージテンプレート
///
/// 次のプレースホルダーを置換する。
///
/// - `{flight_id}` - 欠航したフライトのID
/// - `{first_name}` - 乗客の名前
/// - `{last_name}` - 乗客の苗字
#[derive(Debug, Clone, PartialEq, Eq, garde::Validate)]
pub struct MessageTemplate(#[garde(length(chars, min = 1, max = 1000))] pub String);
impl_string_primitive!(MessageTemplate);

impl MessageTemplate {
    /// 乗客宛ての通知内容を生成する。
    ///
    /// プレースホルダーは先頭から1回だけ置換し、置換した値は再び置換しない。
    pub fn render(
        &self,
        flight_id: FlightId,
        first_name: &FirstName,
        last_name: &LastName,
    ) -> DomainResult<NotificationContent> {
        let flight_id = flight_id.to_string();
        let placeholders: [(&str, &str); 3] = [
            ("{flight_id}", flight_id.as_str()),
            ("{first_name}", &**first_name),
            ("{last_name}", &**last_name),
        ];
        let mut content = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find('{') {
            content.push_str(&rest[..start]);
            let tail = &rest[start..];
            match placeholders
                .iter()
                .find(|(placeholder, _)| tail.starts_with(placeholder))
            {
                Some((placeholder, value)) => {
                    content.push_str(value);
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    content.push('{');
                    rest = &tail[1..];
                }
            }
        }
        content.push_str(rest);
        NotificationContent::new(content)
    }
}

/// フライト欠航イベント
///
/// フライトサービスから受け取る。`message`を省略した場合は既定のテンプレートを使用する。
#[derive(Debug, Clone)]
pub struct FlightCancelled {
    pub flight_id: FlightId,
    pub message: Option<MessageTemplate>,
}

/// フライト欠航通知の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightCancellationReport {
    /// 欠航したフライトのID
    pub flight_id: FlightId,
    /// 作成した通知（乗客ごとに1件）
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("Flight {flight_id} was cancelled", "Flight 42 was cancelled")]
    #[case(
        "Dear {first_name} {last_name}, flight {flight_id} is cancelled",
        "Dear John Doe, flight 42 is cancelled"
    )]
    #[case("No placeholders", "No placeholders")]
    fn message_template_render(#[case] template: &str, #[case] expected: &str) {
        let template = MessageTemplate::new(template.to_string()).unwrap();
        let content = template
            .render(
                FlightId(42),
                &FirstName(String::from("John")),
                &LastName(String::from("Doe")),
            )
            .unwrap();
        assert_eq!(&*content, expected);
    }

    #[test]
    fn empty_message_template_is_rejected() {
        assert!(MessageTemplate::new(String::new()).is_err());
    }

    #[test]
    fn placeholders_in_names_are_not_expanded_again() {
        let template = MessageTemplate::new(String::from("{first_name} {last_name}")).unwrap();
        let content = template
            .render(
                FlightId(1),
                &FirstName(String::from("{last_name}")),
                &LastName(String::from("Doe")),
            )
            .unwrap();
        assert_eq!(&*content, "{last_name} Doe");
    }

    #[rstest::rstest]
    #[case("{flight", "{flight")]
    #[case("{unknown} {flight_id}", "{unknown} 7")]
    #[case("{{first_name}}", "{John}")]
    #[case("}{", "}{")]
    fn unknown_braces_are_kept(#[case] template: &str, #[case] expected: &str) {
        let template = MessageTemplate::new(template.to_string()).unwrap();
        let content = template
            .render(
                FlightId(7),
                &FirstName(String::from("John")),
                &LastName(String::from("Doe")),
            )
            .unwrap();
        assert_eq!(&*content, expected);
    }

    #[test]
    fn longest_template_with_longest_names_renders() {
        // 1000文字のテンプレートを最長の苗字で埋める
        let template = "{last_name}".repeat(90) + &"a".repeat(10);
        assert_eq!(template.chars().count(), 1000);
        let template = MessageTemplate::new(template).unwrap();

        let content = template
            .render(
                FlightId(i64::MAX),
                &FirstName("a".repeat(100)),
                &LastName("b".repeat(100)),
            )
            .unwrap();

        assert_eq!(content.chars().count(), 90 * 100 + 10);
    }

    #[test]
    fn too_long_message_template_is_rejected() {
        assert!(MessageTemplate::new("a".repeat(1001)).is_err());
    }

    #[test]
    fn notification_deserializes_rfc3339_timestamp() {
        let notification = serde_json::from_str::<Notification>(
            r#"{
                "id": 5,
                "content": "Flight 1 was cancelled",
                "email": "john@x.com",
                "passengerId": 1,
                "createdAt": "2025-01-01T09:00:00+09:00"
            }"#,
        )
        .unwrap();
        assert_eq!(
            notification.created_at,
            time::macros::datetime!(2025-01-01 00:00:00 UTC)
        );
    }

    #[test]
    fn notification_serializes_camel_case() {
        let notification = Notification {
            id: NotificationId::new(5),
            content: NotificationContent(String::from("Flight 1 was cancelled")),
            email: Email(String::from("john@x.com")),
            passenger_id: PassengerId::new(1),
            created_at: time::macros::datetime!(2025-01-01 00:00:00 UTC),
        };
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 5,
                "content": "Flight 1 was cancelled",
                "email": "john@x.com",
                "passengerId": 1,
                "createdAt": "2025-01-01T00:00:00Z",
            })
        );
    }
}
