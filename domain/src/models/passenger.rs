use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::models::notification::Notification;
use crate::models::primitives::Id;
use crate::repositories::PassengerInput;
use crate::{
    DomainErrorKind, DomainResult, domain_error, impl_int_primitive, impl_string_primitive,
    validation_error,
};

/// 乗客ID
pub type PassengerId = Id<Passenger>;

/// 乗客の名前
#[derive(Debug, Clone, PartialEq, Eq, garde::Validate)]
pub struct FirstName(#[garde(length(chars, min = 1, max = 100))] pub String);
impl_string_primitive!(FirstName);

/// 乗客の苗字
#[derive(Debug, Clone, PartialEq, Eq, garde::Validate)]
pub struct LastName(#[garde(length(chars, min = 1, max = 100))] pub String);
impl_string_primitive!(LastName);

/// Eメールアドレス
///
/// 通知の宛先として使用する。
#[derive(Debug, Clone, PartialEq, Eq, garde::Validate)]
pub struct Email(#[garde(email)] pub String);
impl_string_primitive!(Email);

/// フライトID
///
/// フライトサービスが管理するフライトへの参照で、このサービスでは存在を確認しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, garde::Validate)]
pub struct FlightId(#[garde(range(min = 1))] pub i64);
impl_int_primitive!(FlightId, i64);

/// 乗客
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    /// ID
    pub id: PassengerId,
    /// 名前
    pub first_name: FirstName,
    /// 苗字
    pub last_name: LastName,
    /// Eメールアドレス
    pub email: Email,
    /// フライトID
    pub flight_id: FlightId,
    /// 乗客に送信した通知
    pub notifications: Vec<Notification>,
}

impl Passenger {
    /// 乗客を構築する。
    ///
    /// # ドメインルール
    ///
    /// - 通知はすべてこの乗客に属していなければならない。
    pub fn new(
        id: PassengerId,
        input: PassengerInput,
        notifications: Vec<Notification>,
    ) -> DomainResult<Self> {
        if let Some(notification) = notifications.iter().find(|n| n.passenger_id != id) {
            return Err(domain_error(
                DomainErrorKind::Unexpected,
                format!(
                    "Notification {} belongs to passenger {}, not {}",
                    notification.id, notification.passenger_id, id
                ),
            ));
        }
        let PassengerInput {
            first_name,
            last_name,
            email,
            flight_id,
        } = input;
        Ok(Self {
            id,
            first_name,
            last_name,
            email,
            flight_id,
            notifications,
        })
    }
}

/// 乗客登録データ
///
/// 乗客を登録するときにクライアントから受け取る値で、まだ検証されていない。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPassenger {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub flight_id: Option<i64>,
}

/// 乗客登録データを検証する。
///
/// すべての項目を検証して、問題のある項目ごとにメッセージを持つ検証エラーを返す。
pub fn validate_new_passenger(new_passenger: NewPassenger) -> DomainResult<PassengerInput> {
    let mut messages = vec![];
    let first_name = required(
        new_passenger.first_name,
        "firstName",
        FirstName::new,
        &mut messages,
    );
    let last_name = required(
        new_passenger.last_name,
        "lastName",
        LastName::new,
        &mut messages,
    );
    let email = required(new_passenger.email, "email", Email::new, &mut messages);
    let flight_id = required(
        new_passenger.flight_id,
        "flightId",
        FlightId::new,
        &mut messages,
    );
    match (first_name, last_name, email, flight_id) {
        (Some(first_name), Some(last_name), Some(email), Some(flight_id)) => Ok(PassengerInput {
            first_name,
            last_name,
            email,
            flight_id,
        }),
        _ => Err(validation_error(messages)),
    }
}

fn required<R, T>(
    value: Option<R>,
    field: &'static str,
    construct: impl FnOnce(R) -> DomainResult<T>,
    messages: &mut Vec<Cow<'static, str>>,
) -> Option<T> {
    let Some(value) = value else {
        messages.push(format!("{} is required", field).into());
        return None;
    };
    match construct(value) {
        Ok(value) => Some(value),
        Err(e) => {
            messages.push(format!("{} is invalid: {}", field, e).into());
            None
        }
    }
}

impl TryFrom<NewPassenger> for PassengerInput {
    type Error = crate::DomainError;

    fn try_from(value: NewPassenger) -> Result<Self, Self::Error> {
        validate_new_passenger(value)
    }
}
