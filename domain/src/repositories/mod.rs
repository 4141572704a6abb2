mod notification;
mod passenger;

pub use notification::*;
pub use passenger::*;

/// リポジトリコレクション
///
/// 具象リポジトリをDIして使用する。
#[derive(Clone)]
pub struct Repositories<Passenger, Notification>
where
    Passenger: PassengerRepository + Clone,
    Notification: NotificationRepository + Clone,
{
    /// 乗客リポジトリ
    pub passenger_repository: Passenger,
    /// 通知リポジトリ
    pub notification_repository: Notification,
}
