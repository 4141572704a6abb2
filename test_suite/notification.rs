use reqwest::StatusCode;

use domain::models::{FlightCancellationReport, Notification, Passenger};
use settings::StorageBackend;

use crate::{
    helpers::{ResponseParts, load_app_settings_for_testing, split_response},
    storage_tests,
    test_case::{EnableTracing, TestCase, new_passenger},
};

storage_tests!(
    a_cancelled_flight_notifies_only_its_passengers,
    a_cancelled_flight_without_passengers_creates_nothing,
    each_cancellation_creates_new_notifications,
    the_message_in_the_event_overrides_the_template,
    an_invalid_event_is_rejected,
    all_notifications_can_be_deleted,
);

async fn register(test_case: &TestCase, first_name: &str, flight_id: i64) -> Passenger {
    let response = test_case
        .create_passenger(&new_passenger(first_name, "Doe", flight_id))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json::<Passenger>().await.unwrap()
}

async fn notifications_of(test_case: &TestCase, passenger: &Passenger) -> Vec<Notification> {
    let response = test_case.passenger_notifications(passenger.id.0).await;
    assert_eq!(response.status(), StatusCode::OK);
    response.json::<Vec<Notification>>().await.unwrap()
}

/// Check that a flight cancellation notifies every passenger of the flight and nobody else.
async fn a_cancelled_flight_notifies_only_its_passengers(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    let john = register(&test_case, "John", 1).await;
    let jane = register(&test_case, "Jane", 1).await;
    let jack = register(&test_case, "Jack", 2).await;

    let response = test_case
        .flight_cancelled(&serde_json::json!({ "flightId": 1 }))
        .await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK, "{}", body);
    let report = serde_json::from_str::<FlightCancellationReport>(&body).unwrap();
    assert_eq!(report.flight_id.0, 1);
    assert_eq!(report.notifications.len(), 2);

    let johns = notifications_of(&test_case, &john).await;
    assert_eq!(johns.len(), 1);
    assert_eq!(johns[0].passenger_id, john.id);
    assert_eq!(johns[0].email, john.email);
    assert_eq!(
        &*johns[0].content,
        "Dear John Doe, your flight 1 has been cancelled."
    );
    assert_eq!(notifications_of(&test_case, &jane).await.len(), 1);
    assert!(notifications_of(&test_case, &jack).await.is_empty());

    let response = test_case.passenger_by_id(john.id.0).await;
    let john = response.json::<Passenger>().await.unwrap();
    assert_eq!(john.notifications.len(), 1);

    test_case.end().await;
}

/// Check that cancelling a flight nobody is booked on succeeds without notifications.
async fn a_cancelled_flight_without_passengers_creates_nothing(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    let john = register(&test_case, "John", 1).await;

    let response = test_case
        .flight_cancelled(&serde_json::json!({ "flightId": 7 }))
        .await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK, "{}", body);
    let report = serde_json::from_str::<FlightCancellationReport>(&body).unwrap();
    assert_eq!(report.flight_id.0, 7);
    assert!(report.notifications.is_empty());
    assert!(notifications_of(&test_case, &john).await.is_empty());

    test_case.end().await;
}

/// Check that the same event delivered twice notifies every passenger twice.
async fn each_cancellation_creates_new_notifications(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    let john = register(&test_case, "John", 3).await;
    let jane = register(&test_case, "Jane", 3).await;

    for _ in 0..2 {
        let response = test_case
            .flight_cancelled(&serde_json::json!({ "flightId": 3 }))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(notifications_of(&test_case, &john).await.len(), 2);
    assert_eq!(notifications_of(&test_case, &jane).await.len(), 2);

    test_case.end().await;
}

/// Check that a message carried by the event is rendered for each passenger.
async fn the_message_in_the_event_overrides_the_template(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    let john = register(&test_case, "John", 4).await;

    let event = serde_json::json!({
        "flightId": 4,
        "message": "{first_name}, flight {flight_id} will not depart"
    });
    let response = test_case.flight_cancelled(&event).await;
    assert_eq!(response.status(), StatusCode::OK);

    let johns = notifications_of(&test_case, &john).await;
    assert_eq!(&*johns[0].content, "John, flight 4 will not depart");

    test_case.end().await;
}

/// Check that an event with an invalid flight id or message is rejected without notifications.
async fn an_invalid_event_is_rejected(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    let john = register(&test_case, "John", 1).await;

    let response = test_case
        .flight_cancelled(&serde_json::json!({ "flightId": 0 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test_case
        .flight_cancelled(&serde_json::json!({ "flightId": 1, "message": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(notifications_of(&test_case, &john).await.is_empty());

    test_case.end().await;
}

/// Check that deleting all notifications reports the count and keeps the passengers.
async fn all_notifications_can_be_deleted(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    let john = register(&test_case, "John", 1).await;
    register(&test_case, "Jane", 1).await;
    let response = test_case
        .flight_cancelled(&serde_json::json!({ "flightId": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_case.delete_all_notifications().await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK, "{}", body);
    let deleted = serde_json::from_str::<serde_json::Value>(&body).unwrap();
    assert_eq!(deleted["deletedCount"], 2);

    let response = test_case.delete_all_notifications().await;
    let deleted = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(deleted["deletedCount"], 0);

    assert!(notifications_of(&test_case, &john).await.is_empty());
    let response = test_case.passenger_list().await;
    let passengers = response.json::<Vec<Passenger>>().await.unwrap();
    assert_eq!(passengers.len(), 2);

    test_case.end().await;
}
