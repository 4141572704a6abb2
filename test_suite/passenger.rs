use reqwest::StatusCode;

use domain::models::{NewPassenger, Notification, Passenger, PassengerId};
use settings::StorageBackend;

use crate::{
    helpers::{ResponseParts, load_app_settings_for_testing, split_response},
    storage_tests,
    test_case::{EnableTracing, TestCase, new_passenger},
};

storage_tests!(
    a_passenger_can_be_registered_and_fetched,
    passengers_are_listed_in_registration_order,
    an_invalid_passenger_is_rejected_with_every_message,
    an_unknown_passenger_is_not_found,
    deleting_a_passenger_removes_their_notifications,
);

/// Check that a registered passenger gets an id and no notifications.
async fn a_passenger_can_be_registered_and_fetched(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;

    let response = test_case
        .create_passenger(&new_passenger("John", "Doe", 1))
        .await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::CREATED, "{}", body);
    let created = serde_json::from_str::<Passenger>(&body).unwrap();
    assert_eq!(created.id, PassengerId::new(1));
    assert_eq!(&*created.first_name, "John");
    assert_eq!(&*created.last_name, "Doe");
    assert_eq!(&*created.email, "john@x.com");
    assert_eq!(created.flight_id.0, 1);
    assert!(created.notifications.is_empty());

    let response = test_case.passenger_by_id(created.id.0).await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK, "{}", body);
    let fetched = serde_json::from_str::<Passenger>(&body).unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.email, created.email);

    test_case.end().await;
}

/// Check that the passenger list is ordered by id and stable across calls.
async fn passengers_are_listed_in_registration_order(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;

    let response = test_case.passenger_list().await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK, "{}", body);
    assert!(serde_json::from_str::<Vec<Passenger>>(&body).unwrap().is_empty());

    for (first_name, flight_id) in [("John", 1), ("Jane", 2), ("Jack", 1)] {
        let response = test_case
            .create_passenger(&new_passenger(first_name, "Doe", flight_id))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let first = test_case.passenger_list().await.text().await.unwrap();
    let second = test_case.passenger_list().await.text().await.unwrap();
    let passengers = serde_json::from_str::<Vec<Passenger>>(&first).unwrap();
    assert_eq!(
        passengers
            .iter()
            .map(|p| p.first_name.to_string())
            .collect::<Vec<_>>(),
        vec!["John", "Jane", "Jack"]
    );
    assert_eq!(first, second);

    test_case.end().await;
}

/// Check that every invalid field is reported and nothing is stored.
async fn an_invalid_passenger_is_rejected_with_every_message(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;

    let body = NewPassenger {
        first_name: Some(String::new()),
        last_name: Some(String::from("Doe")),
        email: Some(String::from("not-an-email")),
        flight_id: None,
    };
    let response = test_case.create_passenger(&body).await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::BAD_REQUEST, "{}", body);
    let error = serde_json::from_str::<serde_json::Value>(&body).unwrap();
    let messages = error["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3, "{}", body);
    assert!(messages[0].as_str().unwrap().starts_with("firstName"));
    assert!(messages[1].as_str().unwrap().starts_with("email"));
    assert_eq!(messages[2], "flightId is required");

    let passengers = test_case.passenger_list().await.text().await.unwrap();
    assert_eq!(passengers, "[]");

    test_case.end().await;
}

/// Check that fetching or deleting an unknown passenger responds 404.
async fn an_unknown_passenger_is_not_found(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;

    let response = test_case.passenger_by_id(99).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = test_case.delete_passenger(99).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = test_case.passenger_notifications(99).await;
    let ResponseParts { status_code, body } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK, "{}", body);
    assert!(serde_json::from_str::<Vec<Notification>>(&body).unwrap().is_empty());

    test_case.end().await;
}

/// Check that deleting a passenger removes only their own notifications.
async fn deleting_a_passenger_removes_their_notifications(backend: StorageBackend) {
    let app_settings = load_app_settings_for_testing(backend);
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;

    let john = test_case
        .create_passenger(&new_passenger("John", "Doe", 1))
        .await
        .json::<Passenger>()
        .await
        .unwrap();
    let jane = test_case
        .create_passenger(&new_passenger("Jane", "Doe", 1))
        .await
        .json::<Passenger>()
        .await
        .unwrap();
    for _ in 0..3 {
        let response = test_case
            .flight_cancelled(&serde_json::json!({ "flightId": 1 }))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = test_case.delete_passenger(john.id.0).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_case.passenger_by_id(john.id.0).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = test_case.delete_passenger(john.id.0).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let notifications = test_case
        .passenger_notifications(john.id.0)
        .await
        .json::<Vec<Notification>>()
        .await
        .unwrap();
    assert!(notifications.is_empty());
    let notifications = test_case
        .passenger_notifications(jane.id.0)
        .await
        .json::<Vec<Notification>>()
        .await
        .unwrap();
    assert_eq!(notifications.len(), 3);

    test_case.end().await;
}
