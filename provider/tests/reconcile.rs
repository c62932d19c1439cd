//! Reconciler scenarios over real HTTP.
//!
//! Lifecycle and drift scenarios run against the reference server. Call
//! ordering for replacement is checked against wiremock, which records
//! every request it receives.

use petstore_provider::{
    try_init_logging, PetConfig, PetResource, Plan, ProviderConfig, ProviderError, ResourceState,
};
use petstore_sdk::{ApiError, Pet, ValidationError};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn reconciler(address: String) -> PetResource {
    let _ = try_init_logging();
    ProviderConfig {
        address: Some(address),
    }
    .configure()
    .unwrap()
}

fn desired(name: &str, species: &str, age: i64) -> PetConfig {
    PetConfig {
        name: name.to_string(),
        species: species.to_string(),
        age,
    }
}

fn pet(id: &str, name: &str, species: &str, age: i64) -> Pet {
    Pet {
        id: id.to_string(),
        name: name.to_string(),
        species: species.to_string(),
        age,
    }
}

#[tokio::test]
async fn create_update_replace_delete() {
    let resource = reconciler(start_server().await);

    // Create reads back the server's copy.
    let rex = desired("Rex", "dog", 3);
    let state = resource.apply(&ResourceState::Absent, Some(&rex)).await.unwrap();
    assert_eq!(state, ResourceState::Present(pet("1", "Rex", "dog", 3)));

    // Age change is applied in place.
    let older = desired("Rex", "dog", 4);
    assert!(matches!(resource.plan(&state, Some(&older)), Plan::Update(_)));
    let state = resource.apply(&state, Some(&older)).await.unwrap();
    assert_eq!(state, ResourceState::Present(pet("1", "Rex", "dog", 4)));

    // Nothing changed: apply only refreshes.
    let state = resource.apply(&state, Some(&older)).await.unwrap();
    assert_eq!(state, ResourceState::Present(pet("1", "Rex", "dog", 4)));

    // Species change replaces the pet under a new identity.
    let cat = desired("Rex", "cat", 4);
    assert!(resource.plan(&state, Some(&cat)).requires_replace());
    let replaced = resource.apply(&state, Some(&cat)).await.unwrap();
    assert_eq!(replaced, ResourceState::Present(pet("2", "Rex", "cat", 4)));

    // The old identity is gone.
    assert_eq!(resource.read(&state).await.unwrap(), ResourceState::Absent);

    // Removing the desired state deletes the pet.
    let state = resource.apply(&replaced, None).await.unwrap();
    assert_eq!(state, ResourceState::Absent);
    assert_eq!(resource.read(&replaced).await.unwrap(), ResourceState::Absent);
}

#[tokio::test]
async fn out_of_band_delete_is_detected_as_drift() {
    let address = start_server().await;
    let resource = reconciler(address.clone());

    let state = resource.create(&desired("Tom", "cat", 2)).await.unwrap();
    let id = state.id().unwrap().to_string();

    // Someone else deletes the pet.
    let client = ProviderConfig {
        address: Some(address),
    }
    .client()
    .unwrap();
    client.pets().delete(&id).await.unwrap();

    let state = resource.read(&state).await.unwrap();
    assert_eq!(state, ResourceState::Absent);

    // The next apply recreates it.
    let state = resource
        .apply(&state, Some(&desired("Tom", "cat", 2)))
        .await
        .unwrap();
    assert!(state.is_present());
    assert_ne!(state.id(), Some(id.as_str()));
}

#[tokio::test]
async fn reading_unknown_pet_transitions_to_absent() {
    let resource = reconciler(start_server().await);
    let prior = ResourceState::Present(pet("999", "Ghost", "dog", 1));
    assert_eq!(resource.read(&prior).await.unwrap(), ResourceState::Absent);
}

#[tokio::test]
async fn deleting_absent_pet_surfaces_not_found() {
    let resource = reconciler(start_server().await);
    let prior = ResourceState::Present(pet("999", "Ghost", "dog", 1));
    let err = resource.delete(&prior).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn species_change_deletes_then_creates_without_patch() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/pets"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/pets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 2, "name": "Rex", "species": "cat", "age": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pets"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2, "name": "Rex", "species": "cat", "age": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = reconciler(server.uri());
    let prior = ResourceState::Present(pet("1", "Rex", "dog", 3));
    let state = resource
        .apply(&prior, Some(&desired("Rex", "cat", 3)))
        .await
        .unwrap();
    assert_eq!(state, ResourceState::Present(pet("2", "Rex", "cat", 3)));

    let methods: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.method.to_string())
        .collect();
    assert_eq!(methods, vec!["DELETE", "POST", "GET"]);

    let body: serde_json::Value =
        serde_json::from_slice(&server.received_requests().await.unwrap()[1].body).unwrap();
    assert_eq!(body["species"], "cat");
}

#[tokio::test]
async fn invalid_replacement_keeps_the_old_pet() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let resource = reconciler(server.uri());
    let prior = ResourceState::Present(pet("1", "Rex", "dog", 3));
    let err = resource
        .apply(&prior, Some(&desired("Rex", "cat", 0)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Api(ApiError::Validation(ValidationError::NotPositive("age")))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn replacement_of_vanished_pet_creates_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/pets"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let resource = reconciler(server.uri());
    let prior = ResourceState::Present(pet("1", "Rex", "dog", 3));
    let err = resource
        .apply(&prior, Some(&desired("Rex", "cat", 3)))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // Unmatched requests get 404, so a refresh sees the pet as gone and the
    // next plan is a plain create.
    let refreshed = resource.read(&prior).await.unwrap();
    assert_eq!(refreshed, ResourceState::Absent);
    assert_eq!(
        resource.plan(&refreshed, Some(&desired("Rex", "cat", 3))),
        Plan::Create
    );
}

#[tokio::test]
async fn update_answered_with_no_content_is_read_back() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/pets"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pets"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "name": "Rex", "species": "dog", "age": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = reconciler(server.uri());
    let prior = ResourceState::Present(pet("1", "Rex", "dog", 3));
    let state = resource
        .apply(&prior, Some(&desired("Rex", "dog", 4)))
        .await
        .unwrap();
    assert_eq!(state, ResourceState::Present(pet("1", "Rex", "dog", 4)));
}

#[tokio::test]
async fn create_rereads_server_normalized_values() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/pets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "7", "name": "rex", "species": "dog", "age": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pets"))
        .and(query_param("id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7", "name": "Rex", "species": "dog", "age": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = reconciler(server.uri());
    let state = resource.create(&desired("rex", "dog", 3)).await.unwrap();
    assert_eq!(state, ResourceState::Present(pet("7", "Rex", "dog", 3)));
}

#[tokio::test]
async fn invalid_desired_state_never_reaches_the_api() {
    let server = MockServer::start().await;
    let resource = reconciler(server.uri());

    let err = resource
        .apply(&ResourceState::Absent, Some(&desired("Rex", "", 3)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Api(ApiError::Validation(ValidationError::Missing("species")))
    ));

    let err = resource
        .apply(&ResourceState::Absent, Some(&desired("Rex", "dog", 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Api(ApiError::Validation(_))));

    let prior = ResourceState::Present(pet("1", "Rex", "dog", 3));
    let err = resource
        .apply(&prior, Some(&desired("Rex", "dog", -2)))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Api(ApiError::Validation(_))));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_failure_propagates_unchanged() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/pets"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "errors": [{ "title": "conflict", "detail": "pet is being adopted" }]
        })))
        .mount(&server)
        .await;

    let resource = reconciler(server.uri());
    let prior = pet("1", "Rex", "dog", 3);
    let err = resource
        .update(&prior, &desired("Rex", "dog", 4))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "conflict\n\npet is being adopted");
}

#[tokio::test]
async fn cancelled_reconciler_reports_cancellation() {
    let server = MockServer::start().await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let resource = reconciler(server.uri()).with_cancellation(cancel);

    let prior = ResourceState::Present(pet("1", "Rex", "dog", 3));
    let err = resource.read(&prior).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api(ApiError::Cancelled)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
