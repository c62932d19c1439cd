//! Reference implementation of the petstore HTTP contract.
//!
//! Serves `/api/v1/pets` with identifier addressing through the `id` query
//! parameter. Ids are sequential integers starting at 1 and go out as JSON
//! numbers. Semantic validation failures answer 422 with an `errors` payload.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    pub species: String,
    pub age: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub age: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePet {
    pub name: Option<String>,
    pub species: Option<String>,
    pub age: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorObject {
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorsPayload {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    pets: HashMap<u64, Pet>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route(
            "/api/v1/pets",
            get(get_pet)
                .post(create_pet)
                .patch(update_pet)
                .delete(delete_pet),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Failure responses of the pet routes.
#[derive(Debug)]
pub enum Failure {
    BadRequest(String),
    NotFound,
    Unprocessable(Vec<ErrorObject>),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Failure::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Failure::NotFound => (StatusCode::NOT_FOUND, "pet not found").into_response(),
            Failure::Unprocessable(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorsPayload { errors })).into_response()
            }
        }
    }
}

fn parse_id(query: &IdQuery) -> Result<u64, Failure> {
    let raw = query
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Failure::BadRequest("id is required".to_string()))?;
    raw.parse()
        .map_err(|e| Failure::BadRequest(format!("invalid id {raw:?}: {e}")))
}

fn check_fields(species: Option<&str>, age: Option<i64>) -> Result<(), Failure> {
    let mut errors = Vec::new();
    if species.is_some_and(str::is_empty) {
        errors.push(ErrorObject {
            title: "invalid species".to_string(),
            detail: "species must not be empty".to_string(),
        });
    }
    if age.is_some_and(|age| age <= 0) {
        errors.push(ErrorObject {
            title: "invalid age".to_string(),
            detail: "age must be greater than zero".to_string(),
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Failure::Unprocessable(errors))
    }
}

async fn create_pet(
    State(db): State<Db>,
    Json(input): Json<CreatePet>,
) -> Result<(StatusCode, Json<Pet>), Failure> {
    check_fields(Some(&input.species), Some(input.age))?;
    let mut store = db.write().await;
    store.next_id += 1;
    let pet = Pet {
        id: store.next_id,
        name: input.name,
        species: input.species,
        age: input.age,
    };
    store.pets.insert(pet.id, pet.clone());
    tracing::info!(id = pet.id, "created pet");
    Ok((StatusCode::CREATED, Json(pet)))
}

async fn get_pet(State(db): State<Db>, Query(query): Query<IdQuery>) -> Result<Json<Pet>, Failure> {
    let id = parse_id(&query)?;
    let store = db.read().await;
    store.pets.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

async fn update_pet(
    State(db): State<Db>,
    Query(query): Query<IdQuery>,
    Json(input): Json<UpdatePet>,
) -> Result<Json<Pet>, Failure> {
    let id = parse_id(&query)?;
    check_fields(input.species.as_deref(), input.age)?;
    let mut store = db.write().await;
    let pet = store.pets.get_mut(&id).ok_or(Failure::NotFound)?;
    if let Some(name) = input.name {
        pet.name = name;
    }
    if let Some(species) = input.species {
        pet.species = species;
    }
    if let Some(age) = input.age {
        pet.age = age;
    }
    Ok(Json(pet.clone()))
}

async fn delete_pet(State(db): State<Db>, Query(query): Query<IdQuery>) -> Result<StatusCode, Failure> {
    let id = parse_id(&query)?;
    let mut store = db.write().await;
    store
        .pets
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Failure::NotFound)
}
