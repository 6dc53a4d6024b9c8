//! Backend used by the pipeline's integration tests.
//!
//! - `/echo` answers every verb with what it received: method, path, raw
//!   query, headers (lower-cased names) and raw body.
//! - `/v2/topics` is a small in-memory resource speaking JSON.
//! - `/status/{code}` answers with the given status and a JSON body.
//! - `/plain` and `/plain-error` answer with non-JSON text.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTopic {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTopic {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// What `/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Topic>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/v2/topics", get(list_topics).post(create_topic))
        .route(
            "/v2/topics/{id}",
            get(get_topic).patch(update_topic).delete(delete_topic),
        )
        .route("/status/{code}", any(status))
        .route("/plain", get(|| async { "pong" }))
        .route(
            "/plain-error",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable") }),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    })
}

async fn list_topics(State(db): State<Db>) -> Json<Vec<Topic>> {
    let topics = db.read().await;
    Json(topics.values().cloned().collect())
}

async fn create_topic(State(db): State<Db>, Json(input): Json<CreateTopic>) -> Json<Topic> {
    let topic = Topic {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
    };
    db.write().await.insert(topic.id, topic.clone());
    Json(topic)
}

fn not_found(id: Uuid) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "topic not found", "id": id})),
    )
}

async fn get_topic(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Topic>, (StatusCode, Json<Value>)> {
    let topics = db.read().await;
    topics.get(&id).cloned().map(Json).ok_or_else(|| not_found(id))
}

async fn update_topic(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTopic>,
) -> Result<Json<Topic>, (StatusCode, Json<Value>)> {
    let mut topics = db.write().await;
    let topic = topics.get_mut(&id).ok_or_else(|| not_found(id))?;
    if let Some(name) = input.name {
        topic.name = name;
    }
    if let Some(description) = input.description {
        topic.description = Some(description);
    }
    Ok(Json(topic.clone()))
}

async fn delete_topic(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut topics = db.write().await;
    topics
        .remove(&id)
        .map(|_| Json(json!({"deleted": id})))
        .ok_or_else(|| not_found(id))
}

async fn status(Path(code): Path<u16>) -> (StatusCode, Json<Value>) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, Json(json!({"responseCode": code}))),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid status", "responseCode": code})),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_serializes_to_json() {
        let topic = Topic {
            id: Uuid::nil(),
            name: "Test".to_string(),
            description: None,
        };
        let json = serde_json::to_value(&topic).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Test");
        assert!(json["description"].is_null());
    }

    #[test]
    fn create_topic_requires_name() {
        let result: Result<CreateTopic, _> = serde_json::from_str(r#"{"description":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_topic_description_is_optional() {
        let input: CreateTopic = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(input.name, "x");
        assert!(input.description.is_none());
    }

    #[test]
    fn update_topic_all_fields_optional() {
        let input: UpdateTopic = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.description.is_none());
    }
}
