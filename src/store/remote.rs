//! PostgREST-backed collections (the Supabase `rest/v1` API).
//!
//! Every request authenticates with the service-role key and filters on both
//! the owner column and, where relevant, the record id. Failures are returned
//! to the caller as [`StoreError`]; nothing is retried or redirected.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use super::{Collection, Record, StoreError, StoreResult};

const RETURN_REPRESENTATION: &str = "return=representation";

/// Shared HTTP client for the PostgREST endpoint.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
}

impl RestClient {
    /// `project_url` is the Supabase project URL (without `/rest/v1`).
    pub fn new(project_url: &str, service_key: &str) -> anyhow::Result<Self> {
        let base = Url::parse(&format!("{}/rest/v1/", project_url.trim_end_matches('/')))
            .with_context(|| format!("invalid SUPABASE_URL: {project_url}"))?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(service_key).context("service key is not a valid header")?;
        headers.insert("apikey", key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {service_key}"))
                .context("service key is not a valid header")?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http, base })
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> StoreResult<Url> {
        let mut url = self
            .base
            .join(table)
            .map_err(|e| StoreError::Decode(format!("bad table url: {e}")))?;
        if !filters.is_empty() {
            url.query_pairs_mut().extend_pairs(filters);
        }
        Ok(url)
    }
}

/// Collect the JSON rows of a PostgREST response, or turn a non-2xx status into
/// [`StoreError::Upstream`].
async fn read_rows<T: DeserializeOwned>(response: Response) -> StoreResult<Vec<T>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<Vec<T>>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// One table on the remote store.
pub struct RemoteCollection<T> {
    client: RestClient,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RemoteCollection<T> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    fn scoped(owner: &str, id: Option<&str>) -> Vec<(&'static str, String)> {
        let mut filters = vec![(T::OWNER_COLUMN, format!("eq.{owner}"))];
        match id {
            // Profiles are owned through their own id column.
            Some(id) if T::OWNER_COLUMN == "id" && id == owner => {}
            Some(id) => filters.push(("id", format!("eq.{id}"))),
            None => {}
        }
        filters
    }
}

#[async_trait]
impl<T: Record> Collection<T> for RemoteCollection<T> {
    async fn insert(&self, record: T) -> StoreResult<T> {
        let url = self.client.table_url(T::TABLE, &[])?;
        let response = self
            .client
            .http
            .post(url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&record)
            .send()
            .await?;

        let mut rows: Vec<T> = read_rows(response).await?;
        if rows.is_empty() {
            return Err(StoreError::Decode(format!(
                "insert into {} returned no rows",
                T::TABLE
            )));
        }
        let created = rows.swap_remove(0);
        tracing::debug!(table = T::TABLE, id = created.id(), "inserted into remote store");
        Ok(created)
    }

    async fn list(&self, owner: &str) -> StoreResult<Vec<T>> {
        let mut filters = vec![("select", "*".to_string())];
        filters.extend(Self::scoped(owner, None));
        filters.push(("order", format!("{}.asc", T::ORDER_COLUMN)));
        let url = self.client.table_url(T::TABLE, &filters)?;

        let rows: Vec<T> = read_rows(self.client.http.get(url).send().await?).await?;
        tracing::debug!(table = T::TABLE, count = rows.len(), "listed from remote store");
        Ok(rows)
    }

    async fn get(&self, owner: &str, id: &str) -> StoreResult<Option<T>> {
        let mut filters = vec![("select", "*".to_string())];
        filters.extend(Self::scoped(owner, Some(id)));
        let url = self.client.table_url(T::TABLE, &filters)?;

        let rows: Vec<T> = read_rows(self.client.http.get(url).send().await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(
        &self,
        owner: &str,
        id: &str,
        patch: &T::Patch,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<T>> {
        let mut body = match serde_json::to_value(patch) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(other) => {
                return Err(StoreError::Decode(format!(
                    "patch for {} is not an object: {other}",
                    T::TABLE
                )))
            }
            Err(e) => return Err(StoreError::Decode(e.to_string())),
        };
        body.insert(
            "updated_at".into(),
            serde_json::Value::String(updated_at.to_rfc3339()),
        );

        let url = self.client.table_url(T::TABLE, &Self::scoped(owner, Some(id)))?;
        let response = self
            .client
            .http
            .patch(url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&body)
            .send()
            .await?;

        let rows: Vec<T> = read_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, owner: &str, id: &str) -> StoreResult<bool> {
        let url = self.client.table_url(T::TABLE, &Self::scoped(owner, Some(id)))?;
        let response = self
            .client
            .http
            .delete(url)
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = read_rows(response).await?;
        Ok(!rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, Task, TaskPatch, TaskPriority, UserProfile};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn task_json(id: &str, owner: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": owner,
            "title": "Write report",
            "notes": "",
            "is_completed": false,
            "emotional_tag": null,
            "scheduled_date": "2025-01-10T09:00:00+00:00",
            "priority": "High",
            "estimated_duration": 30,
            "project_id": null,
            "created_at": "2025-01-01T00:00:00+00:00",
            "updated_at": "2025-01-01T00:00:00+00:00"
        })
    }

    async fn tasks_on(server: &MockServer) -> RemoteCollection<Task> {
        RemoteCollection::new(RestClient::new(&server.uri(), "service-key").unwrap())
    }

    #[tokio::test]
    async fn list_filters_by_owner_and_orders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("user_id", "eq.alice"))
            .and(query_param("order", "scheduled_date.asc"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json("t1", "alice")])))
            .expect(1)
            .mount(&server)
            .await;

        let tasks = tasks_on(&server).await.list("alice").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, TaskPriority::High);
    }

    #[tokio::test]
    async fn get_scopes_by_owner_and_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("user_id", "eq.alice"))
            .and(query_param("id", "eq.t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        assert!(tasks_on(&server).await.get("alice", "t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_asks_for_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/tasks"))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!({"id": "t1", "user_id": "alice"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([task_json("t1", "alice")])))
            .expect(1)
            .mount(&server)
            .await;

        let new_task: NewTask = serde_json::from_value(json!({
            "title": "Write report",
            "priority": "High",
            "scheduled_date": "2025-01-10T09:00:00Z"
        }))
        .unwrap();
        let record = new_task.into_record("t1".into(), "alice", Utc::now());

        let created = tasks_on(&server).await.insert(record).await.unwrap();
        assert_eq!(created.id, "t1");
    }

    #[tokio::test]
    async fn insert_failure_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/tasks"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .mount(&server)
            .await;

        let record = NewTask {
            title: "x".into(),
            notes: None,
            is_completed: false,
            emotional_tag: None,
            scheduled_date: Utc::now(),
            priority: TaskPriority::Low,
            estimated_duration: 5,
            project_id: None,
        }
        .into_record("t1".into(), "alice", Utc::now());

        let err = tasks_on(&server).await.insert(record).await.unwrap_err();
        match err {
            StoreError::Upstream { status, body } => {
                assert_eq!(status, 409);
                assert_eq!(body, "duplicate key");
            }
            other => panic!("expected upstream error, got {other}"),
        }
    }

    #[tokio::test]
    async fn update_sends_only_named_fields_and_timestamp() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("user_id", "eq.alice"))
            .and(query_param("id", "eq.t1"))
            .and(body_partial_json(json!({"is_completed": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let patch = TaskPatch {
            is_completed: Some(true),
            ..Default::default()
        };
        let updated = tasks_on(&server)
            .await
            .update("alice", "t1", &patch, Utc::now())
            .await
            .unwrap();
        assert!(updated.is_none());

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(body.get("updated_at").is_some());
        assert!(body.get("title").is_none());
    }

    #[tokio::test]
    async fn delete_reports_removed_rows() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("id", "eq.t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json("t1", "alice")])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("id", "eq.missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let tasks = tasks_on(&server).await;
        assert!(tasks.delete("alice", "t1").await.unwrap());
        assert!(!tasks.delete("alice", "missing").await.unwrap());
    }

    #[tokio::test]
    async fn profiles_are_keyed_by_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("id", "eq.alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "alice",
                "personality_type": "Explorer",
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let profiles: RemoteCollection<UserProfile> =
            RemoteCollection::new(RestClient::new(&server.uri(), "service-key").unwrap());
        let profile = profiles.get("alice", "alice").await.unwrap().unwrap();
        assert_eq!(profile.personality_type.as_deref(), Some("Explorer"));
    }
}
