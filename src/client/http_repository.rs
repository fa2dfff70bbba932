use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::client::instance_repository::{FetchError, InstanceRepository};
use crate::models::instance::{WorkflowInstanceInfo, WorkflowInstanceRef};

/// `InstanceRepository` backed by the engine's diagnostics HTTP API:
/// `GET <base>/api/` for the listing and `GET <base>/api/<instance_id>` for a
/// snapshot.
pub struct HttpInstanceRepository {
    pub client: Client,
    pub base_url: String,
}

impl HttpInstanceRepository {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        HttpInstanceRepository { client, base_url }
    }
}

#[async_trait]
impl InstanceRepository for HttpInstanceRepository {
    async fn list_instances(
        &self,
        after: Option<String>,
        count: usize,
    ) -> Result<Vec<WorkflowInstanceRef>, FetchError> {
        let mut request = self
            .client
            .get(format!("{}/api/", self.base_url))
            .query(&[("count", count.to_string())]);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "listing instances returned {}",
                response.status()
            )));
        }

        response
            .json::<Vec<WorkflowInstanceRef>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn get_instance(&self, instance_id: &str) -> Result<WorkflowInstanceInfo, FetchError> {
        let response = self
            .client
            .get(format!("{}/api/{}", self.base_url, instance_id))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(instance_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "instance `{}` request returned {}",
                instance_id,
                response.status()
            )));
        }

        response
            .json::<WorkflowInstanceInfo>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static CLIENT: Lazy<Client> = Lazy::new(|| {
        Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    });

    fn instance_doc(id: &str) -> serde_json::Value {
        json!({
            "instance": { "instance_id": id, "execution_id": "exec-1" },
            "state": "running",
            "created_at": "2024-05-01T10:00:00Z",
            "history": [
                {
                    "id": 1,
                    "sequence_id": 1,
                    "type": "WorkflowExecutionStarted",
                    "timestamp": "2024-05-01T10:00:00Z",
                    "attributes": { "name": "order-flow", "inputs": [] }
                }
            ]
        })
    }

    #[tokio::test]
    async fn fetches_and_decodes_an_instance_snapshot() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/order-1");
            then.status(200).json_body(instance_doc("order-1"));
        });

        let repo = HttpInstanceRepository::new(CLIENT.clone(), server.base_url());
        let info = repo.get_instance("order-1").await.unwrap();

        mock.assert();
        assert_eq!(info.instance.instance_id, "order-1");
        assert_eq!(info.history.len(), 1);
    }

    #[tokio::test]
    async fn maps_404_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/missing");
            then.status(404);
        });

        let repo = HttpInstanceRepository::new(CLIENT.clone(), server.base_url());
        match repo.get_instance("missing").await {
            Err(FetchError::NotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_malformed_body_to_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/broken");
            then.status(200).body("not json");
        });

        let repo = HttpInstanceRepository::new(CLIENT.clone(), server.base_url());
        assert!(matches!(
            repo.get_instance("broken").await,
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn listing_passes_paging_parameters() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/")
                .query_param("count", "25")
                .query_param("after", "order-9");
            then.status(200).json_body(json!([]));
        });

        let repo = HttpInstanceRepository::new(CLIENT.clone(), server.base_url());
        let refs = repo
            .list_instances(Some("order-9".to_string()), 25)
            .await
            .unwrap();

        mock.assert();
        assert!(refs.is_empty());
    }
}
