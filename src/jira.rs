//! Jira REST API v2 client
//!
//! A thin blocking client over a single reused HTTP session. Every operation
//! returns the decoded JSON body untouched; typed views live in
//! [`crate::models`].
//!
//! # Configuration
//!
//! - `JIRA_URL`: The base URL of your Jira instance (e.g., "https://company.atlassian.net")
//! - `JIRA_USER`: Your Jira username/email
//! - `JIRA_TOKEN`: Your Jira API token

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::JiraConfig;
use crate::error::{Error, Result};

/// Workflow transition that closes an issue
pub const CLOSE_TRANSITION_ID: &str = "31";

/// Custom field holding the close code of change tickets
pub const CLOSE_CODE_FIELD: &str = "customfield_10500";

/// Default page size for searches
pub const DEFAULT_MAX_RESULTS: u32 = 2;

const API_PATH: &str = "rest/api/2";

#[derive(Debug, Clone)]
struct Credentials {
    user: String,
    token: String,
}

/// Blocking Jira client bound to one instance
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    api_root: String,
    credentials: Option<Credentials>,
    close_transition_id: String,
    close_code_field: String,
}

impl JiraClient {
    /// Create a client for the Jira instance at `base_url`
    ///
    /// The REST root (`<base_url>/rest/api/2`) is resolved here, once.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, Duration::from_secs(30))
    }

    /// Create a client from configuration, attaching credentials when both user and token are set
    pub fn from_config(config: &JiraConfig) -> Result<Self> {
        let url = config.base_url().ok_or(Error::MissingJiraUrl)?;

        let mut client = Self::build(url, Duration::from_secs(config.timeout_secs))?;
        client.close_transition_id = config.close_transition_id.clone();
        client.close_code_field = config.close_code_field.clone();

        if let (Some(user), Some(token)) = (&config.user, &config.token) {
            client = client.with_credentials(user.clone(), token.clone());
        }

        Ok(client)
    }

    fn build(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(concat!("jira-track/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_root: format!("{}/{}", base_url.trim_end_matches('/'), API_PATH),
            credentials: None,
            close_transition_id: CLOSE_TRANSITION_ID.to_string(),
            close_code_field: CLOSE_CODE_FIELD.to_string(),
        })
    }

    /// Use HTTP basic auth with the given user and API token
    pub fn with_credentials(mut self, user: impl Into<String>, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            user: user.into(),
            token: token.into(),
        });
        self
    }

    #[cfg(test)]
    fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Custom field that receives close codes on this instance
    pub fn close_code_field(&self) -> &str {
        &self.close_code_field
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => request.basic_auth(&creds.user, Some(&creds.token)),
            None => request,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(method = "GET", %url, "jira request");
        self.authorize(self.http.get(url))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(method = "POST", %url, "jira request");
        self.authorize(self.http.post(url))
    }

    /// Send a request and decode its body
    ///
    /// Non-2xx statuses become errors whose text carries the status code.
    /// Errors never carry the URL, which may itself contain digits like `401`.
    /// An empty body (e.g., 204 after a transition) decodes to `Value::Null`.
    fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().map_err(|e| e.without_url())?;
        let status = response.status();
        debug!(%status, "jira response");

        let response = response.error_for_status().map_err(|e| e.without_url())?;
        let body = response.text().map_err(|e| e.without_url())?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch a single issue by key or id
    pub fn get_issue(&self, issue_id: &str) -> Result<Value> {
        self.send(self.get(&format!("issue/{}", issue_id)))
    }

    /// Create a single issue
    pub fn create_issue(&self, payload: &Value) -> Result<Value> {
        self.send(self.post("issue").json(payload))
    }

    /// Create several issues in one request
    pub fn bulk_create_issues(&self, payloads: &[Value]) -> Result<Value> {
        self.send(self.post("issue/bulk").json(&bulk_payload(payloads)))
    }

    /// Close an issue through the configured workflow transition
    ///
    /// # Arguments
    /// * `jira_id` - The issue key or id
    /// * `close_code` - Optional close code stored in the close-code custom field
    pub fn close_issue(&self, jira_id: &str, close_code: Option<&str>) -> Result<Value> {
        let payload = close_payload(&self.close_transition_id, &self.close_code_field, close_code);
        self.send(
            self.post(&format!("issue/{}/transitions", jira_id))
                .json(&payload),
        )
    }

    /// Run a JQL search, returning one page of results
    ///
    /// `fields` is forwarded as-is (e.g., "key,status,issuetype").
    pub fn search_issues(
        &self,
        jql: &str,
        fields: &str,
        max_results: u32,
        start_at: u32,
    ) -> Result<Value> {
        let max_results = max_results.to_string();
        let start_at = start_at.to_string();

        self.send(self.get("search").query(&[
            ("jql", jql),
            ("maxResults", max_results.as_str()),
            ("startAt", start_at.as_str()),
            ("fields", fields),
        ]))
    }
}

/// Build the body of a close transition
///
/// The `fields` key is only present when a close code is given.
pub fn close_payload(transition_id: &str, close_code_field: &str, close_code: Option<&str>) -> Value {
    let mut payload = json!({
        "transition": { "id": transition_id }
    });

    if let Some(code) = close_code {
        let mut fields = Map::new();
        fields.insert(close_code_field.to_string(), json!({ "value": code }));
        payload["fields"] = Value::Object(fields);
    }

    payload
}

/// Wrap issue payloads for the bulk endpoint
pub fn bulk_payload(payloads: &[Value]) -> Value {
    json!({ "issueUpdates": payloads })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Failure;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Run blocking client code off the async runtime
    async fn blocking<F, T>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    #[test]
    fn test_close_payload_without_code_has_no_fields() {
        let payload = close_payload(CLOSE_TRANSITION_ID, CLOSE_CODE_FIELD, None);

        assert_eq!(payload, json!({"transition": {"id": CLOSE_TRANSITION_ID}}));
        assert!(payload.get("fields").is_none());
    }

    #[test]
    fn test_close_payload_with_code_has_single_field() {
        let payload = close_payload(CLOSE_TRANSITION_ID, CLOSE_CODE_FIELD, Some("Successful"));

        let fields = payload["fields"].as_object().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[CLOSE_CODE_FIELD], json!({"value": "Successful"}));
        assert_eq!(payload["transition"]["id"], CLOSE_TRANSITION_ID);
    }

    #[test]
    fn test_bulk_payload_wraps_issue_updates() {
        let payloads = vec![json!({"fields": {"summary": "a"}}), json!({"fields": {"summary": "b"}})];
        let body = bulk_payload(&payloads);

        assert_eq!(body["issueUpdates"].as_array().unwrap().len(), 2);
        assert_eq!(body["issueUpdates"][1]["fields"]["summary"], "b");
    }

    #[test]
    fn test_api_root_resolved_at_construction() {
        let client = JiraClient::new("https://jira.example.com/").unwrap();
        assert_eq!(client.api_root(), "https://jira.example.com/rest/api/2");
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = JiraConfig::default();
        assert!(matches!(
            JiraClient::from_config(&config),
            Err(Error::MissingJiraUrl)
        ));

        let blank = JiraConfig {
            url: Some(String::new()),
            ..JiraConfig::default()
        };
        assert!(matches!(
            JiraClient::from_config(&blank),
            Err(Error::MissingJiraUrl)
        ));
    }

    #[test]
    fn test_transport_error_text_omits_url() {
        // Nothing listens on the discard port; the key must not leak into classification.
        let client = JiraClient::new("http://127.0.0.1:9").unwrap();
        let err = client.get_issue("OPS-401").unwrap_err();

        let text = match &err {
            Error::Http(http) => http.to_string(),
            other => panic!("expected an HTTP error, got {other:?}"),
        };
        assert!(!text.contains("127.0.0.1"));
        assert!(!text.contains("OPS-401"));
        assert_eq!(Failure::classify(&text), Failure::Unexpected);
        assert_eq!(
            crate::error::user_message(&err).as_deref(),
            Some(Failure::Unexpected.message())
        );
    }

    #[tokio::test]
    async fn test_search_forwards_params_and_returns_body() {
        let server = MockServer::start().await;
        let body = json!({
            "expand": "schema,names",
            "startAt": 4,
            "maxResults": 2,
            "total": 57,
            "issues": [{"id": "10001", "key": "CHG-1", "fields": {"customfield_1": null}}]
        });

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("jql", "project = CHG AND status != Closed"))
            .and(query_param("maxResults", "2"))
            .and(query_param("startAt", "4"))
            .and(query_param("fields", "key,status,issuetype"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = blocking(move || -> Result<Value> {
            let client = JiraClient::new(&uri)?;
            client.search_issues(
                "project = CHG AND status != Closed",
                "key,status,issuetype",
                DEFAULT_MAX_RESULTS,
                4,
            )
        })
        .await
        .unwrap();

        assert_eq!(result, body);
    }

    #[tokio::test]
    async fn test_get_issue_sends_basic_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/OPS-1"))
            .and(header("authorization", "Basic bWU6c2VjcmV0"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "OPS-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = blocking(move || -> Result<Value> {
            JiraClient::new(&uri)?
                .with_credentials("me", "secret")
                .get_issue("OPS-1")
        })
        .await
        .unwrap();

        assert_eq!(result["key"], "OPS-1");
    }

    #[tokio::test]
    async fn test_create_and_bulk_create_post_payloads() {
        let server = MockServer::start().await;
        let payload = json!({"fields": {"project": {"key": "OPS"}, "summary": "One", "issuetype": {"name": "Task"}}});

        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue"))
            .and(body_json(payload.clone()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "1", "key": "OPS-1"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/bulk"))
            .and(body_json(json!({"issueUpdates": [payload.clone(), payload.clone()]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"issues": [], "errors": []})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let (created, bulk) = blocking(move || -> Result<(Value, Value)> {
            let client = JiraClient::new(&uri)?;
            let created = client.create_issue(&payload)?;
            let bulk = client.bulk_create_issues(&[payload.clone(), payload])?;
            Ok((created, bulk))
        })
        .await
        .unwrap();

        assert_eq!(created["key"], "OPS-1");
        assert_eq!(bulk["errors"], json!([]));
    }

    #[tokio::test]
    async fn test_close_issue_posts_transition() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/CHG-9/transitions"))
            .and(body_json(json!({
                "transition": {"id": CLOSE_TRANSITION_ID},
                "fields": {CLOSE_CODE_FIELD: {"value": "Successful"}}
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = blocking(move || -> Result<Value> {
            JiraClient::new(&uri)?.close_issue("CHG-9", Some("Successful"))
        })
        .await
        .unwrap();

        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_status_errors_classify_by_code() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/OPS-1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/OPS-2"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/OPS-3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let uri = server.uri();
        let errors = blocking(move || {
            let client = JiraClient::new(&uri).unwrap();
            ["OPS-1", "OPS-2", "OPS-3"]
                .iter()
                .map(|key| client.get_issue(key).unwrap_err().to_string())
                .collect::<Vec<_>>()
        })
        .await;

        assert_eq!(Failure::classify(&errors[0]), Failure::Authentication);
        assert_eq!(Failure::classify(&errors[1]), Failure::Permission);
        assert_eq!(Failure::classify(&errors[2]), Failure::Unexpected);
    }
}
