//! HTTP client for the CloudWatch Logs JSON 1.1 API.

mod signing;

use async_trait::async_trait;
use chrono::Utc;
use insights_core::serde_utils::from_json_bytes;
use insights_core::{ClientConfig, Credentials};
use insights_protocol::query::{
    JobHandle, QueryIdInput, StartQueryInput, StartQueryOutput, StopQueryOutput,
};
use insights_protocol::results::ResultSnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::InsightsError;
use crate::service::InsightsService;

use self::signing::{sign, SigningRequest};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "Logs_20140328";

/// Typed HTTP client used by query sessions to reach the logs service.
#[derive(Clone)]
pub struct HttpInsightsClient {
    http: reqwest::Client,
    endpoint: Url,
    region: String,
    credentials: Option<Credentials>,
}

impl HttpInsightsClient {
    /// Creates a client for the endpoint and credentials in `config`.
    ///
    /// Without credentials requests are sent unsigned.
    pub fn new(config: &ClientConfig) -> Result<Self, InsightsError> {
        let raw = config.endpoint_url()?;
        let endpoint = Url::parse(&raw).map_err(|source| InsightsError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            region: config.signing_region().to_string(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<I, O>(&self, operation: &str, input: &I) -> Result<O, InsightsError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let payload =
            serde_json::to_vec(input).map_err(|err| InsightsError::Encode(err.to_string()))?;
        let target = format!("{}.{}", TARGET_PREFIX, operation);

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", &target);

        if let Some(credentials) = &self.credentials {
            let host = host_header(&self.endpoint);
            let signing = SigningRequest {
                host: &host,
                path: self.endpoint.path(),
                content_type: CONTENT_TYPE,
                target: &target,
                payload: &payload,
            };
            for (name, value) in sign(credentials, &self.region, &signing, Utc::now()) {
                request = request.header(name, value);
            }
        }

        debug!(operation, endpoint = %self.endpoint, "calling logs service");
        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|err| InsightsError::Http(err.to_string()))?;

        parse_response(response).await
    }
}

#[async_trait]
impl InsightsService for HttpInsightsClient {
    async fn start_query(&self, input: &StartQueryInput) -> Result<JobHandle, InsightsError> {
        let output: StartQueryOutput = self.call("StartQuery", input).await?;
        Ok(output.query_id)
    }

    async fn get_query_results(
        &self,
        handle: &JobHandle,
    ) -> Result<ResultSnapshot, InsightsError> {
        let input = QueryIdInput {
            query_id: handle.clone(),
        };
        self.call("GetQueryResults", &input).await
    }

    async fn stop_query(&self, handle: &JobHandle) -> Result<(), InsightsError> {
        let input = QueryIdInput {
            query_id: handle.clone(),
        };
        let output: StopQueryOutput = self.call("StopQuery", &input).await?;
        debug!(query_id = %handle, success = output.success, "stop acknowledged");
        Ok(())
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, InsightsError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| InsightsError::Http(err.to_string()))?;

    if status.is_success() {
        return from_json_bytes(&body).map_err(|err| InsightsError::Decode(err.to_string()));
    }

    match serde_json::from_slice::<ServiceFault>(&body) {
        Ok(fault) => Err(InsightsError::Service {
            code: fault.code().to_string(),
            message: fault.message,
        }),
        Err(_) => Err(InsightsError::UnexpectedStatus {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct ServiceFault {
    #[serde(rename = "__type")]
    kind: String,
    #[serde(default, alias = "Message")]
    message: String,
}

impl ServiceFault {
    /// `com.amazonaws.logs#ResourceNotFoundException` -> `ResourceNotFoundException`.
    fn code(&self) -> &str {
        let name = self.kind.rsplit('#').next().unwrap_or(&self.kind);
        name.split(':').next().unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_protocol::results::QueryStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, credentials: Option<Credentials>) -> HttpInsightsClient {
        let config = ClientConfig {
            region: Some("us-west-2".into()),
            endpoint: Some(server.uri()),
            credentials,
        };
        HttpInsightsClient::new(&config).expect("client")
    }

    #[tokio::test]
    async fn start_query_posts_json_with_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "Logs_20140328.StartQuery"))
            .and(header("content-type", CONTENT_TYPE))
            .and(body_json(json!({
                "logGroupNames": ["/aws/lambda/a"],
                "startTime": 100,
                "endTime": 200,
                "queryString": "fields @message",
                "limit": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queryId": "Q1"})))
            .expect(1)
            .mount(&server)
            .await;

        let input = StartQueryInput {
            log_group_names: vec!["/aws/lambda/a".into()],
            start_time: 100,
            end_time: 200,
            query_string: "fields @message".into(),
            limit: 10,
        };
        let handle = client_for(&server, None).start_query(&input).await.unwrap();
        assert_eq!(handle, JobHandle::new("Q1"));
    }

    #[tokio::test]
    async fn get_query_results_decodes_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "Logs_20140328.GetQueryResults"))
            .and(body_json(json!({"queryId": "Q1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Running",
                "results": [[{"field": "foo", "value": "1"}]],
                "statistics": {"recordsMatched": 1.0, "recordsScanned": 4.0, "bytesScanned": 64.0}
            })))
            .mount(&server)
            .await;

        let snapshot = client_for(&server, None)
            .get_query_results(&JobHandle::new("Q1"))
            .await
            .unwrap();
        assert_eq!(snapshot.status, QueryStatus::Running);
        assert_eq!(snapshot.results.len(), 1);
    }

    #[tokio::test]
    async fn service_faults_keep_their_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "Logs_20140328.StopQuery"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "com.amazonaws.logs#ResourceNotFoundException",
                "message": "Query does not exist"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .stop_query(&JobHandle::new("Q1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Query does not exist"));
    }

    #[tokio::test]
    async fn non_json_errors_report_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .get_query_results(&JobHandle::new("Q1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InsightsError::UnexpectedStatus { status, ref body }
                if status.as_u16() == 503 && body == "upstream unavailable"
        ));
    }

    #[tokio::test]
    async fn signs_requests_when_credentials_are_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header("x-amz-security-token", "token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = Credentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
            session_token: Some("token".into()),
        };
        client_for(&server, Some(credentials))
            .stop_query(&JobHandle::new("Q1"))
            .await
            .unwrap();
    }

    #[test]
    fn fault_code_strips_namespace_and_suffix() {
        let fault = ServiceFault {
            kind: "com.amazonaws.logs#ThrottlingException".into(),
            message: String::new(),
        };
        assert_eq!(fault.code(), "ThrottlingException");
        let fault = ServiceFault {
            kind: "InvalidParameterException:http://internal".into(),
            message: String::new(),
        };
        assert_eq!(fault.code(), "InvalidParameterException");
    }

    #[test]
    fn missing_endpoint_is_a_config_error() {
        let err = HttpInsightsClient::new(&ClientConfig::default())
            .err()
            .expect("no endpoint");
        assert!(matches!(err, InsightsError::Config(_)));
    }
}
