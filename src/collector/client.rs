//! WildFly management HTTP 클라이언트
//!
//! `/management` 엔드포인트에 단일 요청을 보내고, 인증 정보가 설정된 경우
//! HTTP Digest 챌린지에 응답합니다.

use digest_auth::AuthContext;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::{Position, Url};

use super::response::{is_failed_outcome, parse_response};
use crate::config::EndpointConfig;
use crate::error::{CheckError, CheckResult, TransportError};

/// 관리 요청의 HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    /// 페이로드를 쿼리 파라미터로 전송
    Get,
    /// 페이로드를 JSON 바디로 전송
    Post,
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMethod::Get => write!(f, "GET"),
            FetchMethod::Post => write!(f, "POST"),
        }
    }
}

/// Management API 클라이언트
#[derive(Clone)]
pub struct ManagementClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
    auth: Option<(String, String)>,
}

impl ManagementClient {
    /// 새 클라이언트 생성
    ///
    /// 기본 URL은 `http://{host}:{port}/management`이며, domain 모드에서는
    /// `/host/{node}/server/{instance}`가 뒤에 붙습니다.
    pub fn new(endpoint: &EndpointConfig) -> CheckResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(endpoint.timeout_ms))
            .build()
            .map_err(TransportError::HttpClientInit)?;

        let mut base_url = endpoint.base_url();
        if let Some(prefix) = endpoint.server_prefix() {
            base_url.push_str(&prefix);
        }

        Ok(Self {
            client,
            base_url,
            timeout_ms: endpoint.timeout_ms,
            auth: endpoint
                .credentials()
                .map(|(user, pass)| (user.to_string(), pass.to_string())),
        })
    }

    /// domain 모드 접두사를 포함한 기본 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `path`에 대한 요청 URL 생성
    ///
    /// GET 요청이면 JSON 객체 페이로드의 항목이 쿼리 파라미터가 됩니다.
    pub fn request_url(
        &self,
        path: &str,
        payload: &Value,
        method: FetchMethod,
    ) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        if method == FetchMethod::Get {
            if let Some(params) = payload.as_object().filter(|p| !p.is_empty()) {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in params {
                    match value {
                        Value::String(s) => pairs.append_pair(key, s),
                        other => pairs.append_pair(key, &other.to_string()),
                    };
                }
            }
        }

        Ok(url)
    }

    /// 단일 관리 요청 - 파싱된 JSON 바디 반환
    ///
    /// # Errors
    /// - `Transport`: 네트워크 실패, 타임아웃, 2xx 이외의 상태 코드, JSON이 아닌 바디
    /// - `RemoteRejected`: 바디가 `"outcome": "failed"`를 보고한 경우
    #[instrument(skip(self, payload), fields(base = %self.base_url))]
    pub async fn fetch(
        &self,
        path: &str,
        payload: &Value,
        method: FetchMethod,
    ) -> CheckResult<Value> {
        let url = self.request_url(path, payload, method)?;
        let body = match method {
            FetchMethod::Get => None,
            FetchMethod::Post => Some(
                serde_json::to_vec(payload).map_err(|e| TransportError::JsonParse(e.to_string()))?,
            ),
        };

        debug!(%method, url = %url, "Sending management request");

        let mut response = self.send(&url, method, body.as_deref(), None).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some((username, password)) = &self.auth {
                let authorization =
                    answer_challenge(&response, &url, method, body.as_deref(), username, password)?;
                debug!("Replaying request with digest credentials");
                response = self
                    .send(&url, method, body.as_deref(), Some(authorization))
                    .await?;
            }

            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(TransportError::AuthenticationFailed.into());
            }
        }

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            // 실패한 operation은 JSON 설명과 함께 HTTP 500으로 돌아옴
            if let Ok(payload) = serde_json::from_str::<Value>(&text) {
                if is_failed_outcome(&payload) {
                    return Err(CheckError::RemoteRejected { payload });
                }
            }
            return Err(TransportError::HttpStatus(status.as_u16()).into());
        }

        parse_response(&text)
    }

    async fn send(
        &self,
        url: &Url,
        method: FetchMethod,
        body: Option<&[u8]>,
        authorization: Option<HeaderValue>,
    ) -> Result<Response, TransportError> {
        let mut req = match method {
            FetchMethod::Get => self.client.get(url.clone()),
            FetchMethod::Post => self
                .client
                .post(url.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body.map(<[u8]>::to_vec).unwrap_or_default()),
        };

        if let Some(value) = authorization {
            req = req.header(AUTHORIZATION, value);
        }

        req.send().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::timeout_with_duration(self.timeout_ms)
        } else {
            TransportError::from(err)
        }
    }
}

/// Digest 챌린지에 대한 `Authorization` 헤더 계산
fn answer_challenge(
    response: &Response,
    url: &Url,
    method: FetchMethod,
    body: Option<&[u8]>,
    username: &str,
    password: &str,
) -> Result<HeaderValue, TransportError> {
    let challenge = response
        .headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.trim_start().to_ascii_lowercase().starts_with("digest"))
        .ok_or(TransportError::AuthenticationFailed)?;

    let uri = &url[Position::BeforePath..];
    let context = match method {
        FetchMethod::Get => AuthContext::new(username, password, uri),
        FetchMethod::Post => AuthContext::new_post(username, password, uri, body),
    };

    let mut prompt = digest_auth::parse(challenge)
        .map_err(|e| TransportError::DigestChallenge(e.to_string()))?;
    let answer = prompt
        .respond(&context)
        .map_err(|e| TransportError::DigestChallenge(e.to_string()))?;

    HeaderValue::from_str(&answer.to_header_string())
        .map_err(|e| TransportError::DigestChallenge(e.to_string()))
}
