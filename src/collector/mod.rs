//! WildFly Management API 수집 모듈
//!
//! HTTP management 인터페이스에서 JSON 문서를 조회합니다.
//!
//! # Example
//!
//! ```ignore
//! use check_wildfly::collector::{FetchMethod, ManagementClient};
//! use check_wildfly::config::EndpointConfig;
//! use serde_json::json;
//!
//! let client = ManagementClient::new(&EndpointConfig::default())?;
//! let memory = client
//!     .fetch(
//!         "/core-service/platform-mbean/type/memory",
//!         &json!({"include-runtime": "true"}),
//!         FetchMethod::Get,
//!     )
//!     .await?;
//! ```

mod client;
mod response;

pub use client::{FetchMethod, ManagementClient};
pub use response::{as_f64, field, is_failed_outcome, number_at, parse_response, text_at};
