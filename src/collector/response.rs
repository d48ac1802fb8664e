//! Management API JSON 응답 파서
//!
//! 응답 바디를 파싱하고 결과 트리에서 타입별로 값을 조회합니다.

use serde_json::Value;

use crate::error::{CheckError, CheckResult, TransportError};

/// 응답 바디 파싱 - 실패한 operation은 거부
///
/// 모든 JSON 문서를 받아들이며, 최상위 `outcome`이 `"failed"`인 객체는
/// [`CheckError::RemoteRejected`]로 변환됩니다.
pub fn parse_response(body: &str) -> CheckResult<Value> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| TransportError::JsonParse(e.to_string()))?;

    if is_failed_outcome(&payload) {
        return Err(CheckError::RemoteRejected { payload });
    }

    Ok(payload)
}

/// 페이로드가 `"outcome": "failed"`를 보고하는지 확인
pub fn is_failed_outcome(payload: &Value) -> bool {
    payload
        .get("outcome")
        .and_then(Value::as_str)
        .is_some_and(|outcome| outcome == "failed")
}

/// 중첩 객체를 따라 `path` 조회
pub fn field<'a>(root: &'a Value, path: &[&str]) -> CheckResult<&'a Value> {
    path.iter().try_fold(root, |node, key| {
        node.get(*key).ok_or_else(|| CheckError::missing(path.join(".")))
    })
}

/// `path`의 숫자 값
///
/// JSON 문자열로 인코딩된 숫자도 허용합니다.
pub fn number_at(root: &Value, path: &[&str]) -> CheckResult<f64> {
    let value = field(root, path)?;
    as_f64(value).ok_or_else(|| CheckError::missing(path.join(".")))
}

/// `path`의 문자열 값
pub fn text_at(root: &Value, path: &[&str]) -> CheckResult<String> {
    match field(root, path)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(CheckError::missing(path.join("."))),
    }
}

/// JSON 스칼라를 `f64`로 변환
///
/// # Precision Warning
/// 2^53을 넘는 정수는 변환 시 정밀도가 손실됩니다.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i.abs() > (1i64 << 53) {
                    tracing::warn!(
                        value = i,
                        "Large integer may lose precision when converted to f64"
                    );
                }
            }
            n.as_f64()
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
