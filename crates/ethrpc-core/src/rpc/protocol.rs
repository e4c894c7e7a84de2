//! JSON-RPC 2.0 envelopes: building outbound requests and interpreting
//! inbound responses. Nothing here performs I/O.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde_json::{json, Map, Value};

use crate::error::{ErrorObject, RpcError};

use super::transport::HttpRequest;

pub const JSONRPC_VERSION: &str = "2.0";

/// Builds POST requests carrying JSON-RPC envelopes for one endpoint.
#[derive(Debug, Clone)]
pub struct MessageFactory {
    url: Url,
}

impl MessageFactory {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn make_request(&self, method: &str, id: u64, params: &[Value]) -> HttpRequest {
        self.post(envelope(method, id, params))
    }

    /// One batch array; element `i` carries id `start_id + i`.
    pub fn make_batch_request(&self, calls: &[(String, Vec<Value>)], start_id: u64) -> HttpRequest {
        let batch = calls
            .iter()
            .enumerate()
            .map(|(offset, (method, params))| envelope(method, start_id + offset as u64, params))
            .collect();
        self.post(Value::Array(batch))
    }

    fn post(&self, body: Value) -> HttpRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        HttpRequest {
            method: Method::POST,
            url: self.url.clone(),
            headers,
            body: body.to_string().into_bytes(),
        }
    }
}

fn envelope(method: &str, id: u64, params: &[Value]) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "id": id,
        "params": params,
    })
}

// ==============================================================================
// Responses
// ==============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Error(ErrorObject),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub version: Option<String>,
    pub id: Value,
    pub outcome: Outcome,
}

impl ResponseEnvelope {
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(obj) => Err(RpcError::Node(obj)),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

/// Parse a single response body.
pub fn parse_response(body: &str) -> Result<ResponseEnvelope, RpcError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        RpcError::MalformedResponse(format!("decode JSON-RPC response: {e}; body={body}"))
    })?;
    parse_envelope(value)
}

/// Parse a batch response body into its envelopes, in wire order.
pub fn parse_batch_response(body: &str) -> Result<Vec<ResponseEnvelope>, RpcError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        RpcError::MalformedResponse(format!("decode JSON-RPC batch response: {e}; body={body}"))
    })?;
    match value {
        Value::Array(items) => items.into_iter().map(parse_envelope).collect(),
        // A node that rejects the whole batch answers with one envelope.
        Value::Object(_) => Ok(vec![parse_envelope(value)?]),
        other => Err(RpcError::MalformedResponse(format!(
            "expected a JSON-RPC batch array, got {other}"
        ))),
    }
}

/// Interpret one decoded envelope.
///
/// A non-null `error` wins over `result`. Otherwise the `result` key must
/// be present; its value may legitimately be `null`.
pub fn parse_envelope(value: Value) -> Result<ResponseEnvelope, RpcError> {
    let mut obj: Map<String, Value> = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(RpcError::MalformedResponse(format!(
                "expected a JSON-RPC response object, got {other}"
            )))
        }
    };

    let version = obj
        .remove("jsonrpc")
        .and_then(|v| v.as_str().map(str::to_owned));
    let id = obj.remove("id").unwrap_or(Value::Null);

    let outcome = match obj.remove("error") {
        Some(Value::Null) | None => match obj.remove("result") {
            Some(result) => Outcome::Result(result),
            None => {
                return Err(RpcError::MalformedResponse(format!(
                    "response id {id} has neither result nor error"
                )))
            }
        },
        Some(err) => {
            let parsed = serde_json::from_value::<ErrorObject>(err.clone()).map_err(|e| {
                RpcError::MalformedResponse(format!("non-standard JSON-RPC error {err}: {e}"))
            })?;
            Outcome::Error(parsed)
        }
    };

    Ok(ResponseEnvelope {
        version,
        id,
        outcome,
    })
}

/// Numeric value of a response id; some servers echo ids as strings.
pub(crate) fn parse_response_id(id: &Value) -> Result<u64, RpcError> {
    if let Some(n) = id.as_u64() {
        return Ok(n);
    }

    if let Some(s) = id.as_str() {
        return s.parse::<u64>().map_err(|e| {
            RpcError::MalformedResponse(format!("invalid response id string {s:?}: {e}"))
        });
    }

    Err(RpcError::MalformedResponse(format!(
        "invalid response id: {id}"
    )))
}
