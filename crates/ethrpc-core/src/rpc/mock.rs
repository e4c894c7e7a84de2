use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::RpcError;

use super::transport::{HttpRequest, HttpResponse, Transport};

type Responder = Box<dyn Fn(u64) -> (u16, String) + Send + Sync>;

/// A canned JSON-RPC node for testing. Answers by method name, echoes the
/// request id, and records every request body it receives.
///
/// Batches are answered in reverse order so callers must match by id.
pub struct MockTransport {
    responders: HashMap<String, Responder>,
    requests: Mutex<Vec<Value>>,
    sends: AtomicUsize,
}

impl MockTransport {
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder {
            responders: HashMap::new(),
        }
    }

    /// Request envelopes seen so far; batch members are flattened.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("mock request log poisoned").clone()
    }

    /// Number of HTTP round trips; a batch counts once.
    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    fn answer(&self, request: &Value) -> (u16, String) {
        let id = request["id"].as_u64().unwrap_or_default();
        let method = request["method"].as_str().unwrap_or_default();
        match self.responders.get(method) {
            Some(responder) => responder(id),
            None => (
                200,
                error_body(id, -32601, &format!("the method {method} does not exist")),
            ),
        }
    }
}

fn error_body(id: u64, code: i64, message: &str) -> String {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}).to_string()
}

pub struct MockTransportBuilder {
    responders: HashMap<String, Responder>,
}

impl MockTransportBuilder {
    pub fn with_result(self, method: &str, result: Value) -> Self {
        self.with_body(method, move |id| {
            json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string()
        })
    }

    pub fn with_error(self, method: &str, code: i64, message: &str) -> Self {
        let message = message.to_owned();
        self.with_body(method, move |id| error_body(id, code, &message))
    }

    /// Answer with an arbitrary body built from the request id.
    pub fn with_body<F>(mut self, method: &str, body: F) -> Self
    where
        F: Fn(u64) -> String + Send + Sync + 'static,
    {
        self.responders
            .insert(method.to_owned(), Box::new(move |id| (200, body(id))));
        self
    }

    /// Answer with a non-envelope body and HTTP `status`.
    pub fn with_status(mut self, method: &str, status: u16, body: &str) -> Self {
        let body = body.to_owned();
        self.responders
            .insert(method.to_owned(), Box::new(move |_| (status, body.clone())));
        self
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            responders: self.responders,
            requests: Mutex::new(Vec::new()),
            sends: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RpcError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let body: Value = serde_json::from_slice(&request.body)
            .map_err(|e| RpcError::MalformedResponse(format!("mock got non-JSON request: {e}")))?;

        match body {
            Value::Array(items) => {
                self.requests
                    .lock()
                    .expect("mock request log poisoned")
                    .extend(items.iter().cloned());
                let mut answers = Vec::with_capacity(items.len());
                for item in items.iter().rev() {
                    let (_, text) = self.answer(item);
                    let answer: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
                    answers.push(answer);
                }
                Ok(HttpResponse {
                    status: 200,
                    body: Value::Array(answers).to_string(),
                })
            }
            single => {
                let (status, text) = self.answer(&single);
                self.requests
                    .lock()
                    .expect("mock request log poisoned")
                    .push(single);
                Ok(HttpResponse { status, body: text })
            }
        }
    }
}
