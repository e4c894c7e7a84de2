//! Dispatch engine: id allocation, request/response round trip, envelope
//! validation and result decoding.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::try_join_all;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, trace};

use crate::codec::{decode_value, Codec};
use crate::error::{CoreError, FormatError, RpcError};
use crate::model::{from_value, FilterChange, Model, SyncStatus};

use super::protocol::{
    parse_batch_response, parse_envelope, parse_response, parse_response_id, MessageFactory,
    ResponseEnvelope,
};
use super::transport::{HttpResponse, Transport};

// ==============================================================================
// Decoders
// ==============================================================================

/// Turns a raw JSON-RPC `result` into a typed value.
pub trait Decode: Send + Sync {
    type Output: Send;

    fn decode_result(&self, raw: Value) -> Result<Self::Output, CoreError>;
}

/// A scalar result is a single wire string decoded by the codec.
impl<C> Decode for C
where
    C: Codec,
    C::Value: Send,
{
    type Output = C::Value;

    fn decode_result(&self, raw: Value) -> Result<C::Value, CoreError> {
        Ok(decode_value(self, &raw)?)
    }
}

/// Object result built by the model mapper.
pub struct Record<M>(PhantomData<fn() -> M>);

impl<M> Record<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M> Default for Record<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Decode for Record<M> {
    type Output = M;

    fn decode_result(&self, raw: Value) -> Result<M, CoreError> {
        from_value(raw)
    }
}

/// Array result decoded element-wise, preserving order.
pub struct Each<D>(pub D);

impl<D: Decode> Decode for Each<D> {
    type Output = Vec<D::Output>;

    fn decode_result(&self, raw: Value) -> Result<Self::Output, CoreError> {
        match raw {
            Value::Array(items) => items.into_iter().map(|item| self.0.decode_result(item)).collect(),
            other => Err(FormatError::new("array", other.to_string(), "expected a JSON array").into()),
        }
    }
}

/// `null` becomes `None`; anything else goes to the inner decoder.
pub struct Nullable<D>(pub D);

impl<D: Decode> Decode for Nullable<D> {
    type Output = Option<D::Output>;

    fn decode_result(&self, raw: Value) -> Result<Self::Output, CoreError> {
        if raw.is_null() {
            Ok(None)
        } else {
            self.0.decode_result(raw).map(Some)
        }
    }
}

/// No decoding; the raw JSON result.
pub struct Raw;

impl Decode for Raw {
    type Output = Value;

    fn decode_result(&self, raw: Value) -> Result<Value, CoreError> {
        Ok(raw)
    }
}

pub struct BoolDecoder;

impl Decode for BoolDecoder {
    type Output = bool;

    fn decode_result(&self, raw: Value) -> Result<bool, CoreError> {
        raw.as_bool()
            .ok_or_else(|| FormatError::new("bool", raw.to_string(), "expected a JSON boolean").into())
    }
}

/// Free-form text result (client version, network id).
pub struct StringDecoder;

impl Decode for StringDecoder {
    type Output = String;

    fn decode_result(&self, raw: Value) -> Result<String, CoreError> {
        match raw {
            Value::String(s) => Ok(s),
            other => Err(FormatError::new("string", other.to_string(), "expected a JSON string").into()),
        }
    }
}

/// `eth_syncing`: `false` when idle, a progress object while syncing.
pub struct SyncingDecoder;

impl Decode for SyncingDecoder {
    type Output = Option<SyncStatus>;

    fn decode_result(&self, raw: Value) -> Result<Self::Output, CoreError> {
        match raw {
            Value::Bool(false) => Ok(None),
            Value::Object(_) => from_value(raw).map(Some),
            other => Err(FormatError::new(
                SyncStatus::NAME,
                other.to_string(),
                "expected false or a sync status object",
            )
            .into()),
        }
    }
}

/// `eth_getFilterChanges`: hashes or logs depending on the filter kind.
pub struct FilterChangesDecoder;

impl Decode for FilterChangesDecoder {
    type Output = Vec<FilterChange>;

    fn decode_result(&self, raw: Value) -> Result<Self::Output, CoreError> {
        match raw {
            Value::Array(items) => items.into_iter().map(FilterChange::from_value).collect(),
            other => Err(FormatError::new("filter changes", other.to_string(), "expected a JSON array").into()),
        }
    }
}

// ==============================================================================
// Dispatcher
// ==============================================================================

/// JSON-RPC caller for one endpoint over a [`Transport`].
///
/// Request ids come from a single counter seeded from the clock, so ids
/// stay unique across concurrent calls and across process restarts.
pub struct Dispatcher<T> {
    factory: MessageFactory,
    transport: T,
    next_id: AtomicU64,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(url: Url, transport: T) -> Self {
        Self::with_start_id(url, transport, initial_request_id())
    }

    pub fn with_start_id(url: Url, transport: T, start_id: u64) -> Self {
        Self {
            factory: MessageFactory::new(url),
            transport,
            next_id: AtomicU64::new(start_id),
        }
    }

    pub fn url(&self) -> &Url {
        self.factory.url()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Atomically reserve `count` consecutive request ids.
    fn reserve_request_ids(&self, count: u64) -> u64 {
        self.next_id.fetch_add(count, Ordering::Relaxed)
    }

    /// Call `method` and decode its result with `decoder`.
    pub async fn call<D: Decode>(
        &self,
        method: &str,
        params: Vec<Value>,
        decoder: D,
    ) -> Result<D::Output, CoreError> {
        let raw = self.call_raw(method, params).await?;
        decoder.decode_result(raw)
    }

    /// Call `method` and return its undecoded result.
    pub async fn call_raw(&self, method: &str, params: Vec<Value>) -> Result<Value, CoreError> {
        let id = self.reserve_request_ids(1);
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );
        let request = self.factory.make_request(method, id, &params);

        let response = self.transport.send(request).await?;
        debug!(
            rpc.id = id,
            rpc.method = method,
            status = response.status,
            body_len = response.body.len(),
            "rpc response"
        );
        trace!(rpc.id = id, rpc.method = method, body = %response.body, "rpc response body");

        let envelope = read_envelope(response)?;
        check_response_id(id, &envelope)?;
        Ok(envelope.into_result()?)
    }

    /// Send all `calls` as one JSON-RPC batch and return their raw results
    /// in request order. The first error item fails the whole batch.
    pub async fn call_batch(&self, calls: &[(String, Vec<Value>)]) -> Result<Vec<Value>, CoreError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let start_id = self.reserve_request_ids(calls.len() as u64);
        debug!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            "rpc batch call"
        );
        let request = self.factory.make_batch_request(calls, start_id);

        let response = self.transport.send(request).await?;
        debug!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            status = response.status,
            body_len = response.body.len(),
            "rpc batch response"
        );
        trace!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            body = %response.body,
            "rpc batch response body"
        );

        let envelopes = read_batch_envelopes(response)?;
        let mut by_id: HashMap<u64, ResponseEnvelope> = HashMap::with_capacity(envelopes.len());
        for envelope in envelopes {
            if envelope.id.is_null() {
                // Batch-level rejection carries no id.
                envelope.into_result()?;
                continue;
            }
            let id = parse_response_id(&envelope.id)?;
            by_id.insert(id, envelope);
        }

        let mut ordered = Vec::with_capacity(calls.len());
        for id in start_id..(start_id + calls.len() as u64) {
            let envelope = by_id.remove(&id).ok_or(RpcError::MissingBatchItem { id })?;
            ordered.push(envelope.into_result()?);
        }

        Ok(ordered)
    }

    /// Like [`call_batch`](Self::call_batch), split into batches of at most
    /// `chunk_size` calls that are sent concurrently.
    pub async fn call_batch_chunked(
        &self,
        calls: &[(String, Vec<Value>)],
        chunk_size: usize,
    ) -> Result<Vec<Value>, CoreError> {
        if chunk_size == 0 {
            return Err(CoreError::Config("rpc batch chunk size must be at least 1".to_owned()));
        }
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_futures: Vec<_> = calls
            .chunks(chunk_size)
            .map(|chunk| self.call_batch(chunk))
            .collect();
        let chunked = try_join_all(chunk_futures).await?;
        Ok(chunked.into_iter().flatten().collect())
    }
}

/// Largest integer a JSON number survives exactly when the peer reads it
/// as an IEEE-754 double.
const MAX_EXACT_JSON_ID: u64 = (1 << 53) - 1;

/// Millisecond clock seed; stays below [`MAX_EXACT_JSON_ID`] for millennia.
fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_millis() as u64).min(MAX_EXACT_JSON_ID))
        .unwrap_or(1)
}

/// Parse the envelope; a failed status with a non-envelope body is an
/// HTTP error.
fn read_envelope(response: HttpResponse) -> Result<ResponseEnvelope, RpcError> {
    match parse_response(&response.body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !response.is_success() => Err(RpcError::HttpStatus {
            status: response.status,
            body: response.body,
        }),
        Err(err) => Err(err),
    }
}

fn read_batch_envelopes(response: HttpResponse) -> Result<Vec<ResponseEnvelope>, RpcError> {
    match parse_batch_response(&response.body) {
        Ok(envelopes) => Ok(envelopes),
        Err(_) if !response.is_success() => Err(RpcError::HttpStatus {
            status: response.status,
            body: response.body,
        }),
        Err(err) => Err(err),
    }
}

/// The echoed id must equal the request id. Error envelopes may carry a
/// `null` id when the server could not read the request id.
fn check_response_id(expected: u64, envelope: &ResponseEnvelope) -> Result<(), RpcError> {
    if envelope.is_error() && envelope.id.is_null() {
        return Ok(());
    }
    match parse_response_id(&envelope.id) {
        Ok(actual) if actual == expected => Ok(()),
        _ => Err(RpcError::IdMismatch {
            expected,
            actual: envelope.id.clone(),
        }),
    }
}

/// Interpret an already-decoded response value, for callers that receive
/// envelopes through another channel.
pub fn decode_envelope<D: Decode>(value: Value, decoder: &D) -> Result<D::Output, CoreError> {
    let raw = parse_envelope(value)?.into_result()?;
    decoder.decode_result(raw)
}
