//! Line-delimited JSON-RPC tool server over stdio.
//!
//! Requests are read one per line. `tools/call` runs on its own thread so a
//! slow agent never blocks `ping` or a cancellation; every response goes
//! through one locked writer so lines never interleave.

pub mod protocol;
pub mod tools;


use crate::agent::CancelToken;
use crate::bridge::Bridge;
use protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, Request,
    Response, request_key,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tools::ToolCallError;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "nexus-bridge";

type SharedWriter<W> = Arc<Mutex<W>>;
type InFlight = Arc<Mutex<HashMap<String, CancelToken>>>;

fn send<W: Write>(writer: &Mutex<W>, response: &Response) -> io::Result<()> {
    let line = serde_json::to_string(response).map_err(io::Error::other)?;
    let mut out = writer
        .lock()
        .map_err(|_| io::Error::other("response writer poisoned"))?;
    writeln!(out, "{}", line)?;
    out.flush()
}

/// Serve requests from `input` until EOF.
///
/// On EOF every in-flight call is cancelled and joined before returning, so
/// no agent process outlives the server.
pub fn serve<R, W>(bridge: Arc<Bridge>, input: R, output: W) -> io::Result<()>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let writer: SharedWriter<W> = Arc::new(Mutex::new(output));
    let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    tracing::info!("tool server listening on stdio");

    let result = read_loop(&bridge, input, &writer, &in_flight, &mut workers);

    let pending = in_flight.lock().map(|map| map.len()).unwrap_or(0);
    if pending > 0 {
        tracing::info!(pending, "input closed, cancelling in-flight calls");
    }
    if let Ok(map) = in_flight.lock() {
        for token in map.values() {
            token.cancel();
        }
    }
    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("tool call thread panicked");
        }
    }

    result
}

fn read_loop<R, W>(
    bridge: &Arc<Bridge>,
    input: R,
    writer: &SharedWriter<W>,
    in_flight: &InFlight,
    workers: &mut Vec<JoinHandle<()>>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        workers.retain(|worker| !worker.is_finished());

        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("unparseable message: {}", e);
                send(
                    writer,
                    &Response::failure(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)),
                )?;
                continue;
            }
        };

        let request: Request = match serde_json::from_value(message.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = message.get("id").cloned().unwrap_or(Value::Null);
                send(
                    writer,
                    &Response::failure(id, INVALID_REQUEST, format!("Invalid request: {}", e)),
                )?;
                continue;
            }
        };

        tracing::debug!(method = %request.method, id = ?request.id, "request");

        let Some(id) = request.id.clone() else {
            handle_notification(&request, in_flight);
            continue;
        };

        if request.method == "tools/call" {
            // Only this loop registers calls, so the check cannot race an insert
            if is_in_flight(in_flight, &id) {
                tracing::warn!(request = %request_key(&id), "duplicate in-flight request id");
                send(
                    writer,
                    &Response::failure(
                        id.clone(),
                        INVALID_REQUEST,
                        format!("Request id {} is already in use", request_key(&id)),
                    ),
                )?;
                continue;
            }
            match spawn_tool_call(bridge, id.clone(), request.params, writer, in_flight) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    tracing::error!("failed to start tool call thread: {}", e);
                    send(
                        writer,
                        &Response::failure(id, INTERNAL_ERROR, format!("Internal error: {}", e)),
                    )?;
                }
            }
        } else {
            send(writer, &handle_request(id, &request.method))?;
        }
    }
    Ok(())
}

fn is_in_flight(in_flight: &InFlight, id: &Value) -> bool {
    in_flight
        .lock()
        .map(|map| map.contains_key(&request_key(id)))
        .unwrap_or(false)
}

fn handle_notification(request: &Request, in_flight: &InFlight) {
    match request.method.as_str() {
        "notifications/cancelled" => {
            let Some(target) = request.params.get("requestId") else {
                tracing::warn!("cancellation without requestId");
                return;
            };
            let key = request_key(target);
            let token = in_flight
                .lock()
                .ok()
                .and_then(|map| map.get(&key).cloned());
            match token {
                Some(token) => {
                    tracing::info!(request = %key, "cancelling tool call");
                    token.cancel();
                }
                None => tracing::debug!(request = %key, "cancellation for unknown request"),
            }
        }
        "notifications/initialized" => {}
        other => tracing::debug!(method = other, "ignoring notification"),
    }
}

fn handle_request(id: Value, method: &str) -> Response {
    match method {
        "initialize" => Response::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "ping" => Response::success(id, json!({})),
        "tools/list" => Response::success(id, json!({"tools": tools::definitions()})),
        other => Response::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
    }
}

fn spawn_tool_call<W>(
    bridge: &Arc<Bridge>,
    id: Value,
    params: Value,
    writer: &SharedWriter<W>,
    in_flight: &InFlight,
) -> io::Result<JoinHandle<()>>
where
    W: Write + Send + 'static,
{
    let key = request_key(&id);
    let cancel = CancelToken::new();
    if let Ok(mut map) = in_flight.lock() {
        map.insert(key.clone(), cancel.clone());
    }

    let bridge = Arc::clone(bridge);
    let writer = Arc::clone(writer);
    let registered = Arc::clone(in_flight);
    let thread_key = key.clone();

    let spawned = thread::Builder::new()
        .name(format!("tools-call-{}", key))
        .spawn(move || {
            let response = run_tool_call(&bridge, id, params, &cancel);
            if let Ok(mut map) = registered.lock() {
                map.remove(&thread_key);
            }
            if let Err(e) = send(&writer, &response) {
                tracing::warn!(request = %thread_key, "failed to write response: {}", e);
            }
        });

    if spawned.is_err()
        && let Ok(mut map) = in_flight.lock()
    {
        map.remove(&key);
    }
    spawned
}

fn run_tool_call(bridge: &Bridge, id: Value, params: Value, cancel: &CancelToken) -> Response {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Response::failure(id, INVALID_PARAMS, "tools/call requires a tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match tools::call(bridge, name, arguments, cancel) {
        Ok(result) => Response::success(id, result),
        Err(e @ (ToolCallError::UnknownTool(_) | ToolCallError::InvalidArguments { .. })) => {
            Response::failure(id, INVALID_PARAMS, e.to_string())
        }
    }
}
