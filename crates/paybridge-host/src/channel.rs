// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON-lines envelopes exchanged with the hybrid side over stdin/stdout.
//
//   in:   {"id": 1, "method": "initialize", "args": {...}}
//   out:  {"id": 1, "result": ...} | {"id": 1, "error": {"code", "message"}}
//         {"event": "walletReadyChanged", "ready": true}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use paybridge_core::error::{ErrorReply, PayBridgeError, Result};
use paybridge_core::types::BridgeEvent;
use paybridge_native::traits::EventSink;

/// One inbound method call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Call {
    /// Opaque correlation id, echoed back on the reply.
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl Call {
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Everything written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Reply { id: Value, result: Value },
    Failure { id: Value, error: ErrorReply },
    Event(BridgeEvent),
}

impl Outbound {
    pub fn for_call(id: Value, reply: std::result::Result<Value, ErrorReply>) -> Self {
        match reply {
            Ok(result) => Self::Reply { id, result },
            Err(error) => Self::Failure { id, error },
        }
    }

    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Event sink feeding the stdout writer task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: BridgeEvent) -> Result<()> {
        self.tx.send(Outbound::Event(event)).map_err(|_| {
            warn!(event = event.name(), "stdout writer has gone away");
            PayBridgeError::Detached
        })
    }
}
