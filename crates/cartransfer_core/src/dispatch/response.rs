//! Invocation response envelope.

use super::DispatchError;
use uuid::Uuid;

/// Peer-style status code of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok = 200,
    Error = 500,
}

impl Status {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Result of one invocation as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    /// Human-readable failure message; empty on success.
    pub message: String,
    /// Stable failure code; `None` on success.
    pub error_code: Option<&'static str>,
    /// Success payload (JSON or empty).
    pub payload: Vec<u8>,
    /// Identifier assigned to the invocation.
    pub tx_id: Uuid,
}

impl Response {
    pub fn success(tx_id: Uuid, payload: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            message: String::new(),
            error_code: None,
            payload,
            tx_id,
        }
    }

    pub fn failure(tx_id: Uuid, err: &DispatchError) -> Self {
        Self {
            status: Status::Error,
            message: err.to_string(),
            error_code: Some(err.error_code()),
            payload: Vec::new(),
            tx_id,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Payload as UTF-8 text, lossy.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
