use std::net::SocketAddr;
use std::time::Duration;

use crate::apdu::StatusWord;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid answer length: {0}")]
    InvalidLength(u32),

    #[error("Invalid answer")]
    InvalidAnswer,

    #[error("Transport is closed")]
    Closed,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Cannot connect to {addr} within {timeout:?}: {source}")]
    Connection {
        addr: SocketAddr,
        timeout: Duration,
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Device error for command 0x{command:02x}: {status}{}", message_suffix(.message))]
    Device {
        command: u8,
        status: StatusWord,
        /// Error message the app appends to some status words
        message: Option<String>,
    },

    #[error("Unexpected result for command 0x{command:02x}, {reason}: {}", hex::encode(.data))]
    UnexpectedResult {
        command: u8,
        reason: &'static str,
        data: Vec<u8>,
    },

    #[error("Device returned an empty signature")]
    NoSignature,

    #[error("Invalid human readable part '{0}'")]
    InvalidHrp(String),

    #[error("Message to sign cannot be empty")]
    EmptyMessage,
}

impl Error {
    /// Status word of a device error
    pub fn status(&self) -> Option<StatusWord> {
        match self {
            Error::Device { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The user refused the request on the device
    pub fn is_user_rejected(&self) -> bool {
        self.status() == Some(StatusWord::TransactionRejected)
    }
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(", {m}"),
        None => String::new(),
    }
}
