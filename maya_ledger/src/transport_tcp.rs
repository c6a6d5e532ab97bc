use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ledger_apdu::APDUAnswer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::apdu::{APDUCmdVec, StatusWord};
use crate::client::Transport;
use crate::error::{Error, TransportError};

/// How long the emulator usually takes to accept connections once started
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

const RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Larger answers are not produced by the app, the length prefix is corrupted
const MAX_ANSWER_LEN: u32 = 0x1_0000;

/// Transport to communicate with the speculos emulator.
///
/// Each APDU is sent prefixed by its length as a big endian `u32`, the
/// answer is a big endian `u32` data length, the data and the status word.
#[derive(Debug)]
pub struct TransportTcp {
    addr: SocketAddr,
    connection: Mutex<Option<TcpStream>>,
}

impl TransportTcp {
    /// Connect to `addr`, retrying until `timeout` while the emulator boots
    pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, Error> {
        let start = Instant::now();
        loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    log::debug!("connected to {addr}");
                    return Ok(Self {
                        addr,
                        connection: Mutex::new(Some(stream)),
                    });
                }
                Err(e) if start.elapsed() < timeout => {
                    log::trace!("connecting to {addr}: {e}, retrying");
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
                Err(source) => {
                    return Err(Error::Connection {
                        addr,
                        timeout,
                        source,
                    })
                }
            }
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Drop the connection, later exchanges fail with [`TransportError::Closed`].
    ///
    /// Calling it more than once is harmless.
    pub fn close(&self) {
        match self.connection.try_lock() {
            Ok(mut connection) => {
                if connection.take().is_some() {
                    log::debug!("closed connection to {}", self.addr);
                }
            }
            // the exchange in flight fails once the emulator is stopped
            Err(_) => log::warn!("closing {} while an exchange is in flight", self.addr),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.connection
            .try_lock()
            .map(|c| c.is_none())
            .unwrap_or(false)
    }
}

impl Transport for TransportTcp {
    async fn exchange(&self, command: &APDUCmdVec) -> Result<(StatusWord, Vec<u8>), TransportError> {
        let mut connection = self.connection.lock().await;
        let stream = connection.as_mut().ok_or(TransportError::Closed)?;

        let command_bytes = command.serialize();
        let mut req = vec![0u8; command_bytes.len() + 4];
        req[..4].copy_from_slice(&(command_bytes.len() as u32).to_be_bytes());
        req[4..].copy_from_slice(&command_bytes);
        stream.write_all(&req).await?;

        let mut buff = [0u8; 4];
        stream.read_exact(&mut buff).await?;
        let len = u32::from_be_bytes(buff);
        if len > MAX_ANSWER_LEN {
            return Err(TransportError::InvalidLength(len));
        }

        let mut resp = vec![0u8; len as usize + 2];
        stream.read_exact(&mut resp).await?;
        let answer = APDUAnswer::from_answer(resp).map_err(|_| TransportError::InvalidAnswer)?;
        Ok((StatusWord::from(answer.retcode()), answer.data().to_vec()))
    }
}
