use maya_common::Bip44Path;

use crate::apdu::{APDUCmdVec, StatusWord};
use crate::command::Request;
use crate::error::{Error, TransportError};
use crate::response::{AddressInfo, SignatureInfo, VersionInfo};
use crate::Result;

/// Client of the MAYAChain app
#[derive(Debug)]
pub struct MayaApp<T: Transport> {
    transport: T,
}

impl<T: Transport> MayaApp<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Exchange the APDUs of `request` in order, stopping at the first
    /// non-success status word. Returns the data of the last answer.
    pub async fn make_request(&self, request: &Request) -> Result<Vec<u8>> {
        let apdus = request.apdus()?;
        let count = apdus.len();
        let mut data = vec![];
        for (i, apdu) in apdus.iter().enumerate() {
            log::debug!(
                "--> {request} [{}/{count}] {}",
                i + 1,
                hex::encode(apdu.serialize())
            );
            if request.is_interactive() && i + 1 == count {
                log::info!("{request}: waiting for the user on the device");
            }
            let (status, answer) = self.transport.exchange(apdu).await?;
            log::debug!("<-- {status} {}", hex::encode(&answer));

            if status != StatusWord::OK {
                return Err(Error::Device {
                    command: apdu.ins,
                    status,
                    message: device_message(&answer),
                });
            }
            data = answer;
        }
        Ok(data)
    }

    /// Version of the app and the device state
    pub async fn get_version(&self) -> Result<VersionInfo> {
        let data = self.make_request(&Request::GetVersion).await?;
        VersionInfo::decode(&data)
    }

    /// Public key and address at `path`, if `confirm` the user must approve the address on the device
    pub async fn get_address_and_pubkey(
        &self,
        path: &Bip44Path,
        hrp: &str,
        confirm: bool,
    ) -> Result<AddressInfo> {
        let request = Request::GetAddress {
            path: *path,
            hrp: hrp.to_string(),
            display: confirm,
        };
        let data = self.make_request(&request).await?;
        AddressInfo::decode(&data)
    }

    pub async fn show_address_and_pubkey(&self, path: &Bip44Path, hrp: &str) -> Result<AddressInfo> {
        self.get_address_and_pubkey(path, hrp, true).await
    }

    /// Sign the JSON sign doc `tx`, sent in chunks, with the key at `path`
    pub async fn sign(&self, path: &Bip44Path, tx: &[u8]) -> Result<SignatureInfo> {
        let request = Request::Sign {
            path: *path,
            tx: tx.to_vec(),
        };
        let data = self.make_request(&request).await?;
        SignatureInfo::decode(data)
    }
}

/// Error message the app sends along some failures, e.g. the reason a sign doc is refused
fn device_message(data: &[u8]) -> Option<String> {
    let message = std::str::from_utf8(data).ok()?.trim_end_matches('\0').trim();
    if message.is_empty() || message.chars().any(|c| c.is_control()) {
        None
    } else {
        Some(message.to_string())
    }
}

/// Asynchronous communication layer between the client and the device.
pub trait Transport {
    fn exchange(
        &self,
        command: &APDUCmdVec,
    ) -> impl std::future::Future<Output = std::result::Result<(StatusWord, Vec<u8>), TransportError>>
           + Send;
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    use maya_test_util::{MAYA_ADDRESS, MAYA_HRP, TEST_PATH};

    use super::*;

    /// Replies with scripted answers and records the serialized commands
    #[derive(Default)]
    struct MockTransport {
        replies: Mutex<VecDeque<(u16, Vec<u8>)>>,
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl MockTransport {
        fn new(replies: Vec<(u16, Vec<u8>)>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }

        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn exchange(
            &self,
            command: &APDUCmdVec,
        ) -> impl Future<Output = std::result::Result<(StatusWord, Vec<u8>), TransportError>> + Send
        {
            self.sent.lock().unwrap().push(command.serialize());
            let reply = self.replies.lock().unwrap().pop_front();
            async move {
                let (sw, data) = reply.ok_or(TransportError::Closed)?;
                Ok((StatusWord::from(sw), data))
            }
        }
    }

    fn path() -> Bip44Path {
        Bip44Path::new(TEST_PATH).unwrap()
    }

    fn address_answer() -> Vec<u8> {
        let mut data = vec![0x02];
        data.extend([0x42; 32]);
        data.extend(MAYA_ADDRESS.as_bytes());
        data
    }

    #[tokio::test]
    async fn get_version() {
        let app = MayaApp::new(MockTransport::new(vec![(0x9000, vec![0, 1, 2, 3])]));
        let version = app.get_version().await.unwrap();
        assert_eq!(version.to_string(), "1.2.3");
        assert!(!version.test_mode);
        assert_eq!(app.transport().sent(), [vec![0x55, 0x00, 0x00, 0x00, 0x00]]);
    }

    #[tokio::test]
    async fn app_not_open() {
        let app = MayaApp::new(MockTransport::new(vec![(0x6e00, vec![])]));
        let err = app.get_version().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Device {
                command: 0x00,
                status: StatusWord::ClaNotSupported,
                message: None
            }
        ));
    }

    #[tokio::test]
    async fn get_address() {
        let app = MayaApp::new(MockTransport::new(vec![
            (0x9000, address_answer()),
            (0x9000, address_answer()),
        ]));
        let info = app
            .get_address_and_pubkey(&path(), MAYA_HRP, false)
            .await
            .unwrap();
        assert_eq!(info.bech32_address, MAYA_ADDRESS);
        assert_eq!(info.compressed_pk[0], 0x02);

        app.show_address_and_pubkey(&path(), MAYA_HRP).await.unwrap();
        let sent = app.transport().sent();
        assert_eq!(sent[0][..5], [0x55, 0x04, 0x00, 0x00, 25]);
        assert_eq!(sent[1][..5], [0x55, 0x04, 0x01, 0x00, 25]);
    }

    #[tokio::test]
    async fn get_address_short_answer() {
        let app = MayaApp::new(MockTransport::new(vec![(0x9000, vec![0x02; 20])]));
        let err = app
            .get_address_and_pubkey(&path(), MAYA_HRP, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedResult { command: 0x04, .. }));
    }

    #[tokio::test]
    async fn sign_in_chunks() {
        let tx = vec![b'x'; 600];
        let der = vec![0x30, 0x44, 0x02, 0x20];
        let app = MayaApp::new(MockTransport::new(vec![
            (0x9000, vec![]),
            (0x9000, vec![]),
            (0x9000, vec![]),
            (0x9000, der.clone()),
        ]));
        let sig = app.sign(&path(), &tx).await.unwrap();
        assert_eq!(sig.signature, der);

        let sent = app.transport().sent();
        assert_eq!(sent.len(), 4);
        let p1: Vec<u8> = sent.iter().map(|s| s[2]).collect();
        assert_eq!(p1, [0, 1, 1, 2]);
        let lc: Vec<u8> = sent.iter().map(|s| s[4]).collect();
        assert_eq!(lc, [20, 250, 250, 100]);
        assert!(sent.iter().all(|s| s[..2] == [0x55, 0x02]));
    }

    #[tokio::test]
    async fn sign_rejected() {
        let app = MayaApp::new(MockTransport::new(vec![
            (0x9000, vec![]),
            (0x6986, vec![]),
        ]));
        let err = app.sign(&path(), b"{}").await.unwrap_err();
        assert!(err.is_user_rejected());
    }

    #[tokio::test]
    async fn sign_stops_at_first_error() {
        let app = MayaApp::new(MockTransport::new(vec![
            (0x9000, vec![]),
            (0x6984, b"JSON Missing chain_id".to_vec()),
        ]));
        let err = app.sign(&path(), &[b'x'; 300]).await.unwrap_err();
        match err {
            Error::Device {
                command,
                status,
                message,
            } => {
                assert_eq!(command, 0x02);
                assert_eq!(status, StatusWord::DataIsInvalid);
                assert_eq!(message.as_deref(), Some("JSON Missing chain_id"));
            }
            e => panic!("unexpected {e:?}"),
        }
        assert_eq!(app.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn sign_empty() {
        let app = MayaApp::new(MockTransport::default());
        let err = app.sign(&path(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::EmptyMessage));
        assert!(app.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn transport_failure() {
        let app = MayaApp::new(MockTransport::default());
        let err = app.get_version().await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Closed)));
    }
}
