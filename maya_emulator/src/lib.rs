#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Drive the speculos emulator running the MAYAChain app.
//!
//! An [`EmulatorSession`] owns the emulator container together with the
//! clients of its APDU port and automation API. A [`Scenario`] adds the
//! lifecycle of a conformance test on top of it: interactive commands are
//! issued in the background with [`Scenario::issue`], the flow shown on the
//! device is reviewed and approved (or rejected) and only then the command
//! result is available.
//!
//! ```no_run
//! # async fn sign() -> Result<(), maya_emulator::Error> {
//! use maya_common::{verify_signature, Bip44Path};
//! use maya_containers::{testcontainers::clients::Cli, NANOS};
//! use maya_emulator::{Scenario, StartOptions};
//!
//! let docker = Cli::default();
//! let mut scenario = Scenario::start(&docker, NANOS, StartOptions::from_env()).await?;
//! let path = Bip44Path::new([44, 931, 0, 0, 0]).expect("path");
//! let tx = br#"{"account_number":"0","chain_id":"mayachain","fee":{},"msgs":[],"sequence":"0"}"#;
//!
//! let address = scenario.app().get_address_and_pubkey(&path, "maya", false).await?;
//! let pending = scenario.issue(move |app| async move { app.sign(&path, tx).await })?;
//! let signature = scenario.approve(pending, "sign_example").await??;
//! assert!(verify_signature(&signature.signature, tx, &address.compressed_pk).expect("der"));
//! # Ok(())
//! # }
//! ```

mod api;
mod consts;
mod error;
mod navigation;
mod scenario;
mod session;
mod snapshot;

pub use api::{Button, ScreenEvent, SpeculosApi};
pub use consts::*;
pub use error::Error;
pub use navigation::{schedule_steps, touch_layout, ApproveAction, NavStep, TouchLayout};
pub use scenario::{PendingResponse, Scenario, ScenarioBody, ScenarioState};
pub use session::{EmulatorSession, StartOptions};
pub use snapshot::{Snapshot, SnapshotStore};

pub type Result<T> = std::result::Result<T, Error>;
