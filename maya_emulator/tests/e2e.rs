//! Scenarios against the emulator, one test per device model.
//!
//! They need docker and the app binaries, see `APP_PATH_*`; a model without
//! its binary is skipped. Each scenario is bounded by the scenario timeout.

use std::sync::Arc;

use maya_common::{sign_doc, verify_address, verify_signature, Bip44Path};
use maya_containers::testcontainers::clients::Cli;
use maya_containers::{DeviceModel, STAX};
use maya_emulator::{ApproveAction, Scenario, ScenarioState, StartOptions};
use maya_ledger::{MayaApp, StatusWord, TransportTcp};
use maya_test_util::{
    init_logging, skip_unless, MAYA_ADDRESS, MAYA_HRP, TEST_PATH, TX_MSG_DEPOSIT, TX_MSG_SEND,
};
use tokio::time::timeout;

fn available(model: &DeviceModel) -> bool {
    init_logging();
    let reason = format!("no {model} app at {}", model.path().display());
    !skip_unless(model.is_available(), &reason)
}

fn path() -> Bip44Path {
    Bip44Path::new(TEST_PATH).unwrap()
}

async fn start_stop(model: DeviceModel) {
    let docker = Cli::default();
    let options = StartOptions::from_env();
    let after = options.scenario_timeout();
    let mut scenario = timeout(after, Scenario::start(&docker, model, options))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(scenario.state(), ScenarioState::Ready);
    assert!(!scenario.session().main_menu().is_empty());

    scenario.close();
    assert_eq!(scenario.state(), ScenarioState::Closed);
    assert!(scenario.session().is_closed());
    scenario.close();
}

async fn main_menu(model: DeviceModel) {
    let docker = Cli::default();
    Scenario::run(&docker, model, StartOptions::from_env(), |scenario| {
        Box::pin(async move {
            scenario
                .session()
                .navigate_and_compare_snapshots("mainmenu", &[1, 0, 0, 4, -5])
                .await
        })
    })
    .await
    .unwrap();
}

async fn get_app_version(model: DeviceModel) {
    let docker = Cli::default();
    let version = Scenario::run(&docker, model, StartOptions::from_env(), |scenario| {
        Box::pin(async move {
            let version = scenario
                .call(|app| async move { app.get_version().await })
                .await??;
            assert_eq!(scenario.state(), ScenarioState::Verifying);
            Ok(version)
        })
    })
    .await
    .unwrap();
    log::info!("{model} app version {version} {version:?}");
    assert_eq!(version.device_locked, version.target_id.map(|_| false));
}

async fn get_address(model: DeviceModel) {
    let docker = Cli::default();
    Scenario::run(&docker, model, StartOptions::from_env(), |scenario| {
        Box::pin(async move {
            let get = |app: Arc<MayaApp<TransportTcp>>| async move {
                app.get_address_and_pubkey(&path(), MAYA_HRP, false).await
            };
            let first = scenario.call(get).await??;
            assert_eq!(first.bech32_address, MAYA_ADDRESS);
            assert_eq!(first.compressed_pk.len(), 33);
            assert!(verify_address(&first.bech32_address, MAYA_HRP, &first.compressed_pk).unwrap());

            let second = scenario.call(get).await??;
            assert_eq!(first, second);
            Ok(())
        })
    })
    .await
    .unwrap();
}

async fn show_address(model: DeviceModel) {
    let docker = Cli::default();
    let mut options = StartOptions::from_env().with_approve_action(ApproveAction::ApproveTapButton);
    if model == STAX {
        options = options.with_approve_keyword("QR");
    }
    Scenario::run(&docker, model, options, |scenario| {
        Box::pin(async move {
            let pending = scenario
                .issue(|app| async move { app.show_address_and_pubkey(&path(), MAYA_HRP).await })?;
            let address = scenario.approve(pending, "show_address").await??;
            assert_eq!(scenario.state(), ScenarioState::Verifying);
            assert_eq!(address.bech32_address, MAYA_ADDRESS);
            Ok(())
        })
    })
    .await
    .unwrap();
}

async fn sign(model: DeviceModel, case: &'static str, tx: &'static str, expert: bool) {
    sign_doc::validate(tx.as_bytes()).unwrap();

    let docker = Cli::default();
    Scenario::run(&docker, model, StartOptions::from_env(), |scenario| {
        Box::pin(async move {
            if expert {
                scenario.session_mut().toggle_expert_mode().await?;
            }
            let address = scenario
                .call(|app| async move { app.get_address_and_pubkey(&path(), MAYA_HRP, false).await })
                .await??;

            let pending = scenario.issue(move |app| async move { app.sign(&path(), tx.as_bytes()).await })?;
            let signature = scenario.approve(pending, case).await??;

            let ok = verify_signature(&signature.signature, tx.as_bytes(), &address.compressed_pk).unwrap();
            assert!(ok, "{model} signature does not verify");
            Ok(())
        })
    })
    .await
    .unwrap();
}

async fn reject_msg_send(model: DeviceModel) {
    let docker = Cli::default();
    let err = Scenario::run(&docker, model, StartOptions::from_env(), |scenario| {
        Box::pin(async move {
            let pending = scenario
                .issue(|app| async move { app.sign(&path(), TX_MSG_SEND.as_bytes()).await })?;
            let rejected = scenario.reject(pending, "reject_MsgSend").await?;
            assert_eq!(scenario.state(), ScenarioState::Verifying);
            Ok(rejected)
        })
    })
    .await
    .unwrap()
    .unwrap_err();
    assert!(err.is_user_rejected(), "{err}");
    assert_eq!(err.status(), Some(StatusWord::TransactionRejected));
}

macro_rules! device_tests {
    ($($name:ident => $model:ident),* $(,)?) => {
        $(
            mod $name {
                use maya_containers::$model;

                #[tokio::test]
                async fn start_stop() {
                    if super::available(&$model) {
                        super::start_stop($model).await
                    }
                }

                #[tokio::test]
                async fn main_menu() {
                    if super::available(&$model) {
                        super::main_menu($model).await
                    }
                }

                #[tokio::test]
                async fn get_app_version() {
                    if super::available(&$model) {
                        super::get_app_version($model).await
                    }
                }

                #[tokio::test]
                async fn get_address() {
                    if super::available(&$model) {
                        super::get_address($model).await
                    }
                }

                #[tokio::test]
                async fn show_address() {
                    if super::available(&$model) {
                        super::show_address($model).await
                    }
                }

                #[tokio::test]
                async fn sign_msg_send() {
                    if super::available(&$model) {
                        super::sign($model, "sign_MsgSend", super::TX_MSG_SEND, false).await
                    }
                }

                #[tokio::test]
                async fn sign_msg_deposit() {
                    if super::available(&$model) {
                        super::sign($model, "sign_MsgDeposit", super::TX_MSG_DEPOSIT, false).await
                    }
                }

                #[tokio::test]
                async fn sign_expert_msg_send() {
                    if super::available(&$model) {
                        super::sign($model, "sign_expert_MsgSend", super::TX_MSG_SEND, true).await
                    }
                }

                #[tokio::test]
                async fn reject_msg_send() {
                    if super::available(&$model) {
                        super::reject_msg_send($model).await
                    }
                }
            }
        )*
    };
}

device_tests! {
    nanos => NANOS,
    nanox => NANOX,
    nanosp => NANOSP,
    stax => STAX,
    flex => FLEX,
}
