use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use maya_containers::testcontainers::clients::Cli;
use maya_containers::DeviceModel;
use maya_ledger::{MayaApp, TransportTcp};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::api::SpeculosApi;
use crate::session::{EmulatorSession, StartOptions};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Idle,
    Starting,
    Ready,
    AwaitingApproval,
    Verifying,
    Closing,
    Closed,
}

impl ScenarioState {
    pub fn can_transition(self, to: ScenarioState) -> bool {
        use ScenarioState::*;
        matches!(
            (self, to),
            (Idle, Starting)
                | (Starting, Ready)
                | (Ready | Verifying, AwaitingApproval)
                | (Ready | AwaitingApproval, Verifying)
                | (Idle | Starting | Ready | AwaitingApproval | Verifying, Closing)
                | (Closing, Closed)
        )
    }
}

/// A command running while the scenario drives the device screen.
///
/// Its result is only obtained through [`Scenario::approve`] or
/// [`Scenario::reject`], dropping it aborts the command.
#[must_use = "a pending command must be joined with approve or reject"]
pub struct PendingResponse<T> {
    handle: JoinHandle<maya_ledger::Result<T>>,
}

impl<T> PendingResponse<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Drop for PendingResponse<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Body of [`Scenario::run`]
pub type ScenarioBody<'s, T> = Pin<Box<dyn Future<Output = Result<T>> + 's>>;

/// One conformance scenario against a single device model
pub struct Scenario<'d> {
    state: ScenarioState,
    session: EmulatorSession<'d>,
}

impl<'d> Scenario<'d> {
    /// Start the emulator, the scenario is ready once the main menu is shown
    pub async fn start(docker: &'d Cli, model: DeviceModel, options: StartOptions) -> Result<Self> {
        log::info!("{model} scenario: {:?} -> {:?}", ScenarioState::Idle, ScenarioState::Starting);
        Self::ready(model, EmulatorSession::start(docker, model, options).await)
    }

    /// Run the scenario on an emulator started by other means, see [`EmulatorSession::attach`]
    pub async fn attach(
        model: DeviceModel,
        options: StartOptions,
        api: SpeculosApi,
        apdu: SocketAddr,
    ) -> Result<Self> {
        log::info!("{model} scenario: {:?} -> {:?}", ScenarioState::Idle, ScenarioState::Starting);
        Self::ready(model, EmulatorSession::attach(model, options, api, apdu).await)
    }

    fn ready(model: DeviceModel, session: Result<EmulatorSession<'d>>) -> Result<Self> {
        let session = match session {
            Ok(session) => session,
            Err(e) => {
                log::warn!("{model} scenario failed to start: {e}");
                return Err(e);
            }
        };
        let mut scenario = Self {
            state: ScenarioState::Starting,
            session,
        };
        scenario.transition(ScenarioState::Ready)?;
        Ok(scenario)
    }

    /// Start a scenario, run `body` and close it, all within the scenario timeout
    pub async fn run<T, F>(
        docker: &'d Cli,
        model: DeviceModel,
        options: StartOptions,
        body: F,
    ) -> Result<T>
    where
        F: for<'s> FnOnce(&'s mut Scenario<'d>) -> ScenarioBody<'s, T>,
    {
        let after = options.scenario_timeout();
        let whole = async {
            let mut scenario = Scenario::start(docker, model, options).await?;
            let result = body(&mut scenario).await;
            scenario.close();
            result
        };
        timeout(after, whole).await.map_err(|_| Error::Timeout {
            what: format!("the {model} scenario"),
            after,
        })?
    }

    fn transition(&mut self, to: ScenarioState) -> Result<()> {
        if !self.state.can_transition(to) {
            return Err(Error::InvalidState {
                from: self.state,
                to,
            });
        }
        log::info!("{} scenario: {:?} -> {to:?}", self.session.model(), self.state);
        self.state = to;
        Ok(())
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn session(&self) -> &EmulatorSession<'d> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EmulatorSession<'d> {
        &mut self.session
    }

    /// Client of the app, prefer [`Scenario::call`] to bound the command
    pub fn app(&self) -> &MayaApp<TransportTcp> {
        self.session.app()
    }

    /// Run a command answered without user interaction, waiting at most the
    /// poll timeout for it
    pub async fn call<F, Fut, T>(&mut self, command: F) -> Result<maya_ledger::Result<T>>
    where
        F: FnOnce(Arc<MayaApp<TransportTcp>>) -> Fut,
        Fut: Future<Output = maya_ledger::Result<T>>,
    {
        if !matches!(self.state, ScenarioState::Ready | ScenarioState::Verifying) {
            return Err(Error::InvalidState {
                from: self.state,
                to: ScenarioState::Verifying,
            });
        }
        let after = self.session.options().poll_timeout();
        let result = timeout(after, command(self.session.app().clone()))
            .await
            .map_err(|_| Error::Timeout {
                what: "the device answer".to_string(),
                after,
            })?;
        if self.state == ScenarioState::Ready {
            self.transition(ScenarioState::Verifying)?;
        }
        Ok(result)
    }

    /// Spawn an interactive command and return without waiting for it
    pub fn issue<F, Fut, T>(&mut self, command: F) -> Result<PendingResponse<T>>
    where
        F: FnOnce(Arc<MayaApp<TransportTcp>>) -> Fut,
        Fut: Future<Output = maya_ledger::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.transition(ScenarioState::AwaitingApproval)?;
        let handle = tokio::spawn(command(self.session.app().clone()));
        Ok(PendingResponse { handle })
    }

    /// Approve the flow shown for `pending`, comparing it with the golden
    /// snapshots of `case`, then join the command
    pub async fn approve<T>(
        &mut self,
        pending: PendingResponse<T>,
        case: &str,
    ) -> Result<maya_ledger::Result<T>> {
        self.join_after_review(pending, case, true).await
    }

    /// Like [`Scenario::approve`] refusing the request, the command is expected
    /// to fail with a user rejection
    pub async fn reject<T>(
        &mut self,
        pending: PendingResponse<T>,
        case: &str,
    ) -> Result<maya_ledger::Result<T>> {
        self.join_after_review(pending, case, false).await
    }

    async fn join_after_review<T>(
        &mut self,
        mut pending: PendingResponse<T>,
        case: &str,
        approve: bool,
    ) -> Result<maya_ledger::Result<T>> {
        if self.state != ScenarioState::AwaitingApproval {
            return Err(Error::InvalidState {
                from: self.state,
                to: ScenarioState::Verifying,
            });
        }
        let session = &self.session;

        // a command failing before any review screen ends the wait early
        let early = tokio::select! {
            changed = session.wait_until_screen_is_not(session.main_menu()) => {
                changed?;
                None
            }
            joined = &mut pending.handle => Some(joined),
        };

        let result = match early {
            Some(joined) => {
                log::warn!("{} command completed before its review", session.model());
                joined?
            }
            None => {
                // the device answers once the last step is given, the
                // command is joined after the whole flow is compared
                if approve {
                    session.compare_snapshots_and_approve(case).await?;
                } else {
                    session.compare_snapshots_and_reject(case).await?;
                }
                let after = session.options().poll_timeout();
                timeout(after, &mut pending.handle)
                    .await
                    .map_err(|_| Error::Timeout {
                        what: "the pending command".to_string(),
                        after,
                    })??
            }
        };
        self.transition(ScenarioState::Verifying)?;
        Ok(result)
    }

    /// Tear down the emulator, calling it again has no effect
    pub fn close(&mut self) {
        if self.state == ScenarioState::Closed {
            return;
        }
        if let Err(e) = self.transition(ScenarioState::Closing) {
            log::warn!("{e}");
        }
        self.session.close();
        self.state = ScenarioState::Closed;
        log::info!("{} scenario: closed", self.session.model());
    }
}

impl Drop for Scenario<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
