use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use maya_containers::testcontainers::{clients::Cli, Container};
use maya_containers::{DeviceModel, Speculos, APDU_PORT, API_PORT};
use maya_ledger::{MayaApp, TransportTcp, CONNECT_TIMEOUT};
use tokio::time::{sleep, timeout};

use crate::api::{Button, SpeculosApi};
use crate::consts::{
    DEFAULT_SEED, KEY_DELAY, MAX_NAVIGATION_STEPS, POLL_INTERVAL, POLL_TIMEOUT, SCENARIO_TIMEOUT,
    SNAPSHOTS_DIR, SNAPSHOTS_TMP_DIR, START_TIMEOUT,
};
use crate::navigation::{schedule_steps, touch_layout, ApproveAction, NavStep};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::{Error, Result};

/// How an emulator is started and driven
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub(crate) seed: String,
    /// `None` uses the usual action of the model, see [`StartOptions::approve_action`]
    pub(crate) approve_action: Option<ApproveAction>,
    pub(crate) approve_keyword: Option<String>,
    pub(crate) reject_keyword: Option<String>,
    pub(crate) start_timeout: Duration,
    pub(crate) poll_timeout: Duration,
    pub(crate) scenario_timeout: Duration,
    pub(crate) snapshots: SnapshotStore,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_string(),
            approve_action: None,
            approve_keyword: None,
            reject_keyword: None,
            start_timeout: START_TIMEOUT,
            poll_timeout: POLL_TIMEOUT,
            scenario_timeout: SCENARIO_TIMEOUT,
            snapshots: SnapshotStore::new(SNAPSHOTS_DIR, SNAPSHOTS_TMP_DIR, false),
        }
    }
}

impl StartOptions {
    /// Defaults overridden by `EMULATOR_SEED`, `SNAPSHOTS_DIR`, `SNAPSHOTS_TMP_DIR`
    /// and `SNAPSHOTS_RECORD`
    pub fn from_env() -> Self {
        let seed = env::var("EMULATOR_SEED").unwrap_or(DEFAULT_SEED.into());
        let golden = env::var("SNAPSHOTS_DIR").unwrap_or(SNAPSHOTS_DIR.into());
        let tmp = env::var("SNAPSHOTS_TMP_DIR").unwrap_or(SNAPSHOTS_TMP_DIR.into());
        let record = env::var("SNAPSHOTS_RECORD")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            seed,
            snapshots: SnapshotStore::new(golden, tmp, record),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: &str) -> Self {
        self.seed = seed.to_string();
        self
    }

    pub fn with_approve_action(mut self, action: ApproveAction) -> Self {
        self.approve_action = Some(action);
        self
    }

    /// Text of the screen where the approval is given, matched ignoring case
    pub fn with_approve_keyword(mut self, keyword: &str) -> Self {
        self.approve_keyword = Some(keyword.to_string());
        self
    }

    pub fn with_reject_keyword(mut self, keyword: &str) -> Self {
        self.reject_keyword = Some(keyword.to_string());
        self
    }

    pub fn with_snapshots(mut self, snapshots: SnapshotStore) -> Self {
        self.snapshots = snapshots;
        self
    }

    /// How long the emulator may take to show its first screen
    pub fn with_start_timeout(mut self, start_timeout: Duration) -> Self {
        self.start_timeout = start_timeout;
        self
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_scenario_timeout(mut self, scenario_timeout: Duration) -> Self {
        self.scenario_timeout = scenario_timeout;
        self
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn scenario_timeout(&self) -> Duration {
        self.scenario_timeout
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Touch devices sign holding the confirm button, button devices click both
    pub fn approve_action(&self, model: &DeviceModel) -> ApproveAction {
        self.approve_action.unwrap_or(if model.is_touch() {
            ApproveAction::ApproveHoldButton
        } else {
            ApproveAction::BothClick
        })
    }

    pub fn approve_keyword(&self, model: &DeviceModel) -> String {
        match &self.approve_keyword {
            Some(keyword) if !keyword.is_empty() => keyword.clone(),
            _ if model.is_touch() => "Hold to sign".to_string(),
            _ => "APPROVE".to_string(),
        }
    }

    pub fn reject_keyword(&self, model: &DeviceModel) -> String {
        match &self.reject_keyword {
            Some(keyword) if !keyword.is_empty() => keyword.clone(),
            _ if model.is_touch() => "Reject".to_string(),
            _ => "REJECT".to_string(),
        }
    }
}

fn contains_keyword(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

async fn wait_for_first_screen(
    api: &SpeculosApi,
    model: &DeviceModel,
    start_timeout: Duration,
) -> Result<Snapshot> {
    let first_screen = async {
        loop {
            match api.screenshot().await {
                Ok(snapshot) if !snapshot.is_empty() => return snapshot,
                Ok(_) => {}
                Err(e) => log::trace!("{model} emulator not ready: {e}"),
            }
            sleep(POLL_INTERVAL).await;
        }
    };
    timeout(start_timeout, first_screen)
        .await
        .map_err(|_| Error::Timeout {
            what: format!("the first screen of the {model} emulator"),
            after: start_timeout,
        })
}

/// A running emulator with the clients to drive it.
///
/// The container is stopped by [`EmulatorSession::close`] or when the
/// session is dropped, whichever comes first.
pub struct EmulatorSession<'d> {
    model: DeviceModel,
    options: StartOptions,
    api: SpeculosApi,
    app: Arc<MayaApp<TransportTcp>>,
    main_menu: Snapshot,
    // dropping the container stops it, `None` for attached emulators
    container: Option<Container<'d, Speculos>>,
    closed: bool,
}

impl<'d> EmulatorSession<'d> {
    /// Start the emulator for `model` and wait for its main menu.
    ///
    /// Running the container blocks the current thread until docker reports
    /// it started, a timeout around this call only applies after that.
    pub async fn start(docker: &'d Cli, model: DeviceModel, options: StartOptions) -> Result<Self> {
        let image = Speculos::new(&model, &options.seed).map_err(|e| Error::Connection {
            model: model.name(),
            reason: e.to_string(),
        })?;
        log::info!("starting {model} emulator");
        let container = docker.run(image);
        let apdu_port = container.get_host_port_ipv4(APDU_PORT);
        let api_port = container.get_host_port_ipv4(API_PORT);
        log::debug!("{model} emulator apdu port {apdu_port}, api port {api_port}");

        let api = SpeculosApi::new(api_port);
        let apdu = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), apdu_port);
        Self::connect(model, options, api, apdu, Some(container)).await
    }

    /// Drive an emulator started by other means, e.g. speculos launched by
    /// hand. Closing the session leaves that emulator running.
    pub async fn attach(
        model: DeviceModel,
        options: StartOptions,
        api: SpeculosApi,
        apdu: SocketAddr,
    ) -> Result<Self> {
        Self::connect(model, options, api, apdu, None).await
    }

    async fn connect(
        model: DeviceModel,
        options: StartOptions,
        api: SpeculosApi,
        apdu: SocketAddr,
        container: Option<Container<'d, Speculos>>,
    ) -> Result<Self> {
        let connection_error = |reason: String| Error::Connection {
            model: model.name(),
            reason,
        };
        // the ports are mapped before speculos listens, the api answering
        // with a screen means the apdu server is up too
        let main_menu = wait_for_first_screen(&api, &model, options.start_timeout)
            .await
            .map_err(|e| connection_error(e.to_string()))?;
        let transport = TransportTcp::connect(apdu, CONNECT_TIMEOUT)
            .await
            .map_err(|e| connection_error(e.to_string()))?;
        log::info!("{model} emulator ready, main menu {main_menu:?}");

        Ok(Self {
            model,
            options,
            api,
            app: Arc::new(MayaApp::new(transport)),
            main_menu,
            container,
            closed: false,
        })
    }

    pub fn model(&self) -> &DeviceModel {
        &self.model
    }

    pub fn options(&self) -> &StartOptions {
        &self.options
    }

    pub fn api(&self) -> &SpeculosApi {
        &self.api
    }

    /// Client of the app, shared with the tasks of pending commands
    pub fn app(&self) -> &Arc<MayaApp<TransportTcp>> {
        &self.app
    }

    pub fn main_menu(&self) -> &Snapshot {
        &self.main_menu
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        self.api.screenshot().await
    }

    /// Poll the screen until it differs from `previous`
    pub async fn wait_until_screen_is_not(&self, previous: &Snapshot) -> Result<Snapshot> {
        let changed = async {
            loop {
                let current = self.snapshot().await?;
                if !current.is_empty() && current != *previous {
                    return Ok::<_, Error>(current);
                }
                sleep(POLL_INTERVAL).await;
            }
        };
        timeout(self.options.poll_timeout, changed)
            .await
            .map_err(|_| Error::Timeout {
                what: format!("the screen to change from {previous:?}"),
                after: self.options.poll_timeout,
            })?
    }

    async fn perform(&self, step: NavStep) -> Result<()> {
        match step {
            NavStep::Press(button) => self.api.press(button).await?,
            NavStep::Touch { x, y, hold } => self.api.touch(x, y, hold).await?,
        }
        sleep(KEY_DELAY).await;
        Ok(())
    }

    /// Perform `step` and return the screen it leads to
    async fn step(&self, step: NavStep, previous: &Snapshot) -> Result<Snapshot> {
        self.perform(step).await?;
        self.wait_until_screen_is_not(previous).await
    }

    /// Move through the review screens until `keyword` is shown, returning every screen seen
    async fn navigate_until_text(&self, keyword: &str) -> Result<Vec<Snapshot>> {
        let mut snapshots = vec![self.snapshot().await?];
        for _ in 0..MAX_NAVIGATION_STEPS {
            if contains_keyword(&self.api.screen_text().await?, keyword) {
                return Ok(snapshots);
            }
            let previous = snapshots.last().ok_or(Error::Closed)?;
            let next = self.step(NavStep::next(&self.model), previous).await?;
            snapshots.push(next);
        }
        Err(Error::KeywordNotFound(
            keyword.to_string(),
            MAX_NAVIGATION_STEPS,
        ))
    }

    /// Walk the main menu following `schedule` and compare every screen with
    /// the golden snapshots of `case`
    pub async fn navigate_and_compare_snapshots(&self, case: &str, schedule: &[i32]) -> Result<()> {
        let mut snapshots = vec![self.snapshot().await?];
        for step in schedule_steps(&self.model, schedule) {
            self.perform(step).await?;
            snapshots.push(self.snapshot().await?);
        }
        self.compare(case, &snapshots)
    }

    /// Review the flow on screen up to the approve keyword, approve it and
    /// compare every screen with the golden snapshots of `case`
    pub async fn compare_snapshots_and_approve(&self, case: &str) -> Result<()> {
        let keyword = self.options.approve_keyword(&self.model);
        let mut snapshots = self.navigate_until_text(&keyword).await?;
        log::info!("{}: approving on '{keyword}'", self.model);

        let action = self.options.approve_action(&self.model);
        let last = snapshots.last().ok_or(Error::Closed)?;
        let after = self.step(NavStep::approve(&self.model, action), last).await?;
        snapshots.push(after);
        self.compare(case, &snapshots)
    }

    /// Same as [`Self::compare_snapshots_and_approve`] refusing the request
    pub async fn compare_snapshots_and_reject(&self, case: &str) -> Result<()> {
        let keyword = self.options.reject_keyword(&self.model);
        let mut snapshots = self.navigate_until_text(&keyword).await?;
        log::info!("{}: rejecting on '{keyword}'", self.model);

        for step in NavStep::reject(&self.model) {
            let last = snapshots.last().ok_or(Error::Closed)?;
            let next = self.step(step, last).await?;
            snapshots.push(next);
        }
        self.compare(case, &snapshots)
    }

    fn compare(&self, case: &str, snapshots: &[Snapshot]) -> Result<()> {
        let name = self.model.snapshot_name(case);
        self.options.snapshots.save_and_compare(&name, snapshots)
    }

    /// Flip the expert mode setting and go back to the main menu, which is captured again
    pub async fn toggle_expert_mode(&mut self) -> Result<()> {
        match touch_layout(&self.model) {
            Some(layout) => {
                let mut current = self.snapshot().await?;
                for (x, y) in [layout.settings, layout.expert_toggle, layout.exit_settings] {
                    let tap = NavStep::Touch {
                        x,
                        y,
                        hold: Duration::ZERO,
                    };
                    current = self.step(tap, &current).await?;
                }
            }
            None => {
                let screens = self.navigate_until_text("expert mode").await?;
                let last = screens.last().ok_or(Error::Closed)?;
                self.step(NavStep::Press(Button::Both), last).await?;
                // back to the first item of the menu
                for _ in 1..screens.len() {
                    self.perform(NavStep::Press(Button::Left)).await?;
                }
            }
        }
        self.main_menu = self.snapshot().await?;
        log::info!("{}: expert mode toggled, main menu {:?}", self.model, self.main_menu);
        Ok(())
    }

    /// Stop the emulator, calling it again has no effect
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.app.transport().close();
        if let Some(container) = self.container.take() {
            log::info!("stopping {} emulator", self.model);
            drop(container);
        }
    }
}

impl Drop for EmulatorSession<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
