use std::time::Duration;

/// Upper bound of a whole scenario, from start to close
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(90);

/// Upper bound of every loop waiting for the screen
pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the emulator may take to show its first screen
pub const START_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after each button press or tap, the screen takes a while to redraw
pub const KEY_DELAY: Duration = Duration::from_millis(250);

/// Press duration of the "hold to sign" button on touch devices
pub const HOLD_DURATION: Duration = Duration::from_secs(3);

/// Maximum number of screens walked looking for a keyword
pub const MAX_NAVIGATION_STEPS: usize = 30;

pub const DEFAULT_SEED: &str =
    "equip will roof matter pink blind book anxiety banner elbow sun young";

pub const SNAPSHOTS_DIR: &str = "snapshots";
pub const SNAPSHOTS_TMP_DIR: &str = "snapshots-tmp";
