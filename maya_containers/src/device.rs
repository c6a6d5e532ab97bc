use std::{env, fmt, path::PathBuf};

/// A hardware variant the app is built for.
///
/// The app binary defaults to the build output of the app, each path can be
/// overridden with its own environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceModel {
    name: &'static str,
    prefix: &'static str,
    path_env: &'static str,
    default_path: &'static str,
}

pub const NANOS: DeviceModel = DeviceModel {
    name: "nanos",
    prefix: "S",
    path_env: "APP_PATH_S",
    default_path: concat!(env!("CARGO_MANIFEST_DIR"), "/../app/output/app_s.elf"),
};

pub const NANOX: DeviceModel = DeviceModel {
    name: "nanox",
    prefix: "X",
    path_env: "APP_PATH_X",
    default_path: concat!(env!("CARGO_MANIFEST_DIR"), "/../app/output/app_x.elf"),
};

pub const NANOSP: DeviceModel = DeviceModel {
    name: "nanosp",
    prefix: "SP",
    path_env: "APP_PATH_SP",
    default_path: concat!(env!("CARGO_MANIFEST_DIR"), "/../app/output/app_s2.elf"),
};

pub const STAX: DeviceModel = DeviceModel {
    name: "stax",
    prefix: "ST",
    path_env: "APP_PATH_ST",
    default_path: concat!(env!("CARGO_MANIFEST_DIR"), "/../app/output/app_stax.elf"),
};

pub const FLEX: DeviceModel = DeviceModel {
    name: "flex",
    prefix: "FL",
    path_env: "APP_PATH_FL",
    default_path: concat!(env!("CARGO_MANIFEST_DIR"), "/../app/output/app_flex.elf"),
};

/// Every model the scenarios run against
pub static DEVICE_MODELS: [DeviceModel; 5] = [NANOS, NANOX, NANOSP, STAX, FLEX];

impl DeviceModel {
    /// Model name as understood by speculos `-m`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Short label used to name snapshots
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Path of the app binary for this model
    pub fn path(&self) -> PathBuf {
        env::var(self.path_env)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(self.default_path))
    }

    /// Whether the app binary for this model has been built
    pub fn is_available(&self) -> bool {
        self.path().is_file()
    }

    /// Touchscreen models approve with taps instead of buttons
    pub fn is_touch(&self) -> bool {
        matches!(self.name, "stax" | "flex")
    }

    /// Name of the snapshots directory of a test case, e.g. `s-sign_MsgSend`
    pub fn snapshot_name(&self, case: &str) -> String {
        format!("{}-{case}", self.prefix.to_lowercase())
    }

    pub fn from_name(name: &str) -> Option<&'static DeviceModel> {
        DEVICE_MODELS.iter().find(|m| m.name == name)
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
