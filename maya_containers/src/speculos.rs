use std::collections::HashMap;
use std::{env, io};

use testcontainers::{core::WaitFor, Image, ImageArgs, RunnableImage};

use crate::DeviceModel;

/// Port speculos listens for raw APDUs
pub const APDU_PORT: u16 = 9999;

/// Port of the speculos automation REST API (screenshots, buttons, touch, events)
pub const API_PORT: u16 = 5000;

const APPS_DIR: &str = "/speculos/apps";

#[derive(Debug, Default)]
pub struct Speculos {
    volumes: HashMap<String, String>,
    env_vars: HashMap<String, String>,
}

#[derive(Clone, Debug, Default)]
pub struct SpeculosArgs {
    /// File name of the app binary inside [`APPS_DIR`]
    app: String,
    /// Device model, speculos `-m`
    model: String,
}

impl ImageArgs for SpeculosArgs {
    fn into_iterator(self) -> Box<dyn Iterator<Item = String>> {
        let args = vec![
            format!("apps/{}", self.app),
            "-m".to_string(),
            self.model,
            "--display".to_string(),
            "headless".to_string(),
            "--apdu-port".to_string(),
            APDU_PORT.to_string(),
            "--api-port".to_string(),
            API_PORT.to_string(),
        ];
        Box::new(args.into_iter())
    }
}

impl Speculos {
    /// Speculos running the app built for `model`, with the device initialized from `seed`
    ///
    /// Fails if the app binary for `model` does not exist.
    pub fn new(model: &DeviceModel, seed: &str) -> Result<RunnableImage<Speculos>, io::Error> {
        Ok(RunnableImage::from(Self::image(model, seed)?))
    }

    fn image(model: &DeviceModel, seed: &str) -> Result<(Speculos, SpeculosArgs), io::Error> {
        // speculos needs the elf file, the directory containing it is mounted
        // as a volume like in the speculos docs
        let app = model.path().canonicalize()?;
        let invalid = || {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid app path {}", app.display()),
            )
        };
        let dir = app.parent().ok_or_else(invalid)?;
        let file_name = app
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(invalid)?;
        log::debug!("speculos for {model} with app {}", app.display());

        let mut volumes = HashMap::new();
        volumes.insert(dir.display().to_string(), APPS_DIR.to_string());

        let mut env_vars = HashMap::new();
        env_vars.insert("SPECULOS_SEED".to_string(), seed.to_string());

        let args = SpeculosArgs {
            app: file_name.to_string(),
            model: model.name().to_string(),
        };
        Ok((Speculos { volumes, env_vars }, args))
    }
}

impl Image for Speculos {
    type Args = SpeculosArgs;

    fn name(&self) -> String {
        env::var("SPECULOS_IMAGE_NAME").unwrap_or("ghcr.io/ledgerhq/speculos".into())
    }

    fn tag(&self) -> String {
        env::var("SPECULOS_IMAGE_VERSION").unwrap_or("latest".into())
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::StdErrMessage {
            message: "Seed initialized from environment".into(),
        }]
    }

    fn expose_ports(&self) -> Vec<u16> {
        [APDU_PORT, API_PORT].into()
    }

    fn volumes(&self) -> Box<dyn Iterator<Item = (&String, &String)> + '_> {
        Box::new(self.volumes.iter())
    }

    fn env_vars(&self) -> Box<dyn Iterator<Item = (&String, &String)> + '_> {
        Box::new(self.env_vars.iter())
    }
}
