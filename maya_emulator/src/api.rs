//! Client of the speculos automation REST API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Both,
}

impl Button {
    fn as_str(&self) -> &'static str {
        match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Both => "both",
        }
    }
}

/// A text element drawn on the current screen
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScreenEvent {
    pub text: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

#[derive(Deserialize)]
struct Events {
    events: Vec<ScreenEvent>,
}

#[derive(Serialize)]
struct ButtonAction {
    action: &'static str,
}

#[derive(Serialize)]
struct FingerAction {
    action: &'static str,
    x: u16,
    y: u16,
    /// Seconds between press and release
    delay: f32,
}

const PRESS_AND_RELEASE: &str = "press-and-release";

#[derive(Debug, Clone)]
pub struct SpeculosApi {
    client: reqwest::Client,
    base_url: String,
}

impl SpeculosApi {
    pub fn new(port: u16) -> Self {
        Self::with_base_url(format!("http://127.0.0.1:{port}"))
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn check(url: &str, resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status_code = resp.status().as_u16();
        if status_code != 200 {
            return Err(Error::HttpStatus(url.to_string(), status_code));
        }
        Ok(resp)
    }

    /// PNG of the current screen
    pub async fn screenshot(&self) -> Result<Snapshot, Error> {
        let url = format!("{}/screenshot", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let resp = Self::check(&url, resp)?;
        Ok(Snapshot::new(resp.bytes().await?.to_vec()))
    }

    /// Text elements of the current screen
    pub async fn events(&self) -> Result<Vec<ScreenEvent>, Error> {
        let url = format!("{}/events?currentscreenonly=true", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let resp = Self::check(&url, resp)?;
        let events: Events = resp.json().await?;
        Ok(events.events)
    }

    /// All the text of the current screen, one element per line
    pub async fn screen_text(&self) -> Result<String, Error> {
        let events = self.events().await?;
        let lines: Vec<&str> = events.iter().map(|e| e.text.as_str()).collect();
        Ok(lines.join("\n"))
    }

    pub async fn press(&self, button: Button) -> Result<(), Error> {
        let url = format!("{}/button/{}", self.base_url, button.as_str());
        log::trace!("press {}", button.as_str());
        let body = ButtonAction {
            action: PRESS_AND_RELEASE,
        };
        let resp = self.client.post(&url).json(&body).send().await?;
        Self::check(&url, resp)?;
        Ok(())
    }

    /// Tap at `(x, y)`, keeping the finger down for `hold`
    pub async fn touch(&self, x: u16, y: u16, hold: Duration) -> Result<(), Error> {
        let url = format!("{}/finger", self.base_url);
        log::trace!("touch {x},{y} for {hold:?}");
        let body = FingerAction {
            action: PRESS_AND_RELEASE,
            x,
            y,
            delay: hold.as_secs_f32(),
        };
        let resp = self.client.post(&url).json(&body).send().await?;
        Self::check(&url, resp)?;
        Ok(())
    }
}
