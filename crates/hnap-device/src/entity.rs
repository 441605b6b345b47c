//! Binary sensor and siren entities
//!
//! Entities are built from the device views registered for an entry and
//! poll the device through the same blocking client.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::client::{call_blocking, ensure_ok, ClientError, HnapResponse};
use crate::config::SensorKind;
use crate::error::HnapError;
use crate::method::{
    HnapMethod, SirenSound, DEFAULT_CONTROLLER, DEFAULT_DURATION, DEFAULT_MODULE_ID, DEFAULT_VOLUME,
};
use crate::platform::{Capability, DeviceView, Platform};

/// Seconds after a detection during which a motion sensor stays on
pub const DEFAULT_MOTION_WINDOW: i64 = 30;

const STATE_ON: &str = "on";
const STATE_OFF: &str = "off";
const STATE_UNKNOWN: &str = "unknown";

/// An entity backed by one device view
#[async_trait]
pub trait HnapEntity: Send + Sync {
    fn platform(&self) -> Platform;

    /// `<entry id>-<capability>`
    fn unique_id(&self) -> String;

    fn name(&self) -> String;

    /// `on`, `off` or `unknown`
    fn state(&self) -> &'static str;

    /// Poll the device
    async fn async_update(&mut self) -> Result<(), HnapError>;
}

fn state_str(is_on: Option<bool>) -> &'static str {
    match is_on {
        Some(true) => STATE_ON,
        Some(false) => STATE_OFF,
        None => STATE_UNKNOWN,
    }
}

fn field<'a>(action: &str, response: &'a HnapResponse, name: &str) -> Result<&'a str, ClientError> {
    response.get(name).map(String::as_str).ok_or_else(|| {
        ClientError::UnexpectedResponse(format!("{} response has no {}", action, name))
    })
}

/// Motion or moisture sensor
#[derive(Debug, Clone)]
pub struct HnapBinarySensor {
    entry_id: String,
    view: DeviceView,
    kind: SensorKind,
    motion_window: Duration,
    is_on: Option<bool>,
}

impl HnapBinarySensor {
    /// Returns `None` when the view is not a binary sensor
    pub fn new(entry_id: impl Into<String>, view: DeviceView) -> Option<Self> {
        let kind = match view.capability() {
            Capability::Motion => SensorKind::Motion,
            Capability::Moisture => SensorKind::Moisture,
            Capability::Camera | Capability::Siren => return None,
        };
        Some(Self {
            entry_id: entry_id.into(),
            view,
            kind,
            motion_window: Duration::seconds(DEFAULT_MOTION_WINDOW),
            is_on: None,
        })
    }

    pub fn with_motion_window(mut self, window: Duration) -> Self {
        self.motion_window = window;
        self
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    /// Poll the device, judging motion against `now`
    pub async fn update_at(&mut self, now: DateTime<Utc>) -> Result<(), HnapError> {
        let method = match self.kind {
            SensorKind::Motion => HnapMethod::GetLatestDetection {
                module_id: DEFAULT_MODULE_ID,
            },
            SensorKind::Moisture => HnapMethod::GetWaterDetectorState {
                module_id: DEFAULT_MODULE_ID,
            },
        };
        let response = call_blocking(self.view.client().clone(), method).await?;
        let action = method.action();

        let is_on = match self.kind {
            SensorKind::Motion => {
                let raw = field(action, &response, "LatestDetectTime")?;
                let detected = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                    .ok_or_else(|| {
                        ClientError::UnexpectedResponse(format!(
                            "LatestDetectTime is not a timestamp: {}",
                            raw
                        ))
                    })?;
                now.signed_duration_since(detected) <= self.motion_window
            }
            SensorKind::Moisture => {
                field(action, &response, "IsWater")?.eq_ignore_ascii_case("true")
            }
        };

        self.is_on = Some(is_on);
        Ok(())
    }
}

#[async_trait]
impl HnapEntity for HnapBinarySensor {
    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn unique_id(&self) -> String {
        format!("{}-{}", self.entry_id, self.view.capability())
    }

    fn name(&self) -> String {
        format!("{} {}", self.view.host(), self.view.capability())
    }

    fn state(&self) -> &'static str {
        state_str(self.is_on)
    }

    async fn async_update(&mut self) -> Result<(), HnapError> {
        self.update_at(Utc::now()).await
    }
}

/// Options for turning a siren on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SirenTurnOn {
    pub tone: Option<SirenSound>,
    pub volume: Option<u8>,
    pub duration: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct HnapSiren {
    entry_id: String,
    view: DeviceView,
    is_on: Option<bool>,
}

impl HnapSiren {
    /// Returns `None` when the view is not a siren
    pub fn new(entry_id: impl Into<String>, view: DeviceView) -> Option<Self> {
        if view.capability() != Capability::Siren {
            return None;
        }
        Some(Self {
            entry_id: entry_id.into(),
            view,
            is_on: None,
        })
    }

    pub fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    async fn send(&self, method: HnapMethod) -> Result<HnapResponse, HnapError> {
        let response = call_blocking(self.view.client().clone(), method).await?;
        ensure_ok(method.action(), &response)?;
        Ok(response)
    }

    pub async fn turn_on(&mut self, options: SirenTurnOn) -> Result<(), HnapError> {
        let method = HnapMethod::sound_play(
            options.tone.unwrap_or_default(),
            options.volume.unwrap_or(DEFAULT_VOLUME),
            options.duration.unwrap_or(DEFAULT_DURATION),
        )?;
        self.send(method).await?;
        self.is_on = Some(true);
        Ok(())
    }

    pub async fn turn_off(&mut self) -> Result<(), HnapError> {
        self.send(HnapMethod::SetAlarmDismissed {
            module_id: DEFAULT_MODULE_ID,
            controller: DEFAULT_CONTROLLER,
        })
        .await?;
        self.is_on = Some(false);
        Ok(())
    }
}

#[async_trait]
impl HnapEntity for HnapSiren {
    fn platform(&self) -> Platform {
        Platform::Siren
    }

    fn unique_id(&self) -> String {
        format!("{}-{}", self.entry_id, self.view.capability())
    }

    fn name(&self) -> String {
        format!("{} siren", self.view.host())
    }

    fn state(&self) -> &'static str {
        state_str(self.is_on)
    }

    async fn async_update(&mut self) -> Result<(), HnapError> {
        let method = HnapMethod::GetSirenAlarmSettings {
            module_id: DEFAULT_MODULE_ID,
            controller: DEFAULT_CONTROLLER,
        };
        let response = self.send(method).await?;
        let sounding = field(method.action(), &response, "IsSounding")?;
        self.is_on = Some(sounding.eq_ignore_ascii_case("true"));
        Ok(())
    }
}
