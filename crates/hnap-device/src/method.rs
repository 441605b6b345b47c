//! HNAP methods accepted by the `call` service
//!
//! Service data names a method and a flat map of parameters. Both are
//! checked here, before any device is contacted, and turned into a
//! [`HnapMethod`] that knows its wire-level action name and parameter list.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::{ATTR_METHOD, ATTR_PARAMETERS};

pub const DEFAULT_MODULE_ID: u8 = 1;
pub const DEFAULT_CONTROLLER: u8 = 1;
pub const DEFAULT_VOLUME: u8 = 100;
pub const DEFAULT_DURATION: u32 = 60;

const PARAM_MODULE_ID: &str = "ModuleID";
const PARAM_CONTROLLER: &str = "Controller";
const PARAM_SOUND_TYPE: &str = "SoundType";
const PARAM_VOLUME: &str = "Volume";
const PARAM_DURATION: &str = "Duration";

/// Errors for methods the integration refuses to send
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MethodError {
    #[error("unsupported HNAP method: {0}")]
    Unsupported(String),

    #[error("invalid value {value:?} for parameter {name}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("unexpected parameter {name} for {method}")]
    UnexpectedParameter { method: String, name: String },
}

impl MethodError {
    fn invalid(name: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        MethodError::InvalidParameter {
            name: name.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Tones a siren module can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SirenSound {
    #[default]
    Emergency = 1,
    Fire = 2,
    Ambulance = 3,
    Police = 4,
    DoorChime = 5,
    Beep = 6,
}

impl SirenSound {
    pub const ALL: [SirenSound; 6] = [
        SirenSound::Emergency,
        SirenSound::Fire,
        SirenSound::Ambulance,
        SirenSound::Police,
        SirenSound::DoorChime,
        SirenSound::Beep,
    ];

    /// Numeric `SoundType` sent on the wire
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SirenSound::Emergency => "emergency",
            SirenSound::Fire => "fire",
            SirenSound::Ambulance => "ambulance",
            SirenSound::Police => "police",
            SirenSound::DoorChime => "door_chime",
            SirenSound::Beep => "beep",
        }
    }
}

impl FromStr for SirenSound {
    type Err = MethodError;

    /// Accepts the numeric code or the tone name in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SirenSound::ALL
            .into_iter()
            .find(|sound| {
                trimmed == sound.code().to_string() || trimmed.eq_ignore_ascii_case(sound.as_str())
            })
            .ok_or_else(|| MethodError::invalid(PARAM_SOUND_TYPE, s, "unknown sound type"))
    }
}

impl fmt::Display for SirenSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated HNAP action together with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HnapMethod {
    GetDeviceSettings,
    IsDeviceReady,
    GetModuleSoapActions {
        module_id: u8,
    },
    GetMotionDetectorSettings {
        module_id: u8,
    },
    GetLatestDetection {
        module_id: u8,
    },
    GetWaterDetectorState {
        module_id: u8,
    },
    GetSirenAlarmSettings {
        module_id: u8,
        controller: u8,
    },
    SetSoundPlay {
        module_id: u8,
        controller: u8,
        sound: SirenSound,
        volume: u8,
        duration: u32,
    },
    SetAlarmDismissed {
        module_id: u8,
        controller: u8,
    },
}

impl HnapMethod {
    /// Build a `SetSoundPlay` after checking volume and duration
    pub fn sound_play(
        sound: SirenSound,
        volume: u8,
        duration: u32,
    ) -> Result<Self, MethodError> {
        if volume > 100 {
            return Err(MethodError::invalid(
                PARAM_VOLUME,
                volume.to_string(),
                "must be between 0 and 100",
            ));
        }
        if duration == 0 {
            return Err(MethodError::invalid(
                PARAM_DURATION,
                "0",
                "must be at least one second",
            ));
        }
        Ok(HnapMethod::SetSoundPlay {
            module_id: DEFAULT_MODULE_ID,
            controller: DEFAULT_CONTROLLER,
            sound,
            volume,
            duration,
        })
    }

    /// Validate a method name and its string parameters
    pub fn parse(method: &str, parameters: &BTreeMap<String, String>) -> Result<Self, MethodError> {
        let p = Params { method, values: parameters };

        let parsed = match method {
            "GetDeviceSettings" => {
                p.only(&[])?;
                HnapMethod::GetDeviceSettings
            }
            "IsDeviceReady" => {
                p.only(&[])?;
                HnapMethod::IsDeviceReady
            }
            "GetModuleSOAPActions" => {
                p.only(&[PARAM_MODULE_ID])?;
                HnapMethod::GetModuleSoapActions {
                    module_id: p.module_id()?,
                }
            }
            "GetMotionDetectorSettings" => {
                p.only(&[PARAM_MODULE_ID])?;
                HnapMethod::GetMotionDetectorSettings {
                    module_id: p.module_id()?,
                }
            }
            "GetLatestDetection" => {
                p.only(&[PARAM_MODULE_ID])?;
                HnapMethod::GetLatestDetection {
                    module_id: p.module_id()?,
                }
            }
            "GetWaterDetectorState" => {
                p.only(&[PARAM_MODULE_ID])?;
                HnapMethod::GetWaterDetectorState {
                    module_id: p.module_id()?,
                }
            }
            "GetSirenAlarmSettings" => {
                p.only(&[PARAM_MODULE_ID, PARAM_CONTROLLER])?;
                HnapMethod::GetSirenAlarmSettings {
                    module_id: p.module_id()?,
                    controller: p.controller()?,
                }
            }
            "SetSoundPlay" => {
                p.only(&[
                    PARAM_MODULE_ID,
                    PARAM_CONTROLLER,
                    PARAM_SOUND_TYPE,
                    PARAM_VOLUME,
                    PARAM_DURATION,
                ])?;
                HnapMethod::SetSoundPlay {
                    module_id: p.module_id()?,
                    controller: p.controller()?,
                    sound: match parameters.get(PARAM_SOUND_TYPE) {
                        Some(raw) => raw.parse()?,
                        None => SirenSound::default(),
                    },
                    volume: p.number(PARAM_VOLUME, DEFAULT_VOLUME, 0..=100)?,
                    duration: p.number(PARAM_DURATION, DEFAULT_DURATION, 1..=u32::MAX)?,
                }
            }
            "SetAlarmDismissed" => {
                p.only(&[PARAM_MODULE_ID, PARAM_CONTROLLER])?;
                HnapMethod::SetAlarmDismissed {
                    module_id: p.module_id()?,
                    controller: p.controller()?,
                }
            }
            other => return Err(MethodError::Unsupported(other.to_string())),
        };

        Ok(parsed)
    }

    /// Read `method` and `parameters` out of `call` service data
    pub fn from_service_data(data: &Value) -> Result<Self, MethodError> {
        let method = match data.get(ATTR_METHOD) {
            Some(Value::String(method)) => method,
            Some(other) => {
                return Err(MethodError::invalid(
                    ATTR_METHOD,
                    other.to_string(),
                    "must be a string",
                ))
            }
            None => return Err(MethodError::invalid(ATTR_METHOD, "", "is required")),
        };

        let parameters = parameters_from_json(data.get(ATTR_PARAMETERS))?;
        Self::parse(method, &parameters)
    }

    /// Wire-level action name
    pub fn action(&self) -> &'static str {
        match self {
            HnapMethod::GetDeviceSettings => "GetDeviceSettings",
            HnapMethod::IsDeviceReady => "IsDeviceReady",
            HnapMethod::GetModuleSoapActions { .. } => "GetModuleSOAPActions",
            HnapMethod::GetMotionDetectorSettings { .. } => "GetMotionDetectorSettings",
            HnapMethod::GetLatestDetection { .. } => "GetLatestDetection",
            HnapMethod::GetWaterDetectorState { .. } => "GetWaterDetectorState",
            HnapMethod::GetSirenAlarmSettings { .. } => "GetSirenAlarmSettings",
            HnapMethod::SetSoundPlay { .. } => "SetSoundPlay",
            HnapMethod::SetAlarmDismissed { .. } => "SetAlarmDismissed",
        }
    }

    /// Ordered parameters as sent to the device
    pub fn parameters(&self) -> Vec<(String, String)> {
        fn pair(name: &str, value: impl ToString) -> (String, String) {
            (name.to_string(), value.to_string())
        }

        match *self {
            HnapMethod::GetDeviceSettings | HnapMethod::IsDeviceReady => Vec::new(),
            HnapMethod::GetModuleSoapActions { module_id }
            | HnapMethod::GetMotionDetectorSettings { module_id }
            | HnapMethod::GetLatestDetection { module_id }
            | HnapMethod::GetWaterDetectorState { module_id } => {
                vec![pair(PARAM_MODULE_ID, module_id)]
            }
            HnapMethod::GetSirenAlarmSettings {
                module_id,
                controller,
            }
            | HnapMethod::SetAlarmDismissed {
                module_id,
                controller,
            } => vec![
                pair(PARAM_MODULE_ID, module_id),
                pair(PARAM_CONTROLLER, controller),
            ],
            HnapMethod::SetSoundPlay {
                module_id,
                controller,
                sound,
                volume,
                duration,
            } => vec![
                pair(PARAM_MODULE_ID, module_id),
                pair(PARAM_CONTROLLER, controller),
                pair(PARAM_SOUND_TYPE, sound.code()),
                pair(PARAM_VOLUME, volume),
                pair(PARAM_DURATION, duration),
            ],
        }
    }
}

impl fmt::Display for HnapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.action())?;
        for (i, (name, value)) in self.parameters().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

/// Flatten the `parameters` object into strings
///
/// Numbers and booleans are stringified; nested values are rejected.
pub fn parameters_from_json(value: Option<&Value>) -> Result<BTreeMap<String, String>, MethodError> {
    let object = match value {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(object)) => object,
        Some(other) => {
            return Err(MethodError::invalid(
                ATTR_PARAMETERS,
                other.to_string(),
                "must be an object",
            ))
        }
    };

    object
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(MethodError::invalid(
                        name,
                        other.to_string(),
                        "expected a string, number or boolean",
                    ))
                }
            };
            Ok((name.clone(), value))
        })
        .collect()
}

struct Params<'a> {
    method: &'a str,
    values: &'a BTreeMap<String, String>,
}

impl Params<'_> {
    fn only(&self, accepted: &[&str]) -> Result<(), MethodError> {
        match self
            .values
            .keys()
            .find(|name| !accepted.contains(&name.as_str()))
        {
            Some(name) => Err(MethodError::UnexpectedParameter {
                method: self.method.to_string(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn number<T>(&self, name: &str, default: T, range: RangeInclusive<T>) -> Result<T, MethodError>
    where
        T: FromStr + PartialOrd + fmt::Display,
    {
        let Some(raw) = self.values.get(name) else {
            return Ok(default);
        };
        let value: T = raw
            .trim()
            .parse()
            .map_err(|_| MethodError::invalid(name, raw.as_str(), "not a whole number"))?;
        if !range.contains(&value) {
            return Err(MethodError::invalid(
                name,
                raw.as_str(),
                format!("must be between {} and {}", range.start(), range.end()),
            ));
        }
        Ok(value)
    }

    fn module_id(&self) -> Result<u8, MethodError> {
        self.number(PARAM_MODULE_ID, DEFAULT_MODULE_ID, 0..=u8::MAX)
    }

    fn controller(&self) -> Result<u8, MethodError> {
        self.number(PARAM_CONTROLLER, DEFAULT_CONTROLLER, 0..=u8::MAX)
    }
}
