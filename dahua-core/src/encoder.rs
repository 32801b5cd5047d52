//! Operation to CGI command encoding
//!
//! Every setter becomes a single `configManager.cgi?action=setConfig`
//! request whose keys address the table being written:
//!
//! | Operation               | Keys                                                      |
//! |-------------------------|-----------------------------------------------------------|
//! | `set_infrared_mode`     | `Lighting[0][0].Mode`, `Lighting[0][0].MiddleLight[0].Light` |
//! | `set_video_profile_mode`| `VideoInMode[0].Config[0]`                                |
//! | `enable_channel_title`  | `VideoWidget[c].ChannelTitle.EncodeBlend`                 |
//! | `enable_time_overlay`   | `VideoWidget[c].TimeTitle.EncodeBlend`                    |
//! | `enable_text_overlay`   | `VideoWidget[c].CustomTitle[g].EncodeBlend`               |
//! | `enable_custom_overlay` | `VideoWidget[c].UserDefinedTitle[g].EncodeBlend`          |
//! | `set_channel_title`     | `ChannelTitle[c].Name`                                    |
//! | `set_text_overlay`      | `VideoWidget[c].CustomTitle[g].Text`                      |
//! | `set_custom_overlay`    | `VideoWidget[c].UserDefinedTitle[g].Text`                 |
//! | `set_record_mode`       | `RecordMode[0].Mode`                                      |
//! | `enable_motion_detection` | `MotionDetect[0].Enable`, `MotionDetect[0].DetectVersion` |
//! | `set_lighting_v2`       | `Lighting_V2[0][p][0].Mode`, `Lighting_V2[0][p][0].MiddleLight[0].Light` |
//! | `set_disarming_linkage` | `DisableLinkage[0].Enable`                                |
//!
//! The coaxial operations are the exception: they go to
//! `coaxialControlIO.cgi` as `action=control` or `action=getStatus`.
//!
//! Overlay text slots are joined positionally with `|`. A slot the caller
//! left out is sent as an empty line, so the device never keeps stale text
//! in one slot while another is rewritten.

use std::borrow::Cow;

use dahua_types::operation::fields;
use dahua_types::schema::{self, OperationSchema};
use dahua_types::{
    CoaxialTarget, FieldValue, InfraredMode, LightingProfile, Operation, OperationKind, ProfileMode,
    RecordMode,
};

use crate::command::Command;
use crate::constants::{
    coaxial, lighting_profile, profile_index, record_mode, FALSE_TOKEN, MOTION_DETECT_VERSION,
    TEXT_SEPARATOR, TRUE_TOKEN,
};
use crate::error::{Error, Result};
use crate::request::EncodedRequest;

/// Turns operations into requests
///
/// Stateless apart from the optional channel count used to reject channels
/// the camera does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoder {
    channel_count: Option<u32>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject channels at or above `count`
    pub fn with_channel_count(mut self, count: u32) -> Self {
        self.channel_count = Some(count);
        self
    }

    /// Encode an operation
    ///
    /// # Errors
    ///
    /// Returns a malformed-operation error if a required field is missing,
    /// has the wrong type, or is outside what the manifest allows.
    pub fn encode(&self, operation: &Operation) -> Result<EncodedRequest> {
        let f = Fields::new(operation);

        let request = match operation.kind() {
            OperationKind::SetInfraredMode => {
                let mode = match f.text(fields::MODE)?.parse::<InfraredMode>()? {
                    InfraredMode::Auto => "Auto",
                    InfraredMode::On => "Manual",
                    InfraredMode::Off => "Off",
                };
                let brightness = f.integer(fields::BRIGHTNESS)?;
                set_config()
                    .param("Lighting[0][0].Mode", mode)
                    .param("Lighting[0][0].MiddleLight[0].Light", brightness.to_string())
            }
            OperationKind::SetVideoProfileMode => {
                let index = match f.text(fields::MODE)?.parse::<ProfileMode>()? {
                    ProfileMode::Day => profile_index::DAY,
                    ProfileMode::Night => profile_index::NIGHT,
                };
                set_config().param("VideoInMode[0].Config[0]", index.to_string())
            }
            OperationKind::EnableChannelTitle => {
                let channel = self.channel(&f)?;
                set_config().param(
                    format!("VideoWidget[{channel}].ChannelTitle.EncodeBlend"),
                    bool_token(f.boolean(fields::ENABLED)?),
                )
            }
            OperationKind::EnableTimeOverlay => {
                let channel = self.channel(&f)?;
                set_config().param(
                    format!("VideoWidget[{channel}].TimeTitle.EncodeBlend"),
                    bool_token(f.boolean(fields::ENABLED)?),
                )
            }
            OperationKind::EnableTextOverlay => {
                let channel = self.channel(&f)?;
                let group = f.integer(fields::GROUP)?;
                set_config().param(
                    format!("VideoWidget[{channel}].CustomTitle[{group}].EncodeBlend"),
                    bool_token(f.boolean(fields::ENABLED)?),
                )
            }
            OperationKind::EnableCustomOverlay => {
                let channel = self.channel(&f)?;
                let group = f.integer(fields::GROUP)?;
                set_config().param(
                    format!("VideoWidget[{channel}].UserDefinedTitle[{group}].EncodeBlend"),
                    bool_token(f.boolean(fields::ENABLED)?),
                )
            }
            OperationKind::SetChannelTitle => {
                let channel = self.channel(&f)?;
                set_config().param(format!("ChannelTitle[{channel}].Name"), f.texts(2)?)
            }
            OperationKind::SetTextOverlay => {
                let channel = self.channel(&f)?;
                let group = f.integer(fields::GROUP)?;
                set_config().param(
                    format!("VideoWidget[{channel}].CustomTitle[{group}].Text"),
                    f.texts(4)?,
                )
            }
            OperationKind::SetCustomOverlay => {
                let channel = self.channel(&f)?;
                let group = f.integer(fields::GROUP)?;
                set_config().param(
                    format!("VideoWidget[{channel}].UserDefinedTitle[{group}].Text"),
                    f.texts(2)?,
                )
            }
            OperationKind::SetRecordMode => {
                let mode = match f.text(fields::MODE)?.parse::<RecordMode>()? {
                    RecordMode::Auto => record_mode::AUTO,
                    RecordMode::On => record_mode::MANUAL,
                    RecordMode::Off => record_mode::OFF,
                };
                set_config().param("RecordMode[0].Mode", mode.to_string())
            }
            OperationKind::EnableMotionDetection => set_config()
                .param("MotionDetect[0].Enable", bool_token(f.boolean(fields::ENABLED)?))
                .param("MotionDetect[0].DetectVersion", MOTION_DETECT_VERSION),
            OperationKind::SetLightingV2 => {
                let profile = match f.text(fields::PROFILE)?.parse::<LightingProfile>()? {
                    LightingProfile::Day => lighting_profile::DAY,
                    LightingProfile::Night => lighting_profile::NIGHT,
                    LightingProfile::Scene => lighting_profile::SCENE,
                };
                let mode = if f.boolean(fields::ENABLED)? { "Manual" } else { "Off" };
                let brightness = f.integer(fields::BRIGHTNESS)?;
                set_config()
                    .param(format!("Lighting_V2[0][{profile}][0].Mode"), mode)
                    .param(
                        format!("Lighting_V2[0][{profile}][0].MiddleLight[0].Light"),
                        brightness.to_string(),
                    )
            }
            OperationKind::SetCoaxialControlState => {
                let target = match f.text(fields::TARGET)?.parse::<CoaxialTarget>()? {
                    CoaxialTarget::WhiteLight => coaxial::WHITE_LIGHT,
                    CoaxialTarget::Siren => coaxial::SIREN,
                };
                let io = if f.boolean(fields::ENABLED)? {
                    coaxial::IO_ON
                } else {
                    coaxial::IO_OFF
                };
                EncodedRequest::new(Command::Control)
                    .param("channel", coaxial::CONTROL_CHANNEL.to_string())
                    .param("info[0].Type", target.to_string())
                    .param("info[0].IO", io.to_string())
            }
            OperationKind::SetDisarmingLinkage => set_config().param(
                "DisableLinkage[0].Enable",
                bool_token(f.boolean(fields::ENABLED)?),
            ),
            OperationKind::GetConfig => {
                EncodedRequest::new(Command::GetConfig).param("name", f.text(fields::NAME)?)
            }
            OperationKind::GetSystemInfo => EncodedRequest::new(Command::GetSystemInfo),
            OperationKind::GetSoftwareVersion => EncodedRequest::new(Command::GetSoftwareVersion),
            OperationKind::GetMachineName => EncodedRequest::new(Command::GetMachineName),
            OperationKind::GetVendor => EncodedRequest::new(Command::GetVendor),
            OperationKind::GetDeviceType => EncodedRequest::new(Command::GetDeviceType),
            OperationKind::GetCoaxialControlStatus => EncodedRequest::new(Command::GetStatus)
                .param("channel", coaxial::STATUS_CHANNEL.to_string()),
        };

        Ok(request)
    }

    /// Second form to try when the device rejects the first encoding
    ///
    /// Only motion detection has one: firmware that predates detector
    /// revisions refuses `DetectVersion`, so the legacy request sets
    /// `Enable` alone.
    pub fn fallback(&self, operation: &Operation) -> Result<Option<EncodedRequest>> {
        match operation.kind() {
            OperationKind::EnableMotionDetection => {
                let enabled = Fields::new(operation).boolean(fields::ENABLED)?;
                Ok(Some(
                    set_config().param("MotionDetect[0].Enable", bool_token(enabled)),
                ))
            }
            _ => Ok(None),
        }
    }

    fn channel(&self, f: &Fields<'_>) -> Result<i64> {
        let channel = f.integer(fields::CHANNEL)?;
        if let Some(count) = self.channel_count {
            if channel >= i64::from(count) {
                return Err(Error::ChannelOutOfRange { channel, count });
            }
        }
        Ok(channel)
    }
}

/// Encode an operation with no channel-count limit
pub fn encode(operation: &Operation) -> Result<EncodedRequest> {
    Encoder::new().encode(operation)
}

fn set_config() -> EncodedRequest {
    EncodedRequest::new(Command::SetConfig)
}

fn bool_token(value: bool) -> &'static str {
    if value { TRUE_TOKEN } else { FALSE_TOKEN }
}

/// Field access checked against the manifest schema
struct Fields<'a> {
    operation: &'a Operation,
    schema: &'static OperationSchema,
}

impl<'a> Fields<'a> {
    fn new(operation: &'a Operation) -> Self {
        Self {
            operation,
            schema: schema::lookup(operation.kind()),
        }
    }

    fn value(&self, name: &'static str) -> Result<Cow<'a, FieldValue>> {
        let missing = || dahua_types::Error::MissingField {
            operation: self.operation.kind().service_name(),
            field: name,
        };
        let field = self.schema.field(name).ok_or_else(missing)?;

        match self.operation.get(name) {
            Some(value) => {
                field.check(value)?;
                Ok(Cow::Borrowed(value))
            }
            None => field
                .default
                .map(|d| Cow::Owned(d.to_value()))
                .ok_or_else(|| missing().into()),
        }
    }

    fn integer(&self, name: &'static str) -> Result<i64> {
        let value = self.value(name)?;
        value
            .as_integer()
            .ok_or_else(|| wrong_type(name, "integer", &value))
    }

    fn boolean(&self, name: &'static str) -> Result<bool> {
        let value = self.value(name)?;
        value
            .as_bool()
            .ok_or_else(|| wrong_type(name, "boolean", &value))
    }

    fn text(&self, name: &'static str) -> Result<String> {
        let value = self.value(name)?;
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| wrong_type(name, "text", &value))
    }

    /// Join the first `slots` text fields, one line per slot
    fn texts(&self, slots: usize) -> Result<String> {
        let mut lines = Vec::with_capacity(slots);
        for name in fields::TEXT.into_iter().take(slots) {
            let line = self.text(name)?;
            if line.contains(TEXT_SEPARATOR) {
                return Err(dahua_types::Error::Parse(format!(
                    "field '{name}' must not contain '{TEXT_SEPARATOR}'"
                ))
                .into());
            }
            lines.push(line);
        }
        let separator = TEXT_SEPARATOR.to_string();
        Ok(lines.join(separator.as_str()))
    }
}

fn wrong_type(field: &'static str, expected: &'static str, value: &FieldValue) -> Error {
    dahua_types::Error::WrongType {
        field,
        expected,
        actual: value.type_name(),
    }
    .into()
}
