//! Camera operations as delivered by the host framework
//!
//! An [`Operation`] names one action and carries its fields as a map from
//! field name to [`FieldValue`]. Operations are immutable once built; the
//! builder methods consume `self`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Field names used by the manifest
pub mod fields {
    pub const MODE: &str = "mode";
    pub const BRIGHTNESS: &str = "brightness";
    pub const CHANNEL: &str = "channel";
    pub const GROUP: &str = "group";
    pub const ENABLED: &str = "enabled";
    pub const NAME: &str = "name";
    pub const PROFILE: &str = "profile";
    pub const TARGET: &str = "target";

    /// Overlay text slots, in display order
    pub const TEXT: [&str; 4] = ["text1", "text2", "text3", "text4"];
}

/// Every action the gateway knows how to encode
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    // Manifest services
    SetInfraredMode,
    SetVideoProfileMode,
    EnableChannelTitle,
    EnableTimeOverlay,
    EnableTextOverlay,
    EnableCustomOverlay,
    SetChannelTitle,
    SetTextOverlay,
    SetCustomOverlay,
    SetRecordMode,

    // Control operations of the full client
    EnableMotionDetection,
    SetLightingV2,
    SetCoaxialControlState,
    SetDisarmingLinkage,

    // Reads
    GetConfig,
    GetSystemInfo,
    GetSoftwareVersion,
    GetMachineName,
    GetVendor,
    GetDeviceType,
    GetCoaxialControlStatus,
}

impl OperationKind {
    pub const ALL: [Self; 21] = [
        Self::SetInfraredMode,
        Self::SetVideoProfileMode,
        Self::EnableChannelTitle,
        Self::EnableTimeOverlay,
        Self::EnableTextOverlay,
        Self::EnableCustomOverlay,
        Self::SetChannelTitle,
        Self::SetTextOverlay,
        Self::SetCustomOverlay,
        Self::SetRecordMode,
        Self::EnableMotionDetection,
        Self::SetLightingV2,
        Self::SetCoaxialControlState,
        Self::SetDisarmingLinkage,
        Self::GetConfig,
        Self::GetSystemInfo,
        Self::GetSoftwareVersion,
        Self::GetMachineName,
        Self::GetVendor,
        Self::GetDeviceType,
        Self::GetCoaxialControlStatus,
    ];

    /// Service name as declared in the manifest
    pub fn service_name(self) -> &'static str {
        match self {
            Self::SetInfraredMode => "set_infrared_mode",
            Self::SetVideoProfileMode => "set_video_profile_mode",
            Self::EnableChannelTitle => "enable_channel_title",
            Self::EnableTimeOverlay => "enable_time_overlay",
            Self::EnableTextOverlay => "enable_text_overlay",
            Self::EnableCustomOverlay => "enable_custom_overlay",
            Self::SetChannelTitle => "set_channel_title",
            Self::SetTextOverlay => "set_text_overlay",
            Self::SetCustomOverlay => "set_custom_overlay",
            Self::SetRecordMode => "set_record_mode",
            Self::EnableMotionDetection => "enable_motion_detection",
            Self::SetLightingV2 => "set_lighting_v2",
            Self::SetCoaxialControlState => "set_coaxial_control_state",
            Self::SetDisarmingLinkage => "set_disarming_linkage",
            Self::GetConfig => "get_config",
            Self::GetSystemInfo => "get_system_info",
            Self::GetSoftwareVersion => "get_software_version",
            Self::GetMachineName => "get_machine_name",
            Self::GetVendor => "get_vendor",
            Self::GetDeviceType => "get_device_type",
            Self::GetCoaxialControlStatus => "get_coaxial_control_status",
        }
    }

    /// Check if this operation only reads device state
    pub fn is_read(self) -> bool {
        matches!(
            self,
            Self::GetConfig
                | Self::GetSystemInfo
                | Self::GetSoftwareVersion
                | Self::GetMachineName
                | Self::GetVendor
                | Self::GetDeviceType
                | Self::GetCoaxialControlStatus
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.service_name() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

/// A validated field value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u8> for FieldValue {
    fn from(n: u8) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

macro_rules! mode_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Option labels as declared in the manifest
            pub const OPTIONS: &'static [&'static str] = &[$($label),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                $(
                    if s.eq_ignore_ascii_case($label) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(Error::Parse(format!(
                    "'{}' is not a valid {} (expected one of {:?})",
                    s,
                    stringify!($name),
                    Self::OPTIONS
                )))
            }
        }
    };
}

mode_enum! {
    /// Infrared illuminator mode
    InfraredMode { Auto => "Auto", On => "On", Off => "Off" }
}

mode_enum! {
    /// Video input profile
    ProfileMode { Day => "Day", Night => "Night" }
}

mode_enum! {
    /// Recording mode
    RecordMode { Auto => "Auto", On => "On", Off => "Off" }
}

mode_enum! {
    /// Profile a `Lighting_V2` entry belongs to
    LightingProfile { Day => "Day", Night => "Night", Scene => "Scene" }
}

mode_enum! {
    /// Output driven through the coaxial control channel
    CoaxialTarget { WhiteLight => "WhiteLight", Siren => "Siren" }
}

/// One camera operation with its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    kind: OperationKind,
    fields: BTreeMap<String, FieldValue>,
}

impl Operation {
    /// Create an operation with no fields
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field, replacing any previous value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build an operation the way the host framework dispatches a service call
    ///
    /// The service name must be known. Field values are taken as-is; run
    /// [`crate::schema::validate`] to check them against the manifest.
    pub fn from_service<I, K>(service: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let kind: OperationKind = service.parse()?;
        Ok(Self {
            kind,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set_infrared_mode(mode: InfraredMode, brightness: u8) -> Self {
        Self::new(OperationKind::SetInfraredMode)
            .with(fields::MODE, mode.as_str())
            .with(fields::BRIGHTNESS, brightness)
    }

    pub fn set_video_profile_mode(mode: ProfileMode) -> Self {
        Self::new(OperationKind::SetVideoProfileMode).with(fields::MODE, mode.as_str())
    }

    pub fn enable_channel_title(channel: u32, enabled: bool) -> Self {
        Self::new(OperationKind::EnableChannelTitle)
            .with(fields::CHANNEL, channel)
            .with(fields::ENABLED, enabled)
    }

    pub fn enable_time_overlay(channel: u32, enabled: bool) -> Self {
        Self::new(OperationKind::EnableTimeOverlay)
            .with(fields::CHANNEL, channel)
            .with(fields::ENABLED, enabled)
    }

    pub fn enable_text_overlay(channel: u32, group: u32, enabled: bool) -> Self {
        Self::new(OperationKind::EnableTextOverlay)
            .with(fields::CHANNEL, channel)
            .with(fields::GROUP, group)
            .with(fields::ENABLED, enabled)
    }

    pub fn enable_custom_overlay(channel: u32, group: u32, enabled: bool) -> Self {
        Self::new(OperationKind::EnableCustomOverlay)
            .with(fields::CHANNEL, channel)
            .with(fields::GROUP, group)
            .with(fields::ENABLED, enabled)
    }

    /// Set the channel title; `texts` fills `text1` and `text2` in order
    pub fn set_channel_title(channel: u32, texts: &[&str]) -> Self {
        Self::new(OperationKind::SetChannelTitle)
            .with(fields::CHANNEL, channel)
            .with_texts(texts, 2)
    }

    /// Set a text overlay; `texts` fills `text1` to `text4` in order
    pub fn set_text_overlay(channel: u32, group: u32, texts: &[&str]) -> Self {
        Self::new(OperationKind::SetTextOverlay)
            .with(fields::CHANNEL, channel)
            .with(fields::GROUP, group)
            .with_texts(texts, 4)
    }

    /// Set a custom overlay; `texts` fills `text1` and `text2` in order
    pub fn set_custom_overlay(channel: u32, group: u32, texts: &[&str]) -> Self {
        Self::new(OperationKind::SetCustomOverlay)
            .with(fields::CHANNEL, channel)
            .with(fields::GROUP, group)
            .with_texts(texts, 2)
    }

    pub fn set_record_mode(mode: RecordMode) -> Self {
        Self::new(OperationKind::SetRecordMode).with(fields::MODE, mode.as_str())
    }

    /// Enable or disable motion detection
    pub fn enable_motion_detection(enabled: bool) -> Self {
        Self::new(OperationKind::EnableMotionDetection).with(fields::ENABLED, enabled)
    }

    /// Switch the white light (not the infrared illuminator) of one profile
    pub fn set_lighting_v2(profile: LightingProfile, enabled: bool, brightness: u8) -> Self {
        Self::new(OperationKind::SetLightingV2)
            .with(fields::PROFILE, profile.as_str())
            .with(fields::ENABLED, enabled)
            .with(fields::BRIGHTNESS, brightness)
    }

    pub fn set_coaxial_control_state(target: CoaxialTarget, enabled: bool) -> Self {
        Self::new(OperationKind::SetCoaxialControlState)
            .with(fields::TARGET, target.as_str())
            .with(fields::ENABLED, enabled)
    }

    /// Toggle the disarming linkage (Event > Disarming)
    pub fn set_disarming_linkage(enabled: bool) -> Self {
        Self::new(OperationKind::SetDisarmingLinkage).with(fields::ENABLED, enabled)
    }

    /// Read a configuration table, e.g. `RecordMode` or `Lighting[0][0]`
    pub fn get_config(name: impl Into<String>) -> Self {
        Self::new(OperationKind::GetConfig).with(fields::NAME, name.into())
    }

    pub fn get_system_info() -> Self {
        Self::new(OperationKind::GetSystemInfo)
    }

    pub fn get_software_version() -> Self {
        Self::new(OperationKind::GetSoftwareVersion)
    }

    pub fn get_machine_name() -> Self {
        Self::new(OperationKind::GetMachineName)
    }

    pub fn get_vendor() -> Self {
        Self::new(OperationKind::GetVendor)
    }

    pub fn get_device_type() -> Self {
        Self::new(OperationKind::GetDeviceType)
    }

    /// Read the speaker and white light state
    pub fn get_coaxial_control_status() -> Self {
        Self::new(OperationKind::GetCoaxialControlStatus)
    }

    fn with_texts(self, texts: &[&str], slots: usize) -> Self {
        texts
            .iter()
            .take(slots)
            .zip(fields::TEXT)
            .fold(self, |op, (text, name)| op.with(name, *text))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_service_name_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.service_name().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_service() {
        let err = "open_door".parse::<OperationKind>().unwrap_err();
        assert_eq!(err, Error::UnknownOperation("open_door".into()));
    }

    #[test]
    fn test_mode_parse_is_case_insensitive() {
        assert_eq!("night".parse::<ProfileMode>().unwrap(), ProfileMode::Night);
        assert_eq!("AUTO".parse::<RecordMode>().unwrap(), RecordMode::Auto);
        assert!("Manual".parse::<InfraredMode>().is_err());
    }

    #[test]
    fn test_typed_constructor_fields() {
        let op = Operation::set_infrared_mode(InfraredMode::On, 40);
        assert_eq!(op.kind(), OperationKind::SetInfraredMode);
        assert_eq!(op.get("mode"), Some(&FieldValue::Text("On".into())));
        assert_eq!(op.get("brightness"), Some(&FieldValue::Integer(40)));
    }

    #[test]
    fn test_texts_fill_slots_in_order() {
        let op = Operation::set_custom_overlay(1, 2, &["Front Porch", "", "ignored"]);
        assert_eq!(op.get("text1").and_then(FieldValue::as_text), Some("Front Porch"));
        assert_eq!(op.get("text2").and_then(FieldValue::as_text), Some(""));
        assert_eq!(op.get("text3"), None);
    }

    #[test]
    fn test_from_service() {
        let op = Operation::from_service(
            "enable_time_overlay",
            [("channel", FieldValue::Integer(3)), ("enabled", FieldValue::Boolean(true))],
        )
        .unwrap();
        assert_eq!(op, Operation::enable_time_overlay(3, true));
    }

    #[test]
    fn test_control_constructors() {
        let op = Operation::set_lighting_v2(LightingProfile::Night, true, 70);
        assert_eq!(op.kind(), OperationKind::SetLightingV2);
        assert_eq!(op.get("profile"), Some(&FieldValue::Text("Night".into())));
        assert_eq!(op.get("brightness"), Some(&FieldValue::Integer(70)));

        let op = Operation::set_coaxial_control_state(CoaxialTarget::Siren, false);
        assert_eq!(op.get("target"), Some(&FieldValue::Text("Siren".into())));
        assert_eq!(op.get("enabled"), Some(&FieldValue::Boolean(false)));

        assert!(OperationKind::GetCoaxialControlStatus.is_read());
        assert!(!OperationKind::EnableMotionDetection.is_read());
        assert_eq!("whitelight".parse::<CoaxialTarget>().unwrap(), CoaxialTarget::WhiteLight);
    }

    #[test]
    fn test_display() {
        let op = Operation::enable_text_overlay(0, 1, false);
        assert_eq!(
            op.to_string(),
            "enable_text_overlay(channel=0, enabled=false, group=1)"
        );
    }
}
