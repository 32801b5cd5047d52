//! Static manifest schema
//!
//! Mirrors the selector metadata of the service manifest (`min`, `max`,
//! `step`, `options`, `default`, `required`). The host framework validates
//! incoming service calls with [`validate`]; the command encoder looks fields
//! up here to reject malformed operations that bypassed that validation.

use crate::error::{Error, Result};
use crate::operation::{
    fields, CoaxialTarget, FieldValue, InfraredMode, LightingProfile, Operation, OperationKind,
    ProfileMode, RecordMode,
};

/// How a field is presented and constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Number { min: i64, max: i64, step: i64 },
    Select(&'static [&'static str]),
    Boolean,
    Text,
}

impl Selector {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Number { .. } => "integer",
            Self::Select(_) | Self::Text => "text",
            Self::Boolean => "boolean",
        }
    }
}

/// Declared default for an optional field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Integer(i64),
    Text(&'static str),
    Boolean(bool),
}

impl DefaultValue {
    pub fn to_value(self) -> FieldValue {
        match self {
            Self::Integer(n) => FieldValue::Integer(n),
            Self::Text(s) => FieldValue::Text(s.to_string()),
            Self::Boolean(b) => FieldValue::Boolean(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub selector: Selector,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

impl FieldSchema {
    const fn required(name: &'static str, selector: Selector) -> Self {
        Self {
            name,
            selector,
            required: true,
            default: None,
        }
    }

    const fn optional(name: &'static str, selector: Selector, default: DefaultValue) -> Self {
        Self {
            name,
            selector,
            required: false,
            default: Some(default),
        }
    }

    /// Check a value against this field's selector
    pub fn check(&self, value: &FieldValue) -> Result<()> {
        let wrong_type = || Error::WrongType {
            field: self.name,
            expected: self.selector.type_name(),
            actual: value.type_name(),
        };

        match (self.selector, value) {
            (Selector::Number { min, max, step }, FieldValue::Integer(n)) => {
                let n = *n;
                if n < min || n > max || (step > 1 && (n - min) % step != 0) {
                    return Err(Error::OutOfRange {
                        field: self.name,
                        value: n,
                        min,
                        max,
                        step,
                    });
                }
                Ok(())
            }
            (Selector::Select(options), FieldValue::Text(s)) => {
                if options.iter().any(|o| o.eq_ignore_ascii_case(s)) {
                    Ok(())
                } else {
                    Err(Error::InvalidOption {
                        field: self.name,
                        value: s.clone(),
                        options,
                    })
                }
            }
            (Selector::Boolean, FieldValue::Boolean(_)) => Ok(()),
            (Selector::Text, FieldValue::Text(_)) => Ok(()),
            _ => Err(wrong_type()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSchema {
    pub kind: OperationKind,
    pub description: &'static str,
    pub fields: &'static [FieldSchema],
}

impl OperationSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Channel and group indices accepted by the manifest
pub const INDEX_RANGE: Selector = Selector::Number {
    min: 0,
    max: 100,
    step: 1,
};

const CHANNEL: FieldSchema = FieldSchema::required(fields::CHANNEL, INDEX_RANGE);
const GROUP: FieldSchema = FieldSchema::required(fields::GROUP, INDEX_RANGE);
const ENABLED: FieldSchema = FieldSchema::required(fields::ENABLED, Selector::Boolean);
const BRIGHTNESS: FieldSchema = FieldSchema::optional(
    fields::BRIGHTNESS,
    Selector::Number {
        min: 0,
        max: 100,
        step: 1,
    },
    DefaultValue::Integer(100),
);
const TEXT1: FieldSchema = FieldSchema::optional(fields::TEXT[0], Selector::Text, DefaultValue::Text(""));
const TEXT2: FieldSchema = FieldSchema::optional(fields::TEXT[1], Selector::Text, DefaultValue::Text(""));
const TEXT3: FieldSchema = FieldSchema::optional(fields::TEXT[2], Selector::Text, DefaultValue::Text(""));
const TEXT4: FieldSchema = FieldSchema::optional(fields::TEXT[3], Selector::Text, DefaultValue::Text(""));

/// The manifest, one entry per [`OperationKind`], in declaration order
pub static SCHEMA: [OperationSchema; 21] = [
    OperationSchema {
        kind: OperationKind::SetInfraredMode,
        description: "Set the infrared light mode and brightness",
        fields: &[
            FieldSchema::required(fields::MODE, Selector::Select(InfraredMode::OPTIONS)),
            BRIGHTNESS,
        ],
    },
    OperationSchema {
        kind: OperationKind::SetVideoProfileMode,
        description: "Switch the video profile between day and night",
        fields: &[FieldSchema::required(
            fields::MODE,
            Selector::Select(ProfileMode::OPTIONS),
        )],
    },
    OperationSchema {
        kind: OperationKind::EnableChannelTitle,
        description: "Show or hide the channel title overlay",
        fields: &[CHANNEL, ENABLED],
    },
    OperationSchema {
        kind: OperationKind::EnableTimeOverlay,
        description: "Show or hide the time overlay",
        fields: &[CHANNEL, ENABLED],
    },
    OperationSchema {
        kind: OperationKind::EnableTextOverlay,
        description: "Show or hide a text overlay group",
        fields: &[CHANNEL, GROUP, ENABLED],
    },
    OperationSchema {
        kind: OperationKind::EnableCustomOverlay,
        description: "Show or hide a custom overlay group",
        fields: &[CHANNEL, GROUP, ENABLED],
    },
    OperationSchema {
        kind: OperationKind::SetChannelTitle,
        description: "Set the channel title text",
        fields: &[CHANNEL, TEXT1, TEXT2],
    },
    OperationSchema {
        kind: OperationKind::SetTextOverlay,
        description: "Set the text of a text overlay group",
        fields: &[CHANNEL, GROUP, TEXT1, TEXT2, TEXT3, TEXT4],
    },
    OperationSchema {
        kind: OperationKind::SetCustomOverlay,
        description: "Set the text of a custom overlay group",
        fields: &[CHANNEL, GROUP, TEXT1, TEXT2],
    },
    OperationSchema {
        kind: OperationKind::SetRecordMode,
        description: "Set the recording mode",
        fields: &[FieldSchema::required(
            fields::MODE,
            Selector::Select(RecordMode::OPTIONS),
        )],
    },
    OperationSchema {
        kind: OperationKind::EnableMotionDetection,
        description: "Enable or disable motion detection",
        fields: &[ENABLED],
    },
    OperationSchema {
        kind: OperationKind::SetLightingV2,
        description: "Switch the white light of a day, night or scene profile",
        fields: &[
            FieldSchema::required(fields::PROFILE, Selector::Select(LightingProfile::OPTIONS)),
            ENABLED,
            BRIGHTNESS,
        ],
    },
    OperationSchema {
        kind: OperationKind::SetCoaxialControlState,
        description: "Drive the white light or siren over coaxial control",
        fields: &[
            FieldSchema::required(fields::TARGET, Selector::Select(CoaxialTarget::OPTIONS)),
            ENABLED,
        ],
    },
    OperationSchema {
        kind: OperationKind::SetDisarmingLinkage,
        description: "Enable or disable the disarming linkage",
        fields: &[ENABLED],
    },
    OperationSchema {
        kind: OperationKind::GetConfig,
        description: "Read a configuration table",
        fields: &[FieldSchema::required(fields::NAME, Selector::Text)],
    },
    OperationSchema {
        kind: OperationKind::GetSystemInfo,
        description: "Read device type, serial number and hardware details",
        fields: &[],
    },
    OperationSchema {
        kind: OperationKind::GetSoftwareVersion,
        description: "Read the firmware version",
        fields: &[],
    },
    OperationSchema {
        kind: OperationKind::GetMachineName,
        description: "Read the device name",
        fields: &[],
    },
    OperationSchema {
        kind: OperationKind::GetVendor,
        description: "Read the vendor",
        fields: &[],
    },
    OperationSchema {
        kind: OperationKind::GetDeviceType,
        description: "Read the device model",
        fields: &[],
    },
    OperationSchema {
        kind: OperationKind::GetCoaxialControlStatus,
        description: "Read the speaker and white light state",
        fields: &[],
    },
];

/// Look up the schema of an operation kind
pub fn lookup(kind: OperationKind) -> &'static OperationSchema {
    // SCHEMA is declared in OperationKind::ALL order
    &SCHEMA[kind as usize]
}

/// Validate an operation the way the host framework does before dispatch
///
/// Rejects unknown fields, missing required fields, wrong value types,
/// out-of-range numbers and unknown select options.
pub fn validate(operation: &Operation) -> Result<()> {
    let schema = lookup(operation.kind());

    for (name, value) in operation.fields() {
        let field = schema.field(name).ok_or_else(|| Error::UnknownField {
            operation: operation.kind().service_name(),
            field: name.clone(),
        })?;
        field.check(value)?;
    }

    for field in schema.fields.iter().filter(|f| f.required) {
        if operation.get(field.name).is_none() {
            return Err(Error::MissingField {
                operation: operation.kind().service_name(),
                field: field.name,
            });
        }
    }

    Ok(())
}

/// Fill in declared defaults for any optional field the caller left out
pub fn apply_defaults(operation: Operation) -> Operation {
    let schema = lookup(operation.kind());
    schema
        .fields
        .iter()
        .filter_map(|f| f.default.map(|d| (f.name, d)))
        .fold(operation, |op, (name, default)| {
            if op.get(name).is_some() {
                op
            } else {
                op.with(name, default.to_value())
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_order_matches_kinds() {
        for kind in OperationKind::ALL {
            assert_eq!(lookup(kind).kind, kind);
        }
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        validate(&Operation::enable_text_overlay(0, 0, true)).unwrap();
        validate(&Operation::enable_text_overlay(100, 100, true)).unwrap();
    }

    #[test]
    fn test_validate_rejects_out_of_range_channel() {
        let err = validate(&Operation::enable_text_overlay(101, 0, true)).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { field: "channel", value: 101, .. }));
    }

    #[test]
    fn test_validate_rejects_unknown_option() {
        let op = Operation::new(OperationKind::SetRecordMode).with("mode", "Manual");
        assert!(matches!(validate(&op), Err(Error::InvalidOption { field: "mode", .. })));
    }

    #[test]
    fn test_validate_rejects_missing_and_unknown_fields() {
        let op = Operation::new(OperationKind::EnableTimeOverlay).with("channel", 1u32);
        assert_eq!(
            validate(&op),
            Err(Error::MissingField {
                operation: "enable_time_overlay",
                field: "enabled",
            })
        );

        let op = Operation::enable_time_overlay(1, true).with("entity_id", "camera.porch");
        assert!(matches!(validate(&op), Err(Error::UnknownField { .. })));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let op = Operation::new(OperationKind::EnableChannelTitle)
            .with("channel", 0u32)
            .with("enabled", "yes");
        assert_eq!(
            validate(&op),
            Err(Error::WrongType {
                field: "enabled",
                expected: "boolean",
                actual: "text",
            })
        );
    }

    #[test]
    fn test_control_operations_validate() {
        validate(&Operation::enable_motion_detection(true)).unwrap();
        validate(&Operation::set_lighting_v2(LightingProfile::Scene, true, 40)).unwrap();
        validate(&Operation::set_coaxial_control_state(CoaxialTarget::WhiteLight, true)).unwrap();
        validate(&Operation::set_disarming_linkage(false)).unwrap();
        validate(&Operation::get_coaxial_control_status()).unwrap();

        let op = Operation::new(OperationKind::SetCoaxialControlState)
            .with("target", "Horn")
            .with("enabled", true);
        assert!(matches!(validate(&op), Err(Error::InvalidOption { field: "target", .. })));

        let op = apply_defaults(
            Operation::new(OperationKind::SetLightingV2)
                .with("profile", "Day")
                .with("enabled", true),
        );
        assert_eq!(op.get("brightness"), Some(&FieldValue::Integer(100)));
    }

    #[test]
    fn test_apply_defaults() {
        let op = apply_defaults(
            Operation::new(OperationKind::SetInfraredMode).with("mode", "Auto"),
        );
        assert_eq!(op.get("brightness"), Some(&FieldValue::Integer(100)));

        let op = apply_defaults(Operation::set_text_overlay(0, 0, &["a"]));
        assert_eq!(op.get("text1"), Some(&FieldValue::Text("a".into())));
        assert_eq!(op.get("text4"), Some(&FieldValue::Text(String::new())));
    }
}
