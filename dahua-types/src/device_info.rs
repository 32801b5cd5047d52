//! Device information structures

use std::fmt;

use chrono::NaiveDate;

/// Device information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// Device serial number
    pub serial_number: String,

    /// Firmware version, without the build suffix
    pub firmware_version: String,

    /// Firmware build date
    pub build_date: Option<NaiveDate>,

    /// Device model, e.g. `IPC-HDW5831R-ZE`
    pub device_type: Option<String>,

    pub hardware_version: Option<String>,

    pub processor: Option<String>,

    /// Device name (user-assigned)
    pub machine_name: Option<String>,

    pub vendor: Option<String>,
}

impl DeviceInfo {
    pub fn new(serial_number: String, firmware_version: String) -> Self {
        Self {
            serial_number,
            firmware_version,
            ..Self::default()
        }
    }

    /// Split a software version such as `2.800.0000016.0.R,build:2020-06-05`
    /// into the version and its build date
    pub fn parse_software_version(raw: &str) -> (String, Option<NaiveDate>) {
        match raw.split_once(",build:") {
            Some((version, date)) => (
                version.trim().to_string(),
                NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok(),
            ),
            None => (raw.trim().to_string(), None),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[SN: {}, FW: {}",
            self.serial_number, self.firmware_version
        )?;
        if let Some(model) = &self.device_type {
            write!(f, ", Model: {model}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_software_version() {
        let (version, date) = DeviceInfo::parse_software_version("2.800.0000016.0.R,build:2020-06-05");
        assert_eq!(version, "2.800.0000016.0.R");
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 6, 5));
    }

    #[test]
    fn test_parse_software_version_without_build() {
        let (version, date) = DeviceInfo::parse_software_version("2.420.0000.0.R");
        assert_eq!(version, "2.420.0000.0.R");
        assert_eq!(date, None);
    }

    #[test]
    fn test_display() {
        let mut info = DeviceInfo::new("4X7C5A1ZAG21L3F".into(), "2.800".into());
        assert_eq!(info.to_string(), "Device[SN: 4X7C5A1ZAG21L3F, FW: 2.800]");

        info.device_type = Some("IPC-HDW5831R-ZE".into());
        assert_eq!(
            info.to_string(),
            "Device[SN: 4X7C5A1ZAG21L3F, FW: 2.800, Model: IPC-HDW5831R-ZE]"
        );
    }
}
