//! Dahua CGI command definitions

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// CGI endpoints under `/cgi-bin/`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cgi {
    ConfigManager,
    MagicBox,
    CoaxialControlIo,
}

impl Cgi {
    pub fn path(self) -> &'static str {
        match self {
            Self::ConfigManager => "/cgi-bin/configManager.cgi",
            Self::MagicBox => "/cgi-bin/magicBox.cgi",
            Self::CoaxialControlIo => "/cgi-bin/coaxialControlIO.cgi",
        }
    }
}

/// Protocol commands (the `action=` parameter of a CGI)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    // configManager.cgi
    SetConfig,
    GetConfig,

    // magicBox.cgi
    GetSystemInfo,
    GetSoftwareVersion,
    GetMachineName,
    GetVendor,
    GetDeviceType,

    // coaxialControlIO.cgi
    Control,
    GetStatus,
}

impl Command {
    pub const ALL: [Self; 9] = [
        Self::SetConfig,
        Self::GetConfig,
        Self::GetSystemInfo,
        Self::GetSoftwareVersion,
        Self::GetMachineName,
        Self::GetVendor,
        Self::GetDeviceType,
        Self::Control,
        Self::GetStatus,
    ];

    /// CGI this command is sent to
    pub fn cgi(self) -> Cgi {
        match self {
            Self::SetConfig | Self::GetConfig => Cgi::ConfigManager,
            Self::Control | Self::GetStatus => Cgi::CoaxialControlIo,
            _ => Cgi::MagicBox,
        }
    }

    /// Get command name as sent in `action=`
    pub fn name(self) -> &'static str {
        match self {
            Self::SetConfig => "setConfig",
            Self::GetConfig => "getConfig",
            Self::GetSystemInfo => "getSystemInfo",
            Self::GetSoftwareVersion => "getSoftwareVersion",
            Self::GetMachineName => "getMachineName",
            Self::GetVendor => "getVendor",
            Self::GetDeviceType => "getDeviceType",
            Self::Control => "control",
            Self::GetStatus => "getStatus",
        }
    }

    /// Check if the command changes device state
    pub fn is_write(self) -> bool {
        matches!(self, Self::SetConfig | Self::Control)
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name() == s)
            .ok_or_else(|| Error::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?action={}", self.cgi().path(), self.name())
    }
}
