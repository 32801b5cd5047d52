//! Protocol constants

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 80;

/// Default HTTPS port
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Default per-request timeout (seconds)
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Maximum retries for transient network failures
pub const MAX_RETRIES: u32 = 2;

/// First backoff delay between retries (milliseconds)
pub const RETRY_BASE_DELAY_MS: u64 = 100;

/// Backoff ceiling (milliseconds)
pub const RETRY_MAX_DELAY_MS: u64 = 2_000;

/// Joins the lines of a multi-line overlay text
pub const TEXT_SEPARATOR: char = '|';

/// Boolean tokens understood by configManager
pub const TRUE_TOKEN: &str = "true";
pub const FALSE_TOKEN: &str = "false";

/// Prefix on every key returned by getConfig
pub const TABLE_PREFIX: &str = "table.";

/// HTTP headers used by digest authentication
pub mod headers {
    pub const WWW_AUTHENTICATE: &str = "WWW-Authenticate";
    pub const AUTHORIZATION: &str = "Authorization";
}

/// Index values for `VideoInMode[0].Config[0]`
pub mod profile_index {
    pub const DAY: u8 = 0;
    pub const NIGHT: u8 = 1;
}

/// Detector revision requested when enabling motion detection
///
/// Older firmware rejects the key and is retried without it.
pub const MOTION_DETECT_VERSION: &str = "V3.0";

/// Profile index of `Lighting_V2[0][p]`
pub mod lighting_profile {
    pub const DAY: u8 = 0;
    pub const NIGHT: u8 = 1;
    pub const SCENE: u8 = 2;
}

/// Channel, `Type` and `IO` values for coaxialControlIO.cgi
pub mod coaxial {
    /// Channel for `action=control`
    pub const CONTROL_CHANNEL: u8 = 0;
    /// Channel for `action=getStatus`
    pub const STATUS_CHANNEL: u8 = 1;

    pub const WHITE_LIGHT: u8 = 1;
    pub const SIREN: u8 = 2;

    pub const IO_ON: u8 = 1;
    pub const IO_OFF: u8 = 2;
}

/// Values for `RecordMode[0].Mode`
pub mod record_mode {
    pub const AUTO: u8 = 0;
    pub const MANUAL: u8 = 1;
    pub const OFF: u8 = 2;
}
