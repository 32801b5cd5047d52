//! Reply parsing
//!
//! Firmware across models is inconsistent, so parsing is lenient: anything
//! that is not recognisably a success or a known error becomes
//! `VendorError(Unknown)` with the raw text, never a panic or a hard error.
//!
//! Typical replies:
//!
//! ```text
//! OK                                   setConfig accepted
//!
//! Error                                setConfig rejected
//! Bad Request!
//!
//! table.RecordMode[0].Mode=0           getConfig / magicBox reads
//! table.RecordMode[0].ModeExtra1=2
//! ```

use tracing::trace;

use crate::outcome::{Outcome, Reply, VendorErrorCode};

/// Parse a reply body
pub fn parse(body: &[u8]) -> Outcome {
    let text = String::from_utf8_lossy(body);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let Some(first) = lines.next() else {
        return vendor_error(VendorErrorCode::Unknown, "empty reply".to_string());
    };

    if first.trim().eq_ignore_ascii_case("error") {
        let message = lines.map(str::trim).collect::<Vec<_>>().join("\n");
        let code = VendorErrorCode::classify(&message);
        let message = if message.is_empty() {
            "Error".to_string()
        } else {
            message
        };
        return vendor_error(code, message);
    }

    let mut entries = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                entries.push((key.trim().to_string(), value.to_string()));
            }
            _ => trace!("Ignoring reply line without a key: {:?}", line),
        }
    }

    // An OK status line must not hide values that follow it
    if entries.is_empty() && first.trim().eq_ignore_ascii_case("ok") {
        return Outcome::Success(None);
    }

    if entries.is_empty() {
        let message = text.trim().to_string();
        return vendor_error(VendorErrorCode::classify(&message), message);
    }

    Outcome::Success(Some(Reply::new(entries)))
}

/// Parse a reply together with its HTTP status
///
/// A non-2xx status is always a `VendorError`; the body refines the code
/// when it says something recognisable.
pub fn parse_response(status: u16, body: &[u8]) -> Outcome {
    let outcome = parse(body);

    if (200..300).contains(&status) {
        return outcome;
    }

    let body_text = String::from_utf8_lossy(body).trim().to_string();
    let message = if body_text.is_empty() {
        format!("HTTP {status}")
    } else {
        body_text
    };

    match outcome {
        Outcome::VendorError { code, message } if code != VendorErrorCode::Unknown => {
            vendor_error(code, message)
        }
        Outcome::VendorError { message: detail, .. } if !body.is_empty() => {
            vendor_error(VendorErrorCode::from_status(status), detail)
        }
        _ => vendor_error(VendorErrorCode::from_status(status), message),
    }
}

fn vendor_error(code: VendorErrorCode, message: String) -> Outcome {
    Outcome::VendorError { code, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_ok() {
        assert_eq!(parse(b"OK\r\n"), Outcome::Success(None));
        assert_eq!(parse(b"ok"), Outcome::Success(None));
        assert_eq!(parse(b"\r\nOK\r\n\r\n"), Outcome::Success(None));
    }

    #[test]
    fn test_ok_line_keeps_values() {
        let outcome = parse(b"table.A=1\r\nOK\r\n");
        assert_eq!(outcome.reply().unwrap().get("A"), Some("1"));

        let outcome = parse(b"OK\r\nstatus.status.Speaker=Off\r\n");
        assert_eq!(outcome.reply().unwrap().get("status.status.Speaker"), Some("Off"));
    }

    #[test]
    fn test_ok_after_other_text_is_not_success() {
        assert!(matches!(
            parse(b"Unexpected\r\nOK\r\n"),
            Outcome::VendorError {
                code: VendorErrorCode::Unknown,
                ..
            }
        ));
    }

    #[test]
    fn test_error_with_message() {
        assert_eq!(
            parse(b"Error\r\nBad Request!\r\n"),
            Outcome::VendorError {
                code: VendorErrorCode::BadRequest,
                message: "Bad Request!".into(),
            }
        );
        assert_eq!(
            parse(b"Error\r\nInvalid Authority!"),
            Outcome::VendorError {
                code: VendorErrorCode::InvalidAuthority,
                message: "Invalid Authority!".into(),
            }
        );
    }

    #[test]
    fn test_bare_error() {
        assert_eq!(
            parse(b"Error"),
            Outcome::VendorError {
                code: VendorErrorCode::Unknown,
                message: "Error".into(),
            }
        );
    }

    #[test]
    fn test_key_values() {
        let outcome = parse(
            b"table.VideoInMode[0].Config[0]=1\r\n\
              table.VideoInMode[0].Mode=0\r\n\
              table.VideoInMode[0].TimeSection[0][0]=0 00:00:00-24:00:00\r\n",
        );
        let reply = outcome.reply().unwrap();
        assert_eq!(reply.len(), 3);
        assert_eq!(reply.get("VideoInMode[0].Config[0]"), Some("1"));
        assert_eq!(
            reply.get("VideoInMode[0].TimeSection[0][0]"),
            Some("0 00:00:00-24:00:00")
        );
    }

    #[test]
    fn test_value_may_contain_equals() {
        let outcome = parse(b"version=2.800.0000016.0.R,build:2020-06-05\nnote=a=b");
        let reply = outcome.reply().unwrap();
        assert_eq!(reply.get("version"), Some("2.800.0000016.0.R,build:2020-06-05"));
        assert_eq!(reply.get("note"), Some("a=b"));
    }

    #[test]
    fn test_lines_without_key_are_ignored() {
        let outcome = parse(b"name=FrontDoorCam\r\ngarbage\r\n");
        assert_eq!(outcome.reply().unwrap().get("name"), Some("FrontDoorCam"));
    }

    #[test]
    fn test_unrecognised_payload() {
        assert_eq!(
            parse(b"<html>Unauthorized</html>"),
            Outcome::VendorError {
                code: VendorErrorCode::Unknown,
                message: "<html>Unauthorized</html>".into(),
            }
        );
        assert_eq!(
            parse(b""),
            Outcome::VendorError {
                code: VendorErrorCode::Unknown,
                message: "empty reply".into(),
            }
        );
        assert!(matches!(
            parse(&[0xff, 0xfe, 0x00]),
            Outcome::VendorError { code: VendorErrorCode::Unknown, .. }
        ));
    }

    #[test]
    fn test_bare_known_token() {
        assert_eq!(
            parse(b"Bad Request!"),
            Outcome::VendorError {
                code: VendorErrorCode::BadRequest,
                message: "Bad Request!".into(),
            }
        );
    }

    #[test]
    fn test_status_overrides_success_body() {
        assert_eq!(
            parse_response(500, b"OK"),
            Outcome::VendorError {
                code: VendorErrorCode::Unknown,
                message: "OK".into(),
            }
        );
        assert_eq!(
            parse_response(501, b""),
            Outcome::VendorError {
                code: VendorErrorCode::NotImplemented,
                message: "HTTP 501".into(),
            }
        );
    }

    #[test]
    fn test_status_body_refines_code() {
        assert_eq!(
            parse_response(400, b"Error\r\nBad Request!\r\n"),
            Outcome::VendorError {
                code: VendorErrorCode::BadRequest,
                message: "Bad Request!".into(),
            }
        );
        assert_eq!(
            parse_response(403, b"Error\r\nSomething odd\r\n"),
            Outcome::VendorError {
                code: VendorErrorCode::InvalidAuthority,
                message: "Something odd".into(),
            }
        );
    }

    #[test]
    fn test_success_status_passes_through() {
        assert_eq!(parse_response(200, b"OK\r\n"), Outcome::Success(None));
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(body in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = parse(&body);
            let _ = parse_response(200, &body);
            let _ = parse_response(400, &body);
        }

        #[test]
        fn prop_key_value_lines_round_trip(
            pairs in prop::collection::vec(("[A-Za-z][A-Za-z0-9.\\[\\]]{0,20}", "[A-Za-z0-9 :,-]{0,20}"), 1..8)
        ) {
            let body = pairs
                .iter()
                .map(|(k, v)| format!("table.{k}={v}\r\n"))
                .collect::<String>();
            let outcome = parse(body.as_bytes());
            let reply = outcome.reply().expect("key=value body parses as a reply");
            prop_assert_eq!(reply.len(), pairs.len());
            let (first_key, first_value) = &pairs[0];
            prop_assert_eq!(reply.get(first_key), Some(first_value.as_str()));
        }
    }
}
