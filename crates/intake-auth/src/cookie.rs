//! The per-slug device cookie.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

pub const DEVICE_COOKIE_PREFIX: &str = "device_";

/// How long a remembered device keeps its cookie.
pub const REMEMBERED_FOR: SignedDuration = SignedDuration::from_hours(365 * 24);

/// Whether a credential outlives the browsing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialScope {
    /// Persisted as a trusted device; the cookie lasts a year.
    Remembered,
    /// Known only to this process; the cookie dies with the browser session.
    Session,
}

pub fn device_cookie_name(slug: &str) -> String {
    format!("{DEVICE_COOKIE_PREFIX}{slug}")
}

/// Build the `Set-Cookie` header value carrying a device credential.
///
/// Always `SameSite=Strict` and `HttpOnly`; `Secure` when served over TLS.
/// Remembered credentials get `Max-Age` and `Expires` one year out, session
/// credentials get neither.
pub fn set_cookie_header(
    slug: &str,
    token: &str,
    scope: CredentialScope,
    secure: bool,
    now: Timestamp,
) -> String {
    let mut header = format!(
        "{}={token}; Path=/; SameSite=Strict; HttpOnly",
        device_cookie_name(slug)
    );

    if secure {
        header.push_str("; Secure");
    }

    if scope == CredentialScope::Remembered {
        header.push_str(&format!("; Max-Age={}", REMEMBERED_FOR.as_secs()));
        if let Ok(expires) = now.checked_add(REMEMBERED_FOR) {
            header.push_str(&format!(
                "; Expires={}",
                expires.strftime("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
    }

    header
}

/// Pull the device credential for `slug` out of a `Cookie` request header.
pub fn read_device_cookie(cookie_header: &str, slug: &str) -> Option<String> {
    let name = device_cookie_name(slug);
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
