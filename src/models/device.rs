// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device snapshot derived from the user-agent string.

use serde::{Deserialize, Serialize};

/// Device details captured when a session is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Raw user-agent string as sent by the client
    pub user_agent: String,
    /// Client IP
    pub ip: String,
    /// Browser family: Chrome, Firefox, Safari, Edge, or Unknown
    pub browser: String,
    /// OS family: Windows, macOS, Linux, Android, iOS, or Unknown
    pub os: String,
    /// Device class: Mobile, Tablet, or Desktop
    pub device: String,
}

impl DeviceInfo {
    /// Classify a raw user-agent into fixed browser/OS/device families.
    ///
    /// Best-effort substring matching. Order matters: Edge UAs contain
    /// "Chrome", Chrome UAs contain "Safari", iOS UAs contain "like Mac
    /// OS X", and Android UAs contain "Linux". Anything unrecognized
    /// falls back to Unknown and never blocks session creation.
    pub fn from_user_agent(user_agent: &str, ip: &str) -> Self {
        let ua = user_agent;

        let browser = if ua.contains("Edg") {
            "Edge"
        } else if ua.contains("Chrome") {
            "Chrome"
        } else if ua.contains("Firefox") {
            "Firefox"
        } else if ua.contains("Safari") {
            "Safari"
        } else {
            "Unknown"
        };

        let os = if ua.contains("Windows") {
            "Windows"
        } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("like Mac OS X") {
            "iOS"
        } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
            "macOS"
        } else if ua.contains("Android") {
            "Android"
        } else if ua.contains("Linux") {
            "Linux"
        } else {
            "Unknown"
        };

        let device = if ua.contains("iPad") || (ua.contains("Android") && !ua.contains("Mobile")) {
            "Tablet"
        } else if ua.contains("Mobile") || ua.contains("iPhone") {
            "Mobile"
        } else {
            "Desktop"
        };

        Self {
            user_agent: user_agent.to_string(),
            ip: ip.to_string(),
            browser: browser.to_string(),
            os: os.to_string(),
            device: device.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_user_agent_falls_back_to_unknown() {
        let info = DeviceInfo::from_user_agent("", "10.0.0.1");
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.os, "Unknown");
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.ip, "10.0.0.1");
    }

    #[test]
    fn edge_wins_over_chrome() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
        let info = DeviceInfo::from_user_agent(ua, "1.2.3.4");
        assert_eq!(info.browser, "Edge");
        assert_eq!(info.os, "Windows");
        assert_eq!(info.device, "Desktop");
    }

    #[test]
    fn android_tablet_has_no_mobile_marker() {
        let ua = "Mozilla/5.0 (Linux; Android 13; SM-X710) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        let info = DeviceInfo::from_user_agent(ua, "1.2.3.4");
        assert_eq!(info.os, "Android");
        assert_eq!(info.device, "Tablet");
    }
}
