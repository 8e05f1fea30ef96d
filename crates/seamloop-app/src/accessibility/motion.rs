/// Environment override, checked before asking the desktop.
pub const REDUCED_MOTION_ENV: &str = "SEAMLOOP_REDUCED_MOTION";

/// Detects and tracks the reduced-motion preference.
///
/// Read once when the loop is created; changing it mid-session has no effect
/// on a running controller.
#[derive(Debug, Clone)]
pub struct ReducedMotion {
    pub enabled: bool,
    pub user_override: Option<bool>,
}

impl ReducedMotion {
    pub fn detect() -> Self {
        let enabled = std::env::var(REDUCED_MOTION_ENV)
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or_else(detect_system_preference);
        Self {
            enabled,
            user_override: None,
        }
    }

    pub fn should_reduce(&self) -> bool {
        self.user_override.unwrap_or(self.enabled)
    }

    pub fn set_override(&mut self, value: Option<bool>) {
        self.user_override = value;
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "reduce" => Some(true),
        "0" | "false" | "no" | "off" | "no-preference" => Some(false),
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn detect_system_preference() -> bool {
    // GNOME exposes the inverse: enable-animations
    std::process::Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", "enable-animations"])
        .output()
        .ok()
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .is_some_and(|s| s.trim() == "false")
}

#[cfg(not(target_os = "linux"))]
fn detect_system_preference() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" Reduce "), Some(true));
        assert_eq!(parse_flag("no-preference"), Some(false));
        assert_eq!(parse_flag("OFF"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn override_wins() {
        let mut rm = ReducedMotion {
            enabled: false,
            user_override: None,
        };
        assert!(!rm.should_reduce());
        rm.set_override(Some(true));
        assert!(rm.should_reduce());
        rm.set_override(None);
        assert!(!rm.should_reduce());
    }
}
