//! Session data: admin credentials, the load snapshot and the state machine

use crate::Secret;
use chrono::{DateTime, Utc};

/// Admin credentials, kept in memory for the length of a session
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: Secret,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Secret {
        &self.password
    }
}

/// CPU and memory load reported by the gateway at login time
///
/// Values are percentages as sent by the server; they are not refreshed
/// after login.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub cpu: f64,
    pub memory: f64,
    pub captured_at: DateTime<Utc>,
}

impl SystemStats {
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self {
            cpu,
            memory,
            captured_at: Utc::now(),
        }
    }

    /// CPU load as a progress bar value out of 100
    pub fn cpu_bar(&self) -> u8 {
        bar_value(self.cpu)
    }

    /// Memory usage as a progress bar value out of 100
    pub fn memory_bar(&self) -> u8 {
        bar_value(self.memory)
    }
}

fn bar_value(percent: f64) -> u8 {
    if percent.is_nan() {
        return 0;
    }
    percent.clamp(0.0, 100.0).round() as u8
}

/// Login state of the dashboard
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn {
        credentials: Credentials,
        stats: SystemStats,
    },
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_values_are_clamped() {
        let stats = SystemStats::new(42.0, 17.0);
        assert_eq!(stats.cpu_bar(), 42);
        assert_eq!(stats.memory_bar(), 17);

        assert_eq!(SystemStats::new(130.0, -4.0).cpu_bar(), 100);
        assert_eq!(SystemStats::new(130.0, -4.0).memory_bar(), 0);
        assert_eq!(SystemStats::new(f64::NAN, 49.6).cpu_bar(), 0);
        assert_eq!(SystemStats::new(f64::NAN, 49.6).memory_bar(), 50);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_default_state_is_logged_out() {
        assert!(!SessionState::default().is_logged_in());
    }
}
