//! Check outcomes and their mapping onto monitoring exit codes

use std::fmt;

/// Name printed in front of every result line
pub const CHECK_NAME: &str = "SidekiqDeadQueue";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    pub fn exit_code(&self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub severity: Severity,
    pub message: String,
}

impl CheckOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { severity: Severity::Ok, message: message.into() }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self { severity: Severity::Critical, message: message.into() }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self { severity: Severity::Unknown, message: message.into() }
    }

    pub fn exit_code(&self) -> i32 {
        self.severity.exit_code()
    }

    /// Single result line, e.g. `SidekiqDeadQueue OK: dead queue is empty`
    pub fn render(&self) -> String {
        format!("{} {}: {}", CHECK_NAME, self.severity, self.message)
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
    }

    #[test]
    fn test_render() {
        let outcome = CheckOutcome::critical("dead queue not empty (3 entries)");
        assert_eq!(
            outcome.render(),
            "SidekiqDeadQueue CRITICAL: dead queue not empty (3 entries)"
        );
        assert_eq!(outcome.to_string(), outcome.render());
        assert_eq!(outcome.exit_code(), 2);
    }
}
