//! Validation check results

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a failed check is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// Which consumer a check is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckScope {
    ClaudeCode,
    CodexCli,
    CrossPlatform,
}

impl CheckScope {
    pub const ALL: [CheckScope; 3] = [
        CheckScope::ClaudeCode,
        CheckScope::CodexCli,
        CheckScope::CrossPlatform,
    ];

    /// Section heading used in human-readable reports
    pub fn label(&self) -> &'static str {
        match self {
            CheckScope::ClaudeCode => "Claude Code Compatibility",
            CheckScope::CodexCli => "Codex CLI Compatibility",
            CheckScope::CrossPlatform => "Cross-Platform Checks",
        }
    }
}

/// Outcome of a single validation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: String,
    pub platform: CheckScope,
    pub passed: bool,
    pub message: String,
    pub severity: Severity,
}

impl CheckResult {
    pub fn pass(check: impl Into<String>, platform: CheckScope, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            platform,
            passed: true,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn fail(
        check: impl Into<String>,
        platform: CheckScope,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            check: check.into(),
            platform,
            passed: false,
            message: message.into(),
            severity,
        }
    }

    /// Status tag used in human-readable reports
    pub fn status_tag(&self) -> &'static str {
        if self.passed {
            return "[PASS]";
        }
        match self.severity {
            Severity::Error => "[FAIL]",
            Severity::Warning => "[WARN]",
            Severity::Info => "[INFO]",
        }
    }
}

/// Tally of a list of check results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub total_checks: usize,
    pub passed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl CheckSummary {
    pub fn from_checks(checks: &[CheckResult]) -> Self {
        let mut summary = CheckSummary {
            total_checks: checks.len(),
            ..Default::default()
        };
        for check in checks {
            if check.passed {
                summary.passed += 1;
                continue;
            }
            match check.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }
}
