//! Build-time diagnostic markers
//!
//! A marker is a snapshot of one problem attached to a resource after a
//! build. Its [`Display`](std::fmt::Display) form is the single-line summary
//! used when build errors are reported through the log.

use std::fmt;
use std::path::PathBuf;

/// Placeholder used when a marker carries no message
pub const NO_MESSAGE: &str = "<no message>";

/// Severity of a diagnostic marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Immutable snapshot of a build diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMarker {
    severity: Severity,
    message: Option<String>,
    code: Option<i32>,
    resource: Option<PathBuf>,
    line: Option<u32>,
}

impl DiagnosticMarker {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            message: None,
            code: None,
            resource: None,
            line: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_resource(mut self, resource: impl Into<PathBuf>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach a 1-based line number
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(NO_MESSAGE)
    }

    pub fn code(&self) -> i32 {
        self.code.unwrap_or(0)
    }

    pub fn resource(&self) -> Option<&PathBuf> {
        self.resource.as_ref()
    }

    /// The 1-based line, only when it denotes a real line
    pub fn line(&self) -> Option<u32> {
        self.line.filter(|line| *line > 0)
    }
}

impl fmt::Display for DiagnosticMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message: {}; code: {}", self.message(), self.code())?;
        if let Some(resource) = &self.resource {
            write!(f, "; resource: {}", resource.display())?;
        }
        if let Some(line) = self.line() {
            write!(f, "; line: {}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let marker = DiagnosticMarker::new(Severity::Error);
        assert_eq!(marker.message(), "<no message>");
        assert_eq!(marker.code(), 0);
        assert_eq!(marker.to_string(), "message: <no message>; code: 0");
    }

    #[test]
    fn test_full_marker_format() {
        let marker = DiagnosticMarker::error("unclosed '('")
            .with_code(1001)
            .with_resource("/work/app/src/main.kst")
            .with_line(12);
        assert_eq!(
            marker.to_string(),
            "message: unclosed '('; code: 1001; resource: /work/app/src/main.kst; line: 12"
        );
    }

    #[test]
    fn test_line_zero_is_omitted() {
        let marker = DiagnosticMarker::error("boom")
            .with_resource("/a.kst")
            .with_line(0);
        assert_eq!(marker.line(), None);
        assert_eq!(marker.to_string(), "message: boom; code: 0; resource: /a.kst");
    }

    #[test]
    fn test_line_without_resource() {
        let marker = DiagnosticMarker::error("boom").with_line(3);
        assert_eq!(marker.to_string(), "message: boom; code: 0; line: 3");
    }

    #[test]
    fn test_severity() {
        assert!(DiagnosticMarker::error("x").is_error());
        assert!(!DiagnosticMarker::new(Severity::Warning).is_error());
    }
}
