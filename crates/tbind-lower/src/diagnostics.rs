//! Diagnostic records and their two renderings: ariadne reports for
//! terminals and one JSON object per line for tools.

use std::fmt;
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde::{Serialize, Serializer};
use tbind_common::span::{LineIndex, Span};
use tbind_hir::ConstructId;
use tbind_parser::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Host grammar error from the parser.
    Parse,
    MalformedBindingMarker,
    IncompleteConstruct,
    EmptyPipeline,
    UnresolvedBindingReference,
    ShadowWarning,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::Parse => "P0001",
            DiagnosticCode::MalformedBindingMarker => "TB0001",
            DiagnosticCode::IncompleteConstruct => "TB0002",
            DiagnosticCode::EmptyPipeline => "TB0003",
            DiagnosticCode::UnresolvedBindingReference => "TB0004",
            DiagnosticCode::ShadowWarning => "W0001",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::ShadowWarning => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this code rejects the construct it is attached to.
    pub fn is_fatal(self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A secondary label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Related {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub span: Span,
    /// Message for the primary label. Defaults to the main message.
    #[serde(skip)]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Related>,
    /// The construct this diagnostic belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construct: Option<ConstructId>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: code.severity(),
            code,
            message: message.into(),
            span,
            label: None,
            related: Vec::new(),
            construct: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_related(mut self, message: impl Into<String>, span: Span) -> Self {
        self.related.push(Related {
            message: message.into(),
            span,
        });
        self
    }

    pub fn for_construct(mut self, id: ConstructId) -> Self {
        self.construct = Some(id);
        self
    }

    pub fn from_parse_error(err: &ParseError) -> Self {
        let diag = Diagnostic::new(DiagnosticCode::Parse, err.message.clone(), err.span);
        match &err.related {
            Some((message, span)) => diag.with_related(message.clone(), *span),
            None => diag,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// One-line JSON with a `file` field and 1-based line/column added.
    pub fn to_json(&self, file: &str, source: &str) -> String {
        let (line, column) = LineIndex::new(source).line_col(self.span.start);
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| self.plain_json());
        if let Some(object) = value.as_object_mut() {
            object.insert("file".to_string(), file.into());
            object.insert("line".to_string(), line.into());
            object.insert("column".to_string(), column.into());
        }
        value.to_string()
    }

    /// The core fields, built without going through `Serialize`.
    fn plain_json(&self) -> serde_json::Value {
        serde_json::json!({
            "severity": severity_word(self.severity),
            "code": self.code.as_str(),
            "message": self.message,
            "span": { "start": self.span.start, "end": self.span.end },
        })
    }

    /// Render as an ariadne report.
    pub fn render(&self, file: &str, source: &str, color: bool) -> String {
        let config = Config::default().with_color(color);
        let source_len = source.len();

        // ariadne needs a non-empty range inside the source.
        let clamp = |span: Span| -> Range<usize> {
            let s = (span.start as usize).min(source_len);
            let e = (span.end as usize).min(source_len).max(s);
            if s == e {
                s..e.saturating_add(1).min(source_len)
            } else {
                s..e
            }
        };

        let (kind, color_main) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };
        let span = clamp(self.span);
        let label = self.label.clone().unwrap_or_else(|| self.message.clone());

        let mut builder = Report::build(kind, (file, span.clone()))
            .with_code(self.code.as_str())
            .with_message(&self.message)
            .with_config(config)
            .with_label(
                Label::new((file, span))
                    .with_message(label)
                    .with_color(color_main),
            );
        for related in &self.related {
            builder.add_label(
                Label::new((file, clamp(related.span)))
                    .with_message(&related.message)
                    .with_color(Color::Blue),
            );
        }

        let mut buf = Vec::new();
        if builder
            .finish()
            .write((file, Source::from(source)), &mut buf)
            .is_err()
        {
            return format!("{}[{}]: {}\n", severity_word(self.severity), self.code, self.message);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn severity_word(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {} at {}..{}",
            severity_word(self.severity),
            self.code,
            self.message,
            self.span.start,
            self.span.end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_severities() {
        assert_eq!(DiagnosticCode::EmptyPipeline.as_str(), "TB0003");
        assert_eq!(DiagnosticCode::ShadowWarning.severity(), Severity::Warning);
        assert!(DiagnosticCode::UnresolvedBindingReference.is_fatal());
        assert!(!DiagnosticCode::ShadowWarning.is_fatal());
    }

    #[test]
    fn display_is_one_line() {
        let diag = Diagnostic::new(
            DiagnosticCode::MalformedBindingMarker,
            "binding marker is empty",
            Span::new(5, 7),
        );
        assert_eq!(diag.to_string(), "error[TB0001]: binding marker is empty at 5..7");
    }

    #[test]
    fn json_has_location() {
        let source = "let a;\nconst() x = 1;\n";
        let diag = Diagnostic::new(
            DiagnosticCode::MalformedBindingMarker,
            "binding marker is empty",
            Span::new(12, 14),
        )
        .for_construct(ConstructId(0));
        let value: serde_json::Value =
            serde_json::from_str(&diag.to_json("a.js", source)).unwrap();
        assert_eq!(value["code"], "TB0001");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["file"], "a.js");
        assert_eq!(value["line"], 2);
        assert_eq!(value["column"], 6);
        assert_eq!(value["span"]["start"], 12);
        assert_eq!(value["construct"], 0);
        assert!(value.get("related").is_none());
    }

    #[test]
    fn json_location_on_the_first_line() {
        let source = "const() x = 1;\n";
        let diag = Diagnostic::new(
            DiagnosticCode::MalformedBindingMarker,
            "binding marker is empty",
            Span::new(5, 7),
        );
        let value: serde_json::Value =
            serde_json::from_str(&diag.to_json("a.js", source)).unwrap();
        assert_eq!(value["line"], 1);
        assert_eq!(value["column"], 6);
    }

    #[test]
    fn plain_json_keeps_the_core_fields() {
        let diag = Diagnostic::new(
            DiagnosticCode::ShadowWarning,
            "`x` shadows a variable of the enclosing scope",
            Span::new(3, 4),
        );
        let value = diag.plain_json();
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["code"], "W0001");
        assert_eq!(value["message"], "`x` shadows a variable of the enclosing scope");
        assert_eq!(value["span"]["end"], 4);
    }

    #[test]
    fn render_mentions_code_and_labels() {
        let source = "const($) x = $;\n";
        let diag = Diagnostic::new(
            DiagnosticCode::UnresolvedBindingReference,
            "`$` is read before the binding has a value",
            Span::new(13, 14),
        )
        .with_label("step 1 runs before `$` is bound")
        .with_related("binding introduced here", Span::new(6, 7));
        let out = diag.render("a.js", source, false);
        assert!(out.contains("TB0004"), "{out}");
        assert!(out.contains("step 1 runs before `$` is bound"), "{out}");
        assert!(out.contains("binding introduced here"), "{out}");
    }
}
