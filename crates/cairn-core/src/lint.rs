//! Manifest lint checks
//!
//! Checks that the synchronization engine relies on but does not enforce
//! itself, most importantly that params and connections never declare the
//! same property (the combined schema would silently let connections win).

use std::fmt;

use crate::error::Result;
use crate::manifest::{BundleManifest, SchemaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LintSeverity {
    Warning,
    Error,
}

impl LintSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub severity: LintSeverity,
    pub message: String,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn errors(&self) -> usize {
        self.count(LintSeverity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(LintSeverity::Warning)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn count(&self, severity: LintSeverity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    fn push(&mut self, severity: LintSeverity, message: String) {
        self.findings.push(LintFinding { severity, message });
    }
}

/// Run all lint checks against a manifest
///
/// Schema shape errors are returned as errors rather than findings, since
/// nothing else can be checked meaningfully on a malformed schema.
pub fn lint_manifest(manifest: &BundleManifest) -> Result<LintReport> {
    let mut report = LintReport::default();

    check_param_connection_collisions(manifest, &mut report)?;

    for kind in [SchemaKind::Params, SchemaKind::Connections, SchemaKind::Artifacts] {
        check_required_declared(manifest, kind, &mut report)?;
    }

    Ok(report)
}

fn check_param_connection_collisions(
    manifest: &BundleManifest,
    report: &mut LintReport,
) -> Result<()> {
    let params = manifest.schemas.params.properties()?;
    let connections = manifest.schemas.connections.properties()?;

    let (Some(params), Some(connections)) = (params, connections) else {
        return Ok(());
    };

    for name in params.keys().filter(|name| connections.contains_key(*name)) {
        report.push(
            LintSeverity::Error,
            format!("`{name}` is declared in both params and connections"),
        );
    }

    Ok(())
}

fn check_required_declared(
    manifest: &BundleManifest,
    kind: SchemaKind,
    report: &mut LintReport,
) -> Result<()> {
    let schema = manifest.schemas.get(kind);
    let properties = schema.properties()?;

    for name in schema.required()? {
        let declared = properties.is_some_and(|p| p.contains_key(&name));
        if !declared {
            report.push(
                LintSeverity::Warning,
                format!("`{kind}.required` lists `{name}` but `{kind}.properties` does not declare it"),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_manifest() {
        let manifest = BundleManifest::from_yaml(
            r#"
name: clean
params:
  properties:
    size: {type: string}
  required: [size]
connections:
  properties:
    network: {type: object}
"#,
        )
        .unwrap();

        let report = lint_manifest(&manifest).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_collision_is_error() {
        let manifest = BundleManifest::from_yaml(
            r#"
name: clash
params:
  properties:
    network: {type: string}
connections:
  properties:
    network: {type: object}
"#,
        )
        .unwrap();

        let report = lint_manifest(&manifest).unwrap();
        assert_eq!(report.errors(), 1);
        assert!(report.findings[0].message.contains("network"));
    }

    #[test]
    fn test_undeclared_required_is_warning() {
        let manifest = BundleManifest::from_yaml(
            r#"
name: ghost
params:
  properties: {}
  required: [ghost]
"#,
        )
        .unwrap();

        let report = lint_manifest(&manifest).unwrap();
        assert_eq!(report.warnings(), 1);
        assert_eq!(report.errors(), 0);
        assert!(report.findings[0].to_string().starts_with("warning:"));
    }
}
