//! Variable declaration reconciler.
//!
//! Works on the broker module's `init.pp`: the class parameter list bounded by
//! `class <name> (` and `) {`, and the `# VALIDATES` ... `# REPOS` section of
//! `validate_string($name)` calls. New parameters are aligned on the column the
//! existing `=` tokens use; existing lines are never rewritten, apart from adding a
//! missing trailing comma to the parameter that stops being the last one.

use std::collections::HashSet;

use acmq_schemas::{ChangeRequest, ResourceKind};
use tracing::{debug, info};

use crate::naming::ResourceVars;
use crate::outcome::{check_tokens, request_tokens, Artifact, ReconcileError, ReconcileWarning, Reconciled};
use crate::text::{is_identifier_char, leading_ws, unquote, visual_width, SourceLines, TextPatch};

pub const DEFAULT_ALIGNMENT_COLUMN: usize = 60;
const DEFAULT_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableOptions {
    /// `=` column used when the parameter block has no lines to align with.
    pub default_alignment_column: usize,
}

impl Default for VariableOptions {
    fn default() -> Self {
        Self {
            default_alignment_column: DEFAULT_ALIGNMENT_COLUMN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    /// Visual column of `=`.
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationBlock {
    pub parameters: Vec<Parameter>,
    pub validations: Vec<String>,
    pub alignment_column: usize,
}

impl DeclarationBlock {
    pub fn parse(text: &str, opts: &VariableOptions) -> Self {
        let src = SourceLines::new(text);
        let scan = VariablesScan::new(&src);
        DeclarationBlock {
            alignment_column: scan.alignment_column(opts),
            parameters: scan.params.into_iter().map(|(_, p)| p).collect(),
            validations: scan.validations.into_iter().map(|(_, v)| v).collect(),
        }
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableReport {
    pub declarations_added: Vec<String>,
    pub validations_added: Vec<String>,
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// `$name = 'value',` => (name, value, byte index of `=`)
fn declaration(line: &str) -> Option<(&str, &str, usize)> {
    let rest = line.trim_start().strip_prefix('$')?;
    let name_len = rest.find(|c: char| !is_identifier_char(c)).unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let after = rest[name_len..].trim_start();
    let value = after.strip_prefix('=')?;
    if value.starts_with('=') || value.starts_with('>') {
        return None;
    }
    let eq_idx = line.len() - after.len();
    let (value, _) = unquote(value.trim().trim_end_matches(',').trim_end());
    Some((&rest[..name_len], value, eq_idx))
}

/// `validate_string($name)` => name
fn validation(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("validate_string(")?.trim_start().strip_prefix('$')?;
    let end = rest.find(|c: char| !is_identifier_char(c))?;
    rest[end..].trim_start().starts_with(')').then(|| &rest[..end])
}

fn section_marker(line: &str, word: &str) -> bool {
    line.trim_start()
        .strip_prefix('#')
        .map(|rest| rest.trim_start().starts_with(word))
        .unwrap_or(false)
}

struct VariablesScan {
    class_open: Option<usize>,
    class_close: Option<usize>,
    params: Vec<(usize, Parameter)>,
    validates: Option<usize>,
    validations: Vec<(usize, String)>,
    /// Every `$name =` in the file, inside the class block or not.
    declared: HashSet<String>,
    validated: HashSet<String>,
}

impl VariablesScan {
    fn new(src: &SourceLines<'_>) -> Self {
        let mut scan = VariablesScan {
            class_open: None,
            class_close: None,
            params: Vec::new(),
            validates: None,
            validations: Vec::new(),
            declared: HashSet::new(),
            validated: HashSet::new(),
        };
        let mut in_validates = false;

        for (idx, line) in src.iter() {
            let t = line.trim_start();
            if scan.class_open.is_none() && t.starts_with("class ") && t.contains('(') {
                scan.class_open = Some(idx);
                continue;
            }
            let in_params = scan.class_open.is_some() && scan.class_close.is_none();
            if in_params && t.starts_with(')') && t.contains('{') {
                scan.class_close = Some(idx);
                continue;
            }

            if let Some((name, value, eq_idx)) = declaration(line) {
                scan.declared.insert(name.to_string());
                if in_params {
                    scan.params.push((
                        idx,
                        Parameter {
                            name: name.to_string(),
                            value: value.to_string(),
                            column: visual_width(&line[..eq_idx]),
                        },
                    ));
                }
            }

            if scan.validates.is_none() && section_marker(line, "VALIDATES") {
                scan.validates = Some(idx);
                in_validates = true;
                continue;
            }
            if in_validates && section_marker(line, "REPOS") {
                in_validates = false;
            }
            if let Some(name) = validation(line) {
                scan.validated.insert(name.to_string());
                if in_validates {
                    scan.validations.push((idx, name.to_string()));
                }
            }
        }
        if scan.class_open.is_some() && scan.class_close.is_none() {
            // An unterminated parameter list is not a parameter list.
            scan.params.clear();
        }
        scan
    }

    /// Median `=` column of the parameter lines (upper median for even counts).
    fn alignment_column(&self, opts: &VariableOptions) -> usize {
        let mut columns: Vec<usize> = self.params.iter().map(|(_, p)| p.column).collect();
        if columns.is_empty() {
            return opts.default_alignment_column;
        }
        columns.sort_unstable();
        columns[columns.len() / 2]
    }

    fn param_block(&self) -> Option<(usize, usize)> {
        Some((self.class_open?, self.class_close?))
    }
}

fn format_declaration(indent: &str, name: &str, value: &str, column: usize) -> String {
    let head = format!("{indent}${name}");
    let pad = column.saturating_sub(visual_width(&head)).max(1);
    format!("{head}{}= '{value}',", " ".repeat(pad))
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Declare the request's address, anycast and multicast variables if missing.
pub fn reconcile_variables(
    text: &str,
    req: &ChangeRequest,
    opts: &VariableOptions,
) -> Result<Reconciled<VariableReport>, ReconcileError> {
    check_tokens(Artifact::Variables, request_tokens(req))?;

    let src = SourceLines::new(text);
    let scan = VariablesScan::new(&src);
    let vars = ResourceVars::for_resource(&req.name);

    let mut wanted: Vec<(String, String)> = Vec::new();
    let mut push = |name: String, value: &str| {
        if !scan.declared.contains(&name) && !wanted.iter().any(|(n, _)| *n == name) {
            wanted.push((name, value.to_string()));
        }
    };
    match req.resource_kind {
        ResourceKind::Queue => {
            if !scan.declared.contains(&vars.address) {
                push(vars.address.clone(), &req.name);
                push(vars.anycast.clone(), &req.name);
            }
        }
        ResourceKind::Topic => {
            push(vars.address.clone(), &req.name);
            for sub in req.new_subscriptions() {
                push(ResourceVars::multicast(&sub.subscription_name), &sub.subscription_name);
            }
        }
    }

    let mut report = VariableReport::default();
    let mut warnings = Vec::new();
    let mut patch = TextPatch::default();

    if !wanted.is_empty() {
        let column = scan.alignment_column(opts);
        debug!(column, count = wanted.len(), "appending parameter declarations");

        match scan.param_block() {
            Some((open, _)) => {
                let (anchor, indent) = match scan.params.last() {
                    Some((line, _)) => {
                        let content = src.get(*line);
                        if !content.trim_end().ends_with(',') {
                            patch.replace(*line, format!("{},", content.trim_end()));
                        }
                        (*line, leading_ws(content).to_string())
                    }
                    None => (open, DEFAULT_INDENT.to_string()),
                };
                let mut lines = Vec::new();
                if !scan.params.is_empty() {
                    lines.push(String::new());
                }
                lines.extend(wanted.iter().map(|(n, v)| format_declaration(&indent, n, v, column)));
                patch.insert_after(anchor, lines);
            }
            None => {
                warnings.push(ReconcileWarning::marker_not_found(Artifact::Variables, "class parameter list"));
                let mut lines = vec![String::new()];
                lines.extend(wanted.iter().map(|(n, v)| format_declaration(DEFAULT_INDENT, n, v, column)));
                patch.append(lines);
            }
        }
        report.declarations_added = wanted.iter().map(|(n, _)| n.clone()).collect();
    }

    let to_validate: Vec<&String> = wanted
        .iter()
        .map(|(n, _)| n)
        .filter(|n| !scan.validated.contains(*n))
        .collect();
    if !to_validate.is_empty() {
        match scan.validates {
            Some(header) => {
                let (anchor, indent) = match scan.validations.last() {
                    Some((line, _)) => (*line, leading_ws(src.get(*line)).to_string()),
                    None => (header, DEFAULT_INDENT.to_string()),
                };
                patch.insert_after(
                    anchor,
                    to_validate.iter().map(|n| format!("{indent}validate_string(${n})")),
                );
            }
            None => {
                warnings.push(ReconcileWarning::marker_not_found(Artifact::Variables, "# VALIDATES"));
                let mut lines = vec![String::new(), format!("{DEFAULT_INDENT}# VALIDATES")];
                lines.extend(to_validate.iter().map(|n| format!("{DEFAULT_INDENT}validate_string(${n})")));
                patch.append(lines);
            }
        }
        report.validations_added = to_validate.into_iter().cloned().collect();
    }

    let out = if patch.is_empty() { text.to_string() } else { patch.apply(&src) };
    let changed = out != text;
    if changed {
        info!(
            declarations = ?report.declarations_added,
            "variable declarations reconciled"
        );
    }
    Ok(Reconciled {
        text: out,
        changed,
        report,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_parsing_finds_equals_column() {
        let line = "  $address_foo     = 'foo',";
        let (name, value, eq) = declaration(line).unwrap();
        assert_eq!(name, "address_foo");
        assert_eq!(value, "foo");
        assert_eq!(visual_width(&line[..eq]), 19);
        assert!(declaration("  $x == 1").is_none());
        assert!(declaration("  # $x = 1").is_none());
    }

    #[test]
    fn declaration_pads_to_column() {
        let line = format_declaration("  ", "address_foo", "foo", 40);
        assert_eq!(line.find('='), Some(40));
        let long = format_declaration("  ", &"x".repeat(50), "v", 40);
        assert!(long.contains("x = 'v',"));
    }

    #[test]
    fn validation_call_is_recognized() {
        assert_eq!(validation("  validate_string($address_foo)"), Some("address_foo"));
        assert_eq!(validation("  validate_string( $a )"), Some("a"));
        assert_eq!(validation("  validate_bool($a)"), None);
    }
}
