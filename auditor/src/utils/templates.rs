//! External SQL and prompt templates.
//!
//! Templates are plain files with `{name}` placeholders. Substitution is a
//! strict key/value contract: an unknown placeholder is an error rather than
//! partially-rendered output, and replacement values are emitted verbatim in
//! a single pass, so a parameter that itself contains placeholder syntax
//! (for example a raw query string) can never corrupt a later substitution.

use crate::utils::{AuditError, AuditResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Load a template file. Required templates are loaded before any external
/// call is made; a missing file aborts the run.
pub fn load(path: &Path) -> AuditResult<String> {
    fs::read_to_string(path).map_err(|source| AuditError::TemplateLoad {
        path: path.display().to_string(),
        source,
    })
}

/// Render a template by substituting `{name}` placeholders from `params`.
///
/// `{{` and `}}` are literal braces. Placeholder names are restricted to
/// `[A-Za-z0-9_]` so a stray brace in template text fails loudly instead of
/// being silently passed through.
pub fn render(template: &str, params: &HashMap<&str, String>) -> AuditResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            return Err(AuditError::template_syntax("unmatched '}' outside a placeholder"));
        }

        let close = tail
            .find('}')
            .ok_or_else(|| AuditError::template_syntax("unterminated placeholder"))?;
        let key = &tail[1..close];
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AuditError::template_syntax(format!(
                "invalid placeholder name '{}'",
                key
            )));
        }

        match params.get(key) {
            Some(value) => out.push_str(value),
            None => return Err(AuditError::template_missing_key(key)),
        }
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let rendered = render(
            "SELECT * FROM `{project}` WHERE region = '{region}'",
            &params(&[("project", "acme-prod"), ("region", "us-east1")]),
        )
        .unwrap();
        assert_eq!(rendered, "SELECT * FROM `acme-prod` WHERE region = 'us-east1'");
    }

    #[test]
    fn test_render_missing_key_is_an_error() {
        let err = render("{project}.{missing}", &params(&[("project", "p")])).unwrap_err();
        assert!(matches!(err, AuditError::TemplateMissingKey { key } if key == "missing"));
    }

    #[test]
    fn test_render_never_rescans_substituted_values() {
        // A query containing the template's own placeholder syntax must come
        // through verbatim, not trigger a second substitution.
        let rendered = render(
            "Analyze: {query} (region {region})",
            &params(&[("query", "SELECT '{region}' FROM t"), ("region", "eu")]),
        )
        .unwrap();
        assert_eq!(rendered, "Analyze: SELECT '{region}' FROM t (region eu)");
    }

    #[test]
    fn test_render_escaped_braces_are_literal() {
        let rendered = render("{{not_a_key}} {key}", &params(&[("key", "v")])).unwrap();
        assert_eq!(rendered, "{not_a_key} v");
    }

    #[test]
    fn test_render_rejects_malformed_templates() {
        assert!(matches!(
            render("dangling }", &params(&[])),
            Err(AuditError::TemplateSyntax { .. })
        ));
        assert!(matches!(
            render("open {never closed", &params(&[])),
            Err(AuditError::TemplateSyntax { .. })
        ));
        assert!(matches!(
            render("{bad key}", &params(&[])),
            Err(AuditError::TemplateSyntax { .. })
        ));
    }
}
