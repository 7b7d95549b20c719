//! Recipe template rendering.
//!
//! Templates are distro-native recipe files with `{{slot}}` placeholders
//! (at minimum `{{dependencies}}`). Substitution is literal; a slot naming
//! a field that is not in the context is a fatal configuration error.
//! Lone braces pass through untouched so PKGBUILD function bodies survive.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A loaded recipe template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    text: String,
}

impl Template {
    /// Load a template from the templates directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, text })
    }

    /// Build a template from in-memory text (tests).
    pub fn from_text(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    /// Render the template against a substitution context.
    ///
    /// Every `{{slot}}` must have a context entry; extra context entries
    /// are allowed. Pure function of (template, context).
    pub fn render(&self, context: &BTreeMap<&str, String>) -> Result<String> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            match slot_at(after) {
                Some(slot) => {
                    let value = context.get(slot).ok_or_else(|| {
                        anyhow::anyhow!(
                            "Template '{}' references unknown field '{}'",
                            self.name,
                            slot
                        )
                    })?;
                    out.push_str(value);
                    rest = &after[slot.len() + 2..];
                }
                None => {
                    // Not a slot; keep the braces literal.
                    out.push_str("{{");
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// If `text` begins with `ident}}`, return the identifier.
fn slot_at(text: &str) -> Option<&str> {
    let end = text.find("}}")?;
    let candidate = &text[..end];
    if !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(candidate)
    } else {
        None
    }
}
