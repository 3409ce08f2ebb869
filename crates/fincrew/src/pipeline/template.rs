//! Prompt templates with `{name}` placeholders.
//!
//! A placeholder is `{` + identifier + `}`. `{{` and `}}` render as literal
//! braces. Any other brace text is left untouched. Rendering is a single pass:
//! substituted values are never scanned for further placeholders.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
    placeholders: Vec<String>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> Self {
        let mut placeholders: Vec<String> = Vec::new();
        for caps in placeholder_regex().captures_iter(source) {
            if let Some(name) = caps.get(1) {
                if !placeholders.iter().any(|p| p == name.as_str()) {
                    placeholders.push(name.as_str().to_string());
                }
            }
        }

        Self {
            source: source.to_string(),
            placeholders,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names, in order of first appearance.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Substitutes every placeholder using `lookup`.
    ///
    /// Returns the name of the first unbound placeholder on failure.
    pub fn render<'a, F>(&self, lookup: F) -> Result<String, String>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        if let Some(missing) = self.placeholders.iter().find(|p| lookup(p.as_str()).is_none()) {
            return Err(missing.clone());
        }

        let rendered = placeholder_regex().replace_all(&self.source, |caps: &Captures| {
            match caps.get(1) {
                Some(name) => lookup(name.as_str()).unwrap_or_default().to_string(),
                None if &caps[0] == "{{" => "{".to_string(),
                None => "}".to_string(),
            }
        });

        Ok(rendered.into_owned())
    }
}
