//! In-place patching of the card templates.
//!
//! The templates are never parsed as XML. Each editable region is found by a
//! pattern around its opening and closing tags and only the text between
//! them is swapped, so every other byte of the file survives untouched. A
//! region whose markup does not match the pattern is left as is.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

use crate::stats::Stats;

/// Opening tag of the block that receives the avatar art.
const ASCII_ANCHOR: &str = r#"<text x="30" y="55" class="ascii-art ascii">"#;
const ASCII_X: i32 = 50;
const LINE_HEIGHT: i32 = 11;

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Finds an editable region. The pattern must capture the opening tag as
/// group 1 and the closing tag as group 2; whatever lies between is the inner
/// text that gets replaced.
pub struct SpanLocator {
    pattern: Regex,
}

impl SpanLocator {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern =
            Regex::new(pattern).with_context(|| format!("Invalid span pattern {pattern:?}"))?;
        Ok(Self { pattern })
    }

    /// `<tspan class="stat-value" id="{id}">…</tspan>` on a single line.
    pub fn stat(id: &str) -> Result<Self> {
        Self::new(&format!(
            r#"(<tspan class="stat-value" id="{}">).*?(</tspan>)"#,
            regex::escape(id)
        ))
    }

    /// The art block, including any whitespace around its current content.
    pub fn ascii_art() -> Result<Self> {
        Self::new(&format!(
            r"(?s)({})\s*.*?\s*(</text>)",
            regex::escape(ASCII_ANCHOR)
        ))
    }

    pub fn is_present(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

pub struct Replacement<'a> {
    pub locator: &'a SpanLocator,
    /// Inserted verbatim; escape before handing it over.
    pub inner: String,
}

/// Apply each replacement in order to every match of its locator.
pub fn replace_spans(text: &str, replacements: &[Replacement<'_>]) -> String {
    let mut out = text.to_string();
    for r in replacements {
        out = r
            .locator
            .pattern
            .replace_all(&out, |caps: &Captures| {
                format!("{}{}{}", &caps[1], r.inner, &caps[2])
            })
            .into_owned();
    }
    out
}

/// One `<tspan>` per row, the first at dy 0 and each following one a line lower.
pub fn ascii_tspans(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let dy = if i == 0 { 0 } else { LINE_HEIGHT };
            format!(
                "    <tspan x=\"{ASCII_X}\" dy=\"{dy}\">{}</tspan>",
                escape_xml(line)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Patch template text with the stats and, if given, the art rows.
pub fn patch(text: &str, stats: &Stats, ascii: Option<&[String]>) -> Result<String> {
    let locators = stats
        .fields()
        .into_iter()
        .map(|(id, value)| SpanLocator::stat(id).map(|l| (l, escape_xml(value))))
        .collect::<Result<Vec<_>>>()?;
    let art_locator = SpanLocator::ascii_art()?;

    let mut replacements: Vec<Replacement> = locators
        .iter()
        .map(|(locator, inner)| Replacement {
            locator,
            inner: inner.clone(),
        })
        .collect();

    if let Some(lines) = ascii {
        replacements.push(Replacement {
            locator: &art_locator,
            inner: format!("\n{}\n  ", ascii_tspans(lines)),
        });
    }

    Ok(replace_spans(text, &replacements))
}

/// Read, patch and overwrite one card.
pub fn update_file(path: &Path, stats: &Stats, ascii: Option<&[String]>) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let patched = patch(&content, stats, ascii)?;
    fs::write(path, patched).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
