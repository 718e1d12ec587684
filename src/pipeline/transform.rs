// src/pipeline/transform.rs

//! Built-in per-file operations and the [`Transform`] seam.
//!
//! External tools (Sass, minifiers, image optimizers) are invoked as `cmd`
//! tasks through `exec`; the transforms here cover the operations the
//! original build wired up in-process: concatenation, renaming to a
//! `.min`-style name, and rewriting HTML build blocks to point at the
//! minified bundles.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::config::StepSpec;
use crate::errors::{AssetforgeError, Result};
use crate::pipeline::asset::Asset;

/// An ordered operation inside a pipeline step.
///
/// Takes the current batch of in-memory assets and returns a transformed
/// batch, or a terminal error for the step. Implementations must be pure
/// with respect to the filesystem: reading sources and writing results is
/// the enclosing step's job.
pub trait Transform: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;
    fn apply(&self, batch: Vec<Asset>) -> Result<Vec<Asset>>;
}

/// Build a boxed transform from its config representation.
pub fn from_spec(spec: &StepSpec) -> Result<Box<dyn Transform>> {
    match spec {
        StepSpec::Concat { output } => Ok(Box::new(Concat::new(output))),
        StepSpec::Rename { suffix, extension } => Ok(Box::new(Rename {
            suffix: suffix.clone(),
            extension: extension.clone(),
        })),
        StepSpec::HtmlReplace { replacements } => {
            Ok(Box::new(HtmlReplace::new(replacements.clone())?))
        }
    }
}

/// Concatenate the whole batch, in batch order, into a single asset.
#[derive(Debug)]
pub struct Concat {
    output: String,
}

impl Concat {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl Transform for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, batch: Vec<Asset>) -> Result<Vec<Asset>> {
        let mut contents = Vec::new();
        for asset in &batch {
            contents.extend_from_slice(&asset.contents);
            // Keep source files separable when they don't end in a newline.
            if !asset.contents.ends_with(b"\n") {
                contents.push(b'\n');
            }
        }
        Ok(vec![Asset::new(self.output.clone(), contents)])
    }
}

/// Rename each asset: insert a suffix before the extension and/or swap the
/// extension (`main.js` + suffix `.min` -> `main.min.js`).
#[derive(Debug)]
pub struct Rename {
    pub suffix: Option<String>,
    pub extension: Option<String>,
}

impl Transform for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, batch: Vec<Asset>) -> Result<Vec<Asset>> {
        Ok(batch
            .into_iter()
            .map(|asset| {
                let new_name = renamed(
                    &asset.file_name(),
                    self.suffix.as_deref(),
                    self.extension.as_deref(),
                );
                asset.with_file_name(&new_name)
            })
            .collect())
    }
}

/// Apply suffix/extension renaming to a bare file name.
///
/// Shared with config validation, which needs to predict concat output names
/// for duplicate-output detection.
pub fn renamed(name: &str, suffix: Option<&str>, extension: Option<&str>) -> String {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let ext = extension.or(ext);
    let suffix = suffix.unwrap_or("");

    match ext {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    }
}

/// Rewrite `<!-- build:<name> --> ... <!-- endbuild -->` blocks.
///
/// Each named block is replaced with a single reference to the configured
/// replacement path: a `<link>` for `.css`, a `<script>` for `.js`, and the
/// raw value otherwise. Blocks with no configured replacement are left
/// untouched.
#[derive(Debug)]
pub struct HtmlReplace {
    replacements: BTreeMap<String, String>,
    block_re: Regex,
}

impl HtmlReplace {
    pub fn new(replacements: BTreeMap<String, String>) -> Result<Self> {
        let block_re = Regex::new(
            r"(?s)<!--\s*build:(?P<name>[\w-]+)\s*-->.*?<!--\s*endbuild\s*-->",
        )
        .map_err(|e| AssetforgeError::ConfigError(format!("html_replace regex: {e}")))?;

        Ok(Self {
            replacements,
            block_re,
        })
    }

    fn reference_for(path: &str) -> String {
        if path.ends_with(".css") {
            format!(r#"<link rel="stylesheet" href="{path}">"#)
        } else if path.ends_with(".js") {
            format!(r#"<script src="{path}"></script>"#)
        } else {
            path.to_string()
        }
    }
}

impl Transform for HtmlReplace {
    fn name(&self) -> &'static str {
        "html_replace"
    }

    fn apply(&self, batch: Vec<Asset>) -> Result<Vec<Asset>> {
        batch
            .into_iter()
            .map(|asset| {
                let file = asset.rel_path.to_string_lossy().into_owned();
                let text = asset
                    .text()
                    .map_err(|msg| AssetforgeError::transform(&file, msg))?;

                let rewritten = self
                    .block_re
                    .replace_all(text, |caps: &regex::Captures<'_>| {
                        match self.replacements.get(&caps["name"]) {
                            Some(path) => Self::reference_for(path),
                            None => caps[0].to_string(),
                        }
                    })
                    .into_owned();

                Ok(Asset::new(asset.rel_path, rewritten.into_bytes()))
            })
            .collect()
    }
}
