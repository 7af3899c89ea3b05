//! Template evaluation
//!
//! Templates use ERB-style delimiters around minijinja expressions:
//!
//! ```text
//! Hello <%= name %>
//! <% for host in hosts %>server <%= host %>
//! <% endfor %><%# comments are dropped %>
//! ```
//!
//! Every top-level key of the variable tree is visible to the template by
//! name. Referencing an unbound name is an error. Failures are reported as
//! `false` from [`TemplateEngine::check_renderable`] and
//! [`TemplateEngine::render`]; [`TemplateEngine::evaluate`] keeps the cause.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};
use tracing::debug;

use crate::error::{RndrError, Result};
use crate::vars::VarTree;

/// Evaluates template files against a variable tree
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create an engine configured for ERB-style delimiters
    pub fn new() -> Result<Self> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("<%", "%>")
            .variable_delimiters("<%=", "%>")
            .comment_delimiters("<%#", "%>")
            .build()?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Ok(Self { env })
    }

    /// Read the template at `path` and render it with `vars` bound
    pub fn evaluate(&self, path: &Path, vars: &VarTree) -> Result<String> {
        let body = fs::read_to_string(path).map_err(|e| RndrError::io(path, e))?;
        let ctx = minijinja::Value::from_serialize(vars);
        Ok(self.env.render_str(&body, ctx)?)
    }

    /// True when the template evaluates without error
    ///
    /// The cause of a failure is logged at debug level.
    pub fn check_renderable(&self, path: &Path, vars: &VarTree) -> bool {
        match self.evaluate(path, vars) {
            Ok(_) => true,
            Err(e) => {
                debug!(?path, %e, "check_renderable: template failed");
                false
            }
        }
    }

    /// Evaluate the template and write the result to `output`
    ///
    /// Nothing is written when evaluation fails. The parent directory of
    /// `output` must already exist.
    pub fn render(&self, path: &Path, vars: &VarTree, output: &Path) -> bool {
        match self.render_to(path, vars, output) {
            Ok(()) => true,
            Err(e) => {
                debug!(?path, ?output, %e, "render: template failed");
                false
            }
        }
    }

    /// Like [`render`](Self::render) but keeps the failure cause
    pub fn render_to(&self, path: &Path, vars: &VarTree, output: &Path) -> Result<()> {
        let rendered = self.evaluate(path, vars)?;
        fs::write(output, rendered).map_err(|e| RndrError::io(output, e))
    }
}

/// The render target for a template: its path without the `.<extension>` suffix
pub fn output_path(template: &Path, extension: &str) -> Option<PathBuf> {
    let name = template.file_name()?.to_str()?;
    let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(template.with_file_name(stem))
}
