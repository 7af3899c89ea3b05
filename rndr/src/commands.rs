//! Command implementations
//!
//! Each command resolves what it needs from [`Settings`] and writes its
//! user-facing output to the given writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::*;
use eyre::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::VarsFormat;
use crate::config::Settings;
use crate::discovery;
use crate::template::{TemplateEngine, output_path};
use crate::vars::{self, VarTree};

/// Version line printed by `rndr version`
pub fn version_string() -> String {
    format!("Rndr Version: {}", env!("CARGO_PKG_VERSION"))
}

pub fn version(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", version_string())?;
    Ok(())
}

/// Print every discovered template path
pub fn list(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let templates = discover(settings)?;
    if templates.is_empty() {
        writeln!(out, "No matching results.")?;
    } else {
        for path in templates {
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}

/// Report whether each discovered template renders
pub fn check(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let templates = discover(settings)?;
    let vars = resolve_vars(settings)?;
    let engine = TemplateEngine::new().context("Failed to create template engine")?;

    for path in templates {
        let ok = engine.check_renderable(&path, &vars);
        print_result(out, &path, ok)?;
    }
    Ok(())
}

/// Render each discovered template next to its source
pub fn render(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let templates = discover(settings)?;
    let vars = resolve_vars(settings)?;
    let engine = TemplateEngine::new().context("Failed to create template engine")?;

    for path in templates {
        let Some(target) = output_path(&path, &settings.extension) else {
            debug!(?path, "render: no output path for template");
            print_result(out, &path, false)?;
            continue;
        };

        let ok = engine.render(&path, &vars, &target);
        print_result(out, &target, ok)?;
    }
    Ok(())
}

/// Print the resolved variable tree
pub fn vars(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let format = match settings.format.parse::<VarsFormat>() {
        Ok(format) => format,
        Err(e) => {
            debug!(%e, "vars: rejecting format");
            writeln!(out, "Invalid Format.")?;
            return Ok(());
        }
    };

    debug!(%format, "vars: serializing variables");
    let tree = Value::Object(resolve_vars(settings)?);
    let rendered = match format {
        VarsFormat::Json => serde_json::to_string(&tree).context("Failed to serialize variables as JSON")?,
        VarsFormat::Yaml => serde_yaml::to_string(&tree).context("Failed to serialize variables as YAML")?,
    };
    writeln!(out, "{}", rendered.trim_end())?;
    Ok(())
}

fn discover(settings: &Settings) -> Result<Vec<PathBuf>> {
    let templates = discovery::matches(
        &settings.cwd,
        &settings.template,
        &settings.extension,
        &settings.ignore_file,
    )
    .context("Failed to discover templates")?;
    info!(count = templates.len(), root = ?settings.template, "Template discovery complete");
    Ok(templates)
}

fn resolve_vars(settings: &Settings) -> Result<VarTree> {
    vars::resolve(&settings.vars, settings.strategy, &settings.merge_options)
        .context(format!("Failed to resolve variables from {}", settings.vars.display()))
}

fn print_result(out: &mut impl Write, path: &Path, ok: bool) -> Result<()> {
    let marker = if ok { "[OK]".green() } else { "[FAIL]".red() };
    writeln!(out, "{} {}", path.display(), marker)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Overrides};
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// templates/ with a good, a failing and an ignored template plus vars/
    fn fixture() -> TempDir {
        colored::control::set_override(false);
        let temp = tempdir().unwrap();
        let templates = temp.path().join("templates");
        let vars = temp.path().join("vars");
        fs::create_dir(&templates).unwrap();
        fs::create_dir(&vars).unwrap();

        fs::write(templates.join("a.txt.erb"), "Hello <%= name %>").unwrap();
        fs::write(templates.join("fail.txt.erb"), "<%= undefined_name %>").unwrap();
        fs::write(templates.join("skip.txt.erb"), "Hello <%= name %>").unwrap();
        fs::write(templates.join("ext.txt.tmplt"), "<%= a.x %>-<%= a.y %>").unwrap();
        fs::write(temp.path().join(".rndrignore"), "templates/skip.txt.erb\n").unwrap();

        fs::write(vars.join("a.json"), r#"{"name": "World", "a": {"x": 1}}"#).unwrap();
        fs::write(vars.join("b.yaml"), "a:\n  y: 2\n").unwrap();
        temp
    }

    fn settings(cwd: &Path, overrides: Overrides) -> Settings {
        let overrides = Overrides {
            template: overrides.template.or(Some("templates".into())),
            ..overrides
        };
        Settings::resolve(cwd, &Config::default(), &overrides).unwrap()
    }

    fn output_of(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_list_excludes_ignored() {
        let temp = fixture();
        let settings = settings(temp.path(), Overrides::default());

        let output = output_of(|out| list(&settings, out));
        assert!(output.contains("a.txt.erb"));
        assert!(output.contains("fail.txt.erb"));
        assert!(!output.contains("skip.txt.erb"));
        assert!(!output.contains("ext.txt.tmplt"));
    }

    #[test]
    fn test_list_no_matches() {
        let temp = fixture();
        let overrides = Overrides {
            extension: Some("nothing".to_string()),
            ..Default::default()
        };

        let output = output_of(|out| list(&settings(temp.path(), overrides), out));
        assert_eq!(output, "No matching results.\n");
    }

    #[test]
    fn test_check_reports_each_template() {
        let temp = fixture();
        let settings = settings(temp.path(), Overrides::default());

        let output = output_of(|out| check(&settings, out));
        let a = temp.path().join("templates/a.txt.erb");
        let fail = temp.path().join("templates/fail.txt.erb");
        assert!(output.contains(&format!("{} [OK]\n", a.display())));
        assert!(output.contains(&format!("{} [FAIL]\n", fail.display())));
        assert!(!output.contains("skip.txt.erb"));
        assert!(!temp.path().join("templates/a.txt").exists());
    }

    #[test]
    fn test_render_writes_stripped_paths() {
        let temp = fixture();
        let settings = settings(temp.path(), Overrides::default());

        let output = output_of(|out| render(&settings, out));
        let rendered = temp.path().join("templates/a.txt");
        assert!(output.contains(&format!("{} [OK]\n", rendered.display())));
        assert!(output.contains("fail.txt [FAIL]"));
        assert_eq!(fs::read_to_string(&rendered).unwrap(), "Hello World");
        assert!(!temp.path().join("templates/fail.txt").exists());
        assert!(!temp.path().join("templates/skip.txt").exists());
    }

    #[test]
    fn test_render_alternate_extension_merges_recursively() {
        let temp = fixture();
        let overrides = Overrides {
            extension: Some("tmplt".to_string()),
            ..Default::default()
        };

        let output = output_of(|out| render(&settings(temp.path(), overrides), out));
        assert!(output.contains("ext.txt [OK]"));
        assert!(!output.contains("a.txt"));
        assert_eq!(fs::read_to_string(temp.path().join("templates/ext.txt")).unwrap(), "1-2");
    }

    #[test]
    fn test_render_replace_strategy_drops_nested_keys() {
        let temp = fixture();
        let overrides = Overrides {
            extension: Some("tmplt".to_string()),
            merge: Some(false),
            ..Default::default()
        };

        let output = output_of(|out| render(&settings(temp.path(), overrides), out));
        assert!(output.contains("ext.txt [FAIL]"));
    }

    #[test]
    fn test_vars_yaml_and_json() {
        let temp = fixture();

        let yaml = output_of(|out| vars(&settings(temp.path(), Overrides::default()), out));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["a"]["x"], serde_yaml::Value::from(1));
        assert_eq!(parsed["a"]["y"], serde_yaml::Value::from(2));

        let overrides = Overrides {
            format: Some("JSON".to_string()),
            merge: Some(false),
            ..Default::default()
        };
        let json = output_of(|out| vars(&settings(temp.path(), overrides), out));
        assert_eq!(json, "{\"name\":\"World\",\"a\":{\"y\":2}}\n");
    }

    #[test]
    fn test_vars_invalid_format() {
        let temp = fixture();
        let overrides = Overrides {
            format: Some("xml".to_string()),
            ..Default::default()
        };

        let output = output_of(|out| vars(&settings(temp.path(), overrides), out));
        assert_eq!(output, "Invalid Format.\n");
    }

    #[test]
    fn test_relative_paths_resolve_against_settings_cwd() {
        let temp = fixture();
        let mut settings = settings(temp.path(), Overrides::default());
        settings.template = PathBuf::from("templates");
        settings.ignore_file = PathBuf::from(".rndrignore");

        let output = output_of(|out| list(&settings, out));
        assert!(output.contains(&temp.path().join("templates/a.txt.erb").display().to_string()));
        assert!(!output.contains("skip.txt.erb"));
    }

    #[test]
    fn test_version_string() {
        let output = output_of(|out| version(out));
        assert_eq!(output, format!("Rndr Version: {}\n", env!("CARGO_PKG_VERSION")));
    }
}
