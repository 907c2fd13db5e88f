mod report;

use clap::{Parser, Subcommand, ValueEnum};
use component_form::check as component_check;
use form_spec::{DirTemplates, FormAssembler, FormConfig, config_schema, parse_config};
use futures::executor::block_on;
use report::{BuildReporter, Verbosity};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Environment fallback for `--templates`.
pub const TEMPLATES_ENV: &str = "GREENTIC_FORM_TEMPLATES";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Declarative form renderer",
    long_about = "Builds forms from JSON configs, binds values and reports skipped descriptors"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Html,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Build a form and print the resulting tree.
    Render {
        /// Path to the form config JSON.
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
        /// Optional JSON file of `{ <control name>: <value> }` to bind after building.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Directory that resolved template paths are read from (defaults to GREENTIC_FORM_TEMPLATES).
        #[arg(long, value_name = "DIR")]
        templates: Option<PathBuf>,
        /// Output format for the rendered tree.
        #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,
        /// Show debug logs and every skipped descriptor.
        #[arg(long, alias = "debug")]
        verbose: bool,
    },
    /// Validate a form config and list the descriptors a render would skip.
    Check {
        /// Path to the form config JSON.
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
    },
    /// Print the JSON schema of form configs.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            config,
            values,
            templates,
            format,
            verbose,
        } => {
            init_tracing(verbose);
            run_render(config, values, templates, format, Verbosity::from_verbose(verbose))
        }
        Command::Check { config } => {
            init_tracing(false);
            run_check(config)
        }
        Command::Schema => run_schema(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_json(path: &Path) -> CliResult<Value> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let value = serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err))?;
    Ok(value)
}

fn load_config(path: &Path) -> CliResult<FormConfig> {
    let raw = read_json(path)?;
    let config = parse_config(&raw).map_err(|err| format!("{}: {}", path.display(), err))?;
    Ok(config)
}

fn resolve_templates_dir(templates: Option<PathBuf>) -> Option<PathBuf> {
    templates
        .or_else(|| env::var_os(TEMPLATES_ENV).map(PathBuf::from))
        .filter(|dir| !dir.as_os_str().is_empty())
}

fn run_render(
    config_path: PathBuf,
    values_path: Option<PathBuf>,
    templates: Option<PathBuf>,
    format: OutputFormat,
    verbosity: Verbosity,
) -> CliResult<()> {
    let config = load_config(&config_path)?;
    let values = values_path.as_deref().map(read_json).transpose()?;

    let mut assembler = FormAssembler::new();
    if let Some(dir) = resolve_templates_dir(templates) {
        debug!(dir = %dir.display(), "reading templates from directory");
        assembler = assembler.with_fetcher(Arc::new(DirTemplates::new(dir)));
    }

    let mut form = assembler.build(&config)?;
    let reports = block_on(form.settle_templates());
    if let Some(values) = values {
        form.apply_values(&values)?;
    }

    let reporter = BuildReporter::new(verbosity);
    reporter.show_diagnostics(form.diagnostics());
    reporter.show_templates(&reports);

    match format {
        OutputFormat::Html => println!("{}", form.to_html()),
        OutputFormat::Json => {
            let payload = json!({
                "tree": form.to_json(),
                "diagnostics": serde_json::to_value(form.diagnostics())?,
                "templates": serde_json::to_value(&reports)?,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(())
}

fn run_check(config_path: PathBuf) -> CliResult<()> {
    let raw = fs::read_to_string(&config_path)
        .map_err(|err| format!("failed to read {}: {}", config_path.display(), err))?;
    let result: Value = serde_json::from_str(&component_check(&raw))?;

    if result.get("valid").and_then(Value::as_bool) != Some(true) {
        let reason = result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        println!("Config result: invalid");
        println!("  {}", reason);
        return Err("config check failed".into());
    }

    println!("Config result: valid");
    let diagnostics = result
        .get("diagnostics")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !diagnostics.is_empty() {
        println!("Skipped descriptors:");
        for diagnostic in &diagnostics {
            println!(
                "  {} - {}",
                diagnostic
                    .get("path")
                    .and_then(Value::as_str)
                    .unwrap_or("<unknown>"),
                diagnostic
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("<unknown>")
            );
        }
    }
    Ok(())
}

fn run_schema() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&config_schema())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use serde_json::json;

    fn flat_config() -> Value {
        json!({
            "form": { "action": "/contact" },
            "title": "Contact",
            "templatePath": "/tpl",
            "fields": [
                { "name": "name", "type": "text", "text": "Name" },
                { "type": "text" },
                { "name": "city", "type": "template", "template": "city.hbs", "text": "City" }
            ]
        })
    }

    fn write_config(dir: &TempDir, config: &Value) -> PathBuf {
        let file = dir.child("form.json");
        file.write_str(&config.to_string()).expect("write config");
        file.path().to_path_buf()
    }

    #[test]
    fn templates_dir_prefers_explicit_flag() {
        let explicit = resolve_templates_dir(Some(PathBuf::from("/tmp/forms")));
        assert_eq!(explicit, Some(PathBuf::from("/tmp/forms")));
    }

    #[test]
    fn render_prints_html_with_bound_values() -> CliResult<()> {
        let dir = TempDir::new()?;
        let config = write_config(&dir, &flat_config());
        let values = dir.child("values.json");
        values.write_str(r#"{"name":"Ada"}"#)?;

        let output = Command::cargo_bin("greentic-form")?
            .env_remove(TEMPLATES_ENV)
            .arg("render")
            .arg("--config")
            .arg(&config)
            .arg("--values")
            .arg(values.path())
            .output()?;
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.starts_with("<div id=\"formParent\">"));
        assert!(stdout.contains("value=\"Ada\""));
        assert!(stdout.contains("data-template-pending=\"/tpl/city.hbs\""));

        let stderr = String::from_utf8(output.stderr)?;
        assert!(stderr.contains("Skipped 1 descriptor(s)"));
        assert!(stderr.contains("Template for 'city' not loaded"));
        Ok(())
    }

    #[test]
    fn render_reads_templates_from_directory() -> CliResult<()> {
        let dir = TempDir::new()?;
        let config = write_config(&dir, &flat_config());
        let templates = dir.child("templates");
        templates
            .child("tpl/city.hbs")
            .write_str("<input name=\"{{name}}\" placeholder=\"{{label}}\">")?;

        let output = Command::cargo_bin("greentic-form")?
            .arg("render")
            .arg("--config")
            .arg(&config)
            .arg("--templates")
            .arg(templates.path())
            .arg("--format")
            .arg("json")
            .output()?;
        assert!(output.status.success());

        let parsed: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(parsed["tree"]["attributes"]["id"], "formParent");
        assert_eq!(parsed["templates"][0]["status"]["status"], "settled");
        assert_eq!(parsed["diagnostics"][0]["reason"], "missing_field_name");
        Ok(())
    }

    #[test]
    fn render_uses_template_env_fallback() -> CliResult<()> {
        let dir = TempDir::new()?;
        let config = write_config(&dir, &flat_config());
        let templates = dir.child("templates");
        templates
            .child("tpl/city.hbs")
            .write_str("<input name=\"{{name}}\">")?;

        let output = Command::cargo_bin("greentic-form")?
            .env(TEMPLATES_ENV, templates.path())
            .arg("render")
            .arg("--config")
            .arg(&config)
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("<input name=\"city\">"));
        Ok(())
    }

    #[test]
    fn render_fails_on_missing_action() -> CliResult<()> {
        let dir = TempDir::new()?;
        let config = write_config(&dir, &json!({ "form": {}, "title": "T" }));

        let output = Command::cargo_bin("greentic-form")?
            .arg("render")
            .arg("--config")
            .arg(&config)
            .output()?;
        assert!(!output.status.success());
        let stderr = String::from_utf8(output.stderr)?;
        assert!(stderr.contains("form.action"));
        Ok(())
    }

    #[test]
    fn check_handles_unparsable_config() -> CliResult<()> {
        let dir = TempDir::new()?;
        let file = dir.child("broken.json");
        file.write_str("{ not json")?;

        let output = Command::cargo_bin("greentic-form")?
            .arg("check")
            .arg("--config")
            .arg(file.path())
            .output()?;
        assert!(!output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("failed to parse config"));
        Ok(())
    }

    #[test]
    fn check_lists_skipped_descriptors() -> CliResult<()> {
        let dir = TempDir::new()?;
        let config = write_config(&dir, &flat_config());

        let output = Command::cargo_bin("greentic-form")?
            .arg("check")
            .arg("--config")
            .arg(&config)
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("Config result: valid"));
        assert!(stdout.contains("fields[1] - missing_field_name"));
        Ok(())
    }

    #[test]
    fn check_rejects_invalid_config() -> CliResult<()> {
        let dir = TempDir::new()?;
        let config = write_config(&dir, &json!({ "form": { "action": "/x" } }));

        Command::cargo_bin("greentic-form")?
            .arg("check")
            .arg("--config")
            .arg(&config)
            .assert()
            .failure();
        Ok(())
    }

    #[test]
    fn schema_prints_config_properties() -> CliResult<()> {
        let output = Command::cargo_bin("greentic-form")?.arg("schema").output()?;
        assert!(output.status.success());
        let schema: Value = serde_json::from_slice(&output.stdout)?;
        assert!(schema["properties"]["sections"].is_object());
        Ok(())
    }
}
