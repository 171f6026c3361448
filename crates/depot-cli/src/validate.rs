//! # Validate Subcommand
//!
//! Loads a manifest file (JSON or YAML), validates it against the
//! manifest schema, and prints the validated or repaired document as
//! pretty JSON on stdout with violations on stderr.
//!
//! Exit behavior: strict mode fails on the first violation; best-effort
//! mode always succeeds, reporting however many violations it repaired.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use serde_json::Value;

use depot_manifest::{ManifestValidator, Mode};
use depot_spdx::SpdxRegistry;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the manifest file (JSON or YAML).
    pub manifest: PathBuf,

    /// Fail on the first violation instead of repairing the document.
    #[arg(long)]
    pub strict: bool,

    /// Validate as a platform manifest (enables the `title` field).
    #[arg(long)]
    pub platform: bool,

    /// TTL for the cached SPDX license list, in seconds.
    #[arg(long, default_value_t = 3600)]
    pub spdx_ttl: u64,
}

/// Run manifest validation against a file on disk.
pub fn run(args: &ValidateArgs) -> anyhow::Result<()> {
    let document = load_document(&args.manifest)?;

    let registry = SpdxRegistry::new()
        .context("building SPDX license registry client")?
        .with_ttl(Duration::from_secs(args.spdx_ttl));
    let validator = ManifestValidator::new(registry).context("building manifest schemas")?;

    let mode = if args.strict {
        Mode::Strict
    } else {
        Mode::BestEffort
    };
    let validated = if args.platform {
        validator.validate_platform(&document, mode)
    } else {
        validator.validate_package(&document, mode)
    }
    .with_context(|| format!("validating {}", args.manifest.display()))?;

    if !validated.violations.is_empty() {
        eprintln!(
            "{} violation(s) repaired in {}:",
            validated.violations.len(),
            args.manifest.display()
        );
        eprintln!("{}", validated.violations);
        if validated.violations.has_reference_unavailable() {
            tracing::warn!(
                "license registry was unreachable; the license field was dropped, retry later"
            );
        }
    }

    let output = serde_json::to_string_pretty(&Value::Object(validated.document))?;
    println!("{output}");
    Ok(())
}

/// Parse a manifest file by extension: `.json` as JSON, anything else
/// as YAML (which also accepts JSON).
fn load_document(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let document = if is_json {
        serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", path.display()))?
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {} as YAML", path.display()))?
    };
    Ok(document)
}
