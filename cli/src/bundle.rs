#![deny(missing_docs)]

//! # Bundle Command
//!
//! Reads a schema document, bundles every reachable `$ref` into a single
//! `$defs` container and writes the result as pretty JSON.

use std::fs;
use std::path::{Path, PathBuf};

use refbundle_core::{
    bundle_with, parse_document, BundleOptions, Dialect, FileLoader, JsonPointer, LoadError,
    Resolver,
};
use serde_json::Value;
use url::Url;

use crate::error::{CliError, CliResult};

/// Arguments for the bundle command.
#[derive(clap::Args, Debug, Clone)]
pub struct BundleArgs {
    /// Path to the root document (JSON, or YAML for `.yaml`/`.yml`).
    pub input: PathBuf,

    /// JSON Pointer selecting the fragment of the input to bundle.
    #[clap(long, env = "REFBUNDLE_POINTER")]
    pub pointer: Option<String>,

    /// Pre-loads a document as `ID=PATH`. Relative IDs resolve against the input.
    #[clap(long = "document", value_name = "ID=PATH", value_parser = parse_document_arg)]
    pub documents: Vec<(String, PathBuf)>,

    /// Turn cyclic references into self-referential definitions instead of failing.
    #[clap(long, env = "REFBUNDLE_INLINE_RECURSIVE")]
    pub inline_recursive: bool,

    /// Dialect of the documents (swagger2, openapi30, openapi31, jsonschema).
    #[clap(long, env = "REFBUNDLE_DIALECT")]
    pub dialect: Option<Dialect>,

    /// Traversal depth ceiling.
    #[clap(long, env = "REFBUNDLE_MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// Bundle options file (YAML or JSON). Flags take precedence.
    #[clap(long, env = "REFBUNDLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output path. Defaults to stdout.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

fn parse_document_arg(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((id, path)) if !id.is_empty() && !path.is_empty() => {
            Ok((id.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected ID=PATH, got '{}'", raw)),
    }
}

/// Executes the bundle command.
pub fn execute(args: &BundleArgs) -> CliResult<()> {
    let bundled = run(args)?;
    let mut rendered = serde_json::to_string_pretty(&bundled)
        .map_err(|e| CliError::General(format!("Failed to render output: {}", e)))?;
    rendered.push('\n');

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            tracing::info!(output = %path.display(), "wrote bundle");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Builds the resolver and options from `args` and returns the bundled value.
pub fn run(args: &BundleArgs) -> CliResult<Value> {
    let input = fs::canonicalize(&args.input)?;
    let root = read_document(&input)?;
    let base_uri = Url::from_file_path(&input)
        .map_err(|_| CliError::General(format!("Cannot express {:?} as a URI", input)))?;

    let mut builder = Resolver::builder(root.clone())
        .base_uri(base_uri.as_str())
        .loader(FileLoader);
    for (id, path) in &args.documents {
        builder = builder.document(id.clone(), read_document(path)?);
    }
    let resolver = builder.build()?;

    let schema = match &args.pointer {
        Some(pointer) => JsonPointer::parse(pointer)
            .and_then(|pointer| pointer.evaluate(&root).cloned())
            .map_err(|e| CliError::General(format!("Invalid --pointer '{}': {}", pointer, e)))?,
        None => root,
    };

    let options = options(args)?;
    tracing::debug!(?options, input = %base_uri, "bundling");
    Ok(bundle_with(&schema, &resolver, &options)?)
}

fn options(args: &BundleArgs) -> CliResult<BundleOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let value = read_document(path)?;
            serde_json::from_value::<BundleOptions>(value).map_err(LoadError::from)?
        }
        None => BundleOptions::default(),
    };
    if args.inline_recursive {
        options.inline_recursive = true;
    }
    if let Some(dialect) = args.dialect {
        options.dialect = Some(dialect);
    }
    if let Some(max_depth) = args.max_depth {
        options.max_depth = max_depth;
    }
    Ok(options)
}

fn read_document(path: &Path) -> CliResult<Value> {
    let content = fs::read_to_string(path)?;
    Ok(parse_document(&content, path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use refbundle_core::BundleError;
    use serde_json::json;
    use tempfile::tempdir;

    fn args(input: PathBuf) -> BundleArgs {
        BundleArgs {
            input,
            pointer: None,
            documents: Vec::new(),
            inline_recursive: false,
            dialect: None,
            max_depth: None,
            config: None,
            output: None,
        }
    }

    #[test]
    fn test_external_document_loaded_from_disk() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.json");
        fs::write(
            &input,
            r#"{"type": "object", "properties": {"pet": {"$ref": "other.json#/Pet"}}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("other.json"), r#"{"Pet": {"type": "string"}}"#).unwrap();

        let bundled = run(&args(input)).unwrap();
        assert_eq!(
            bundled,
            json!({
                "type": "object",
                "properties": {"pet": {"$ref": "#/$defs/Pet"}},
                "$defs": {"Pet": {"type": "string"}}
            })
        );
    }

    #[test]
    fn test_preloaded_document_and_yaml_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.yaml");
        fs::write(
            &input,
            "type: object\nproperties:\n  id:\n    $ref: 'remote/common.json#/definitions/Id'\n",
        )
        .unwrap();
        let common = dir.path().join("common_copy.json");
        fs::write(&common, r#"{"definitions": {"Id": {"type": "integer"}}}"#).unwrap();

        let mut args = args(input);
        args.documents = vec![("remote/common.json".to_string(), common)];
        let bundled = run(&args).unwrap();
        assert_eq!(bundled["properties"]["id"], json!({"$ref": "#/$defs/Id"}));
        assert_eq!(bundled["$defs"]["Id"], json!({"type": "integer"}));
    }

    #[test]
    fn test_pointer_selects_fragment_and_cycle_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.json");
        fs::write(
            &input,
            r##"{"definitions": {"Node": {"type": "object", "properties": {"next": {"$ref": "#/definitions/Node"}}}}}"##,
        )
        .unwrap();

        let mut args = args(input);
        args.pointer = Some("/definitions/Node".to_string());
        let err = run(&args).unwrap_err();
        assert!(matches!(
            err,
            CliError::Bundle(BundleError::CyclicReference { .. })
        ));
    }

    #[test]
    fn test_config_enables_inline_recursive() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.json");
        fs::write(
            &input,
            r##"{"definitions": {"Node": {"type": "object", "properties": {"next": {"$ref": "#/definitions/Node"}}}}}"##,
        )
        .unwrap();
        let config = dir.path().join("options.yaml");
        fs::write(&config, "inline-recursive: true\nmax-depth: 64\n").unwrap();

        let mut args = args(input);
        args.pointer = Some("/definitions/Node".to_string());
        args.config = Some(config);
        let bundled = run(&args).unwrap();
        assert_eq!(
            bundled["$defs"]["Node"]["properties"]["next"],
            json!({"$ref": "#/$defs/Node"})
        );
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("options.json");
        fs::write(&config, r#"{"max-depth": 10, "dialect": "swagger2"}"#).unwrap();

        let mut args = args(dir.path().join("unused.json"));
        args.config = Some(config);
        args.max_depth = Some(5);
        let options = options(&args).unwrap();
        assert_eq!(options.max_depth, 5);
        assert_eq!(options.dialect, Some(Dialect::Swagger2));
        assert!(!options.inline_recursive);
    }

    #[test]
    fn test_unknown_config_key_is_parse_error() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("options.yaml");
        fs::write(&config, "inline_recursive: true\n").unwrap();

        let mut args = args(dir.path().join("unused.json"));
        args.config = Some(config);
        assert!(matches!(options(&args), Err(CliError::Parse(_))));
    }

    #[test]
    fn test_execute_writes_output_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.json");
        fs::write(&input, r#"{"type": "string"}"#).unwrap();
        let output = dir.path().join("out/bundled.json");

        let mut args = args(input);
        args.output = Some(output.clone());
        execute(&args).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written, json!({"type": "string"}));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let err = run(&args(dir.path().join("missing.json"))).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_parse_document_arg() {
        assert_eq!(
            parse_document_arg("a.json=/tmp/b.json").unwrap(),
            ("a.json".to_string(), PathBuf::from("/tmp/b.json"))
        );
        assert!(parse_document_arg("no-separator").is_err());
        assert!(parse_document_arg("=path").is_err());
    }
}
