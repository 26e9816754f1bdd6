use crate::commands::tree::report_tree;
use crate::support::{Settings, open_repository, print_json, require_master_or_exit};
use serde_json::json;
use std::fs;
use treecraft_core::{ExchangeCodec, ExchangeError, UuidIdGenerator, parse_payload};

pub fn run_export(tree_id: String, out: Option<String>, settings: &Settings) {
    let repo = open_repository(settings);
    let ids = UuidIdGenerator;
    let codec = ExchangeCodec::new(&repo, &ids);

    let exported = match codec.export_stored(&settings.user, &tree_id) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            eprintln!("error: failed to export {tree_id}: {e}");
            std::process::exit(1);
        }
        None => {
            eprintln!("error: tree not found: {tree_id}");
            std::process::exit(1);
        }
    };

    match out {
        Some(path) => {
            let rendered = serde_json::to_string_pretty(&exported).unwrap_or_else(|e| {
                eprintln!("error: failed to render export: {e}");
                std::process::exit(2);
            });
            fs::write(&path, format!("{rendered}\n")).unwrap_or_else(|e| {
                eprintln!("error: failed to write {path}: {e}");
                std::process::exit(1);
            });
            println!("treecraft export\n  Tree: {tree_id}\n  Path: {path}");
        }
        None => print_json(&exported),
    }
}

pub fn run_import(file: String, no_validate: bool, json_output: bool, settings: &Settings) {
    let raw = fs::read_to_string(&file).unwrap_or_else(|e| {
        eprintln!("error: failed to read {file}: {e}");
        std::process::exit(1);
    });

    let master = if no_validate || !settings.validate_imports {
        None
    } else {
        Some(require_master_or_exit(settings, "validated import"))
    };

    let repo = open_repository(settings);
    let ids = UuidIdGenerator;
    let codec = ExchangeCodec::new(&repo, &ids);

    let imported = parse_payload(&raw)
        .and_then(|value| codec.import_with(&settings.user, &value, master.as_ref()));

    match imported {
        Ok(tree) => report_tree("import", "Imported", &tree, json_output),
        Err(ExchangeError::Validation { errors }) => {
            if json_output {
                print_json(&json!({
                    "action": "import",
                    "result": "rejected",
                    "errors": errors,
                }));
            } else {
                eprintln!("error: import rejected by integrity check");
                for error in &errors {
                    eprintln!("  - {error}");
                }
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {file}: {e}");
            std::process::exit(1);
        }
    }
}
