use crate::support::{Settings, open_repository, print_json, require_master_or_exit};
use serde_json::json;
use treecraft_core::{TreeEditor, UuidIdGenerator};

pub fn run(tree_id: String, json_output: bool, settings: &Settings) {
    let master = require_master_or_exit(settings, "validate");
    let repo = open_repository(settings);
    let ids = UuidIdGenerator;
    let editor = TreeEditor::new(&repo, &ids);

    let report = editor.validate(&settings.user, &tree_id, &master);
    let report = match report {
        Some(report) => report,
        None => {
            eprintln!("error: tree not found: {tree_id}");
            std::process::exit(1);
        }
    };

    if json_output {
        print_json(&json!({
            "schema": 1,
            "checkKind": report.check_kind,
            "treeId": report.tree_id,
            "result": if report.ok { "accepted" } else { "rejected" },
            "failureClasses": report.failure_classes,
            "errors": report.errors,
            "summary": report.summary,
        }));
    } else {
        print!("{}", report.render());
    }

    if !report.ok {
        std::process::exit(1);
    }
}

