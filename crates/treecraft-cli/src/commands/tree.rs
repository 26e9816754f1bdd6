use crate::cli::TreeCommands;
use crate::support::{
    Settings, open_repository, print_json, read_json_file_or_exit, tree_or_exit, tree_value,
};
use serde_json::{Value, json};
use treecraft_core::{Node, Tree, TreeEditor, TreeMeta, TreePatch, UuidIdGenerator};

pub fn run(command: TreeCommands, settings: &Settings) {
    let repo = open_repository(settings);
    let ids = UuidIdGenerator;
    let editor = TreeEditor::new(&repo, &ids);
    let user = settings.user.as_str();

    match command {
        TreeCommands::Create {
            title,
            description,
            domain,
            tags,
            root,
            json,
        } => {
            let meta = TreeMeta {
                title,
                description,
                primary_domain: domain,
                tags: (!tags.is_empty()).then_some(tags),
                root_concept_id: root,
            };
            let tree = editor.create(user, meta);
            report_tree("tree.create", "Created", &tree, json);
        }

        TreeCommands::List { json } => {
            let trees = editor.list(user);
            if json {
                print_json(&json!({
                    "action": "tree.list",
                    "user": user,
                    "count": trees.len(),
                    "trees": trees.iter().map(tree_value).collect::<Vec<_>>(),
                }));
            } else {
                println!("treecraft tree list\n  User: {user}\n  Trees: {}", trees.len());
                for tree in &trees {
                    println!(
                        "  - {} {} \"{}\" (nodes={})",
                        tree.id,
                        tree.slug,
                        tree.title,
                        tree.nodes.len()
                    );
                }
            }
        }

        TreeCommands::Show { tree_id, json } => {
            let tree = tree_or_exit(editor.get(user, &tree_id), &tree_id);
            if json {
                print_json(&tree_value(&tree));
            } else {
                print_tree_detail(&tree);
            }
        }

        TreeCommands::Patch {
            tree_id,
            title,
            description,
            domain,
            tags,
            clear_tags,
            root,
            nodes,
            json,
        } => {
            let nodes = nodes.map(|path| load_nodes_or_exit(&path));
            let patch = TreePatch {
                title,
                description,
                primary_domain: domain,
                tags: (clear_tags || !tags.is_empty()).then_some(tags),
                root_concept_id: root,
                nodes,
            };
            let tree = tree_or_exit(editor.patch(user, &tree_id, patch), &tree_id);
            report_tree("tree.patch", "Patched", &tree, json);
        }

        TreeCommands::Delete { tree_id, json } => {
            let deleted = editor.delete(user, &tree_id);
            if json {
                print_json(&json!({
                    "action": "tree.delete",
                    "treeId": tree_id,
                    "deleted": deleted,
                }));
            } else if deleted {
                println!("treecraft tree delete\n  Deleted: {tree_id}");
            } else {
                println!("treecraft tree delete\n  Not found: {tree_id}");
            }
        }

        TreeCommands::RegenSlug { tree_id, json } => {
            let tree = tree_or_exit(editor.regenerate_slug(user, &tree_id), &tree_id);
            report_tree("tree.regen_slug", "Slug", &tree, json);
        }
    }
}

fn load_nodes_or_exit(path: &str) -> Vec<Node> {
    let value = read_json_file_or_exit(path);
    serde_json::from_value(value).unwrap_or_else(|e| {
        eprintln!("error: {path} is not a node list: {e}");
        std::process::exit(1);
    })
}

/// Shared output for commands that return the updated tree.
pub(crate) fn report_tree(action: &str, verb: &str, tree: &Tree, json_output: bool) {
    if json_output {
        print_json(&json!({
            "action": action,
            "tree": tree_value(tree),
        }));
    } else {
        println!(
            "treecraft {}\n  {verb}: {} ({})\n  Title: {}\n  Nodes: {} (edges={})",
            action.replace(['.', '_'], " "),
            tree.id,
            tree.slug,
            tree.title,
            tree.nodes.len(),
            tree.edge_count()
        );
    }
}

fn print_tree_detail(tree: &Tree) {
    println!("treecraft tree show");
    println!("  Id: {}", tree.id);
    println!("  Slug: {}", tree.slug);
    println!("  Creator: {}", tree.creator_id);
    println!("  Title: {}", tree.title);
    if !tree.description.is_empty() {
        println!("  Description: {}", tree.description);
    }
    println!("  Domain: {}", tree.primary_domain);
    if !tree.tags.is_empty() {
        println!("  Tags: {}", tree.tags.join(", "));
    }
    println!("  Root: {}", tree.root_concept_id);
    println!("  Updated: {}", tree.updated_at.to_rfc3339());
    println!("  Nodes: {} (edges={})", tree.nodes.len(), tree.edge_count());
    for node in &tree.nodes {
        let mut line = format!("    - {}", node.concept_id);
        if !node.next_ids.is_empty() {
            line.push_str(&format!(" -> {}", node.next_ids.join(", ")));
        }
        let unlock = &node.unlock_conditions;
        if !unlock.required_concept_ids.is_empty() {
            line.push_str(&format!(
                " [requires {}]",
                unlock.required_concept_ids.join(", ")
            ));
        }
        if unlock.min_badge.tier() != Some(treecraft_core::BadgeTier::None) {
            line.push_str(&format!(" [badge {}]", unlock.min_badge));
        }
        match &unlock.custom_rule_id {
            Some(Value::String(rule)) => line.push_str(&format!(" [rule {rule}]")),
            Some(rule) => line.push_str(&format!(" [rule {rule}]")),
            None => {}
        }
        println!("{line}");
    }
}
