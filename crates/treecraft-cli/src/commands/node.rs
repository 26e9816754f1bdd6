use crate::cli::{BadgeArg, NodeCommands};
use crate::commands::tree::report_tree;
use crate::support::{Settings, open_repository, tree_or_exit};
use serde_json::Value;
use treecraft_core::{BadgeTier, TreeEditor, UnlockConditionsPatch, UuidIdGenerator};

pub fn run(command: NodeCommands, settings: &Settings) {
    let repo = open_repository(settings);
    let ids = UuidIdGenerator;
    let editor = TreeEditor::new(&repo, &ids);
    let user = settings.user.as_str();

    match command {
        NodeCommands::Add {
            tree_id,
            concept_id,
            json,
        } => {
            let tree = tree_or_exit(editor.add_node(user, &tree_id, &concept_id), &tree_id);
            report_tree("node.add", "Tree", &tree, json);
        }

        NodeCommands::Connect {
            tree_id,
            from,
            to,
            json,
        } => {
            let tree = tree_or_exit(editor.connect(user, &tree_id, &from, &to), &tree_id);
            if !tree.contains_node(&from) || !tree.contains_node(&to) {
                tracing::warn!(%from, %to, "edge skipped: both endpoints must be nodes of the tree");
            }
            report_tree("node.connect", "Tree", &tree, json);
        }

        NodeCommands::Next {
            tree_id,
            concept_id,
            next_ids,
            json,
        } => {
            let tree = tree_or_exit(
                editor.set_next_ids(user, &tree_id, &concept_id, next_ids),
                &tree_id,
            );
            report_tree("node.next", "Tree", &tree, json);
        }

        NodeCommands::Unlock {
            tree_id,
            concept_id,
            required,
            clear_required,
            min_badge,
            rule,
            json,
        } => {
            let patch = UnlockConditionsPatch {
                required_concept_ids: (clear_required || !required.is_empty()).then_some(required),
                min_badge: min_badge.map(|badge| map_badge(badge).into()),
                custom_rule_id: rule.map(Value::String),
            };
            let tree = tree_or_exit(
                editor.set_unlock_conditions(user, &tree_id, &concept_id, patch),
                &tree_id,
            );
            report_tree("node.unlock", "Tree", &tree, json);
        }
    }
}

fn map_badge(arg: BadgeArg) -> BadgeTier {
    match arg {
        BadgeArg::None => BadgeTier::None,
        BadgeArg::Bronze => BadgeTier::Bronze,
        BadgeArg::Silver => BadgeTier::Silver,
        BadgeArg::Gold => BadgeTier::Gold,
    }
}
