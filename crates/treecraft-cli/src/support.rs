use crate::cli::GlobalArgs;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use treecraft_core::{ConceptCatalog, FileKv, Tree, TreeRepository};

pub const DEFAULT_CONFIG_PATH: &str = "treecraft.toml";
pub const DEFAULT_STORE_DIR: &str = ".treecraft/store";
pub const DEFAULT_USER: &str = "local";

/// Keys accepted in `treecraft.toml`. Relative paths are resolved against
/// the directory holding the file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    store_dir: Option<PathBuf>,
    #[serde(default)]
    master_graph: Option<PathBuf>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    validate_imports: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_dir: PathBuf,
    pub master_graph: Option<PathBuf>,
    pub user: String,
    pub validate_imports: bool,
}

pub fn settings_or_exit(global: &GlobalArgs) -> Settings {
    let (config, base) = load_config_or_exit(global.config.as_deref());
    resolve_settings(global, config, &base)
}

fn load_config_or_exit(explicit: Option<&str>) -> (FileConfig, PathBuf) {
    let path = PathBuf::from(explicit.unwrap_or(DEFAULT_CONFIG_PATH));
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    if !path.exists() {
        if explicit.is_some() {
            eprintln!("error: config file not found: {}", path.display());
            std::process::exit(1);
        }
        return (FileConfig::default(), base);
    }

    let raw = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        std::process::exit(1);
    });
    let config = parse_config(&raw).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {}: {e}", path.display());
        std::process::exit(1);
    });
    tracing::debug!(path = %path.display(), "loaded config");
    (config, base)
}

fn parse_config(raw: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(raw)
}

fn resolve_settings(global: &GlobalArgs, config: FileConfig, base: &Path) -> Settings {
    let from_file = |path: PathBuf| {
        if path.is_absolute() {
            path
        } else {
            base.join(path)
        }
    };

    let master_graph = global
        .master
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| config.master_graph.map(from_file));

    Settings {
        store_dir: global
            .store
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| config.store_dir.map(from_file))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
        user: global
            .user
            .clone()
            .or(config.user)
            .unwrap_or_else(|| DEFAULT_USER.to_string()),
        validate_imports: config.validate_imports.unwrap_or(master_graph.is_some()),
        master_graph,
    }
}

pub fn open_repository(settings: &Settings) -> TreeRepository<FileKv> {
    TreeRepository::new(FileKv::new(&settings.store_dir))
}

pub fn load_master_or_exit(settings: &Settings) -> Option<ConceptCatalog> {
    let path = settings.master_graph.as_ref()?;
    if !path.exists() {
        eprintln!("error: master graph not found: {}", path.display());
        std::process::exit(1);
    }
    let catalog = ConceptCatalog::load_jsonl(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {}: {e}", path.display());
        std::process::exit(1);
    });
    Some(catalog)
}

pub fn require_master_or_exit(settings: &Settings, action: &str) -> ConceptCatalog {
    load_master_or_exit(settings).unwrap_or_else(|| {
        eprintln!(
            "error: {action} needs a master graph (pass --master or set master_graph in {DEFAULT_CONFIG_PATH})"
        );
        std::process::exit(1);
    })
}

pub fn tree_or_exit(tree: Option<Tree>, tree_id: &str) -> Tree {
    tree.unwrap_or_else(|| {
        eprintln!("error: tree not found: {tree_id}");
        std::process::exit(1);
    })
}

pub fn read_json_file_or_exit(path: &str) -> Value {
    let raw = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {path}: {e}");
        std::process::exit(1);
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {path}: {e}");
        std::process::exit(1);
    })
}

pub fn print_json(payload: &Value) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        eprintln!("error: failed to render JSON output: {e}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

pub fn tree_value(tree: &Tree) -> Value {
    serde_json::to_value(tree).unwrap_or_else(|e| {
        eprintln!("error: failed to serialize tree {}: {e}", tree.id);
        std::process::exit(2);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_config_or_flags() {
        let settings = resolve_settings(&GlobalArgs::default(), FileConfig::default(), Path::new(""));
        assert_eq!(
            settings,
            Settings {
                store_dir: PathBuf::from(DEFAULT_STORE_DIR),
                master_graph: None,
                user: DEFAULT_USER.to_string(),
                validate_imports: false,
            }
        );
    }

    #[test]
    fn config_paths_resolve_against_config_dir() {
        let config = parse_config(
            "store_dir = \"data/trees\"\nmaster_graph = \"/srv/concepts.jsonl\"\nuser = \"ada\"\n",
        )
        .expect("config should parse");
        let settings = resolve_settings(&GlobalArgs::default(), config, Path::new("/work"));

        assert_eq!(settings.store_dir, PathBuf::from("/work/data/trees"));
        assert_eq!(
            settings.master_graph,
            Some(PathBuf::from("/srv/concepts.jsonl"))
        );
        assert_eq!(settings.user, "ada");
        assert!(settings.validate_imports);
    }

    #[test]
    fn flags_override_config() {
        let config = parse_config(
            "store_dir = \"a\"\nuser = \"ada\"\nmaster_graph = \"m.jsonl\"\nvalidate_imports = false\n",
        )
        .expect("config should parse");
        let global = GlobalArgs {
            config: None,
            store: Some("b".into()),
            user: Some("grace".into()),
            master: Some("other.jsonl".into()),
        };
        let settings = resolve_settings(&global, config, Path::new("/cfg"));

        assert_eq!(settings.store_dir, PathBuf::from("b"));
        assert_eq!(settings.user, "grace");
        assert_eq!(settings.master_graph, Some(PathBuf::from("other.jsonl")));
        assert!(!settings.validate_imports);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        assert!(parse_config("stor_dir = \"typo\"\n").is_err());
    }
}
