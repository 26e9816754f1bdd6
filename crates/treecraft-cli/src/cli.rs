use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "treecraft",
    about = "Treecraft: author creator trees over a master concept graph",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command. Each overrides the matching
/// `treecraft.toml` key.
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Config file (default: ./treecraft.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Directory holding the tree store
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// User whose collection to operate on
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Master-graph concept catalog (JSONL)
    #[arg(long, global = true)]
    pub master: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create and edit trees
    Tree {
        #[command(subcommand)]
        command: TreeCommands,
    },

    /// Edit the nodes and edges of a tree
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Run the integrity check on a stored tree
    Validate {
        /// Tree ID
        tree_id: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a stored tree as JSON
    Export {
        /// Tree ID
        tree_id: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },

    /// Import a tree from a JSON file under a fresh identity
    Import {
        /// Path to the exported tree JSON
        file: String,

        /// Skip the integrity check even when a master graph is configured
        #[arg(long)]
        no_validate: bool,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum TreeCommands {
    /// Create an empty tree
    Create {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Primary domain
        #[arg(long)]
        domain: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Root concept ID
        #[arg(long)]
        root: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// List the user's trees
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one tree
    Show {
        /// Tree ID
        tree_id: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Update tree metadata; omitted fields are left unchanged
    Patch {
        /// Tree ID
        tree_id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Primary domain
        #[arg(long)]
        domain: Option<String>,

        /// Replacement tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Replace the tags with an empty list
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,

        /// Root concept ID
        #[arg(long)]
        root: Option<String>,

        /// JSON file holding a replacement node list
        #[arg(long)]
        nodes: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a tree
    Delete {
        /// Tree ID
        tree_id: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Assign a fresh slug derived from the current title
    RegenSlug {
        /// Tree ID
        tree_id: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum NodeCommands {
    /// Add a concept as a node (no-op when already present)
    Add {
        /// Tree ID
        tree_id: String,

        /// Concept ID
        concept_id: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an edge between two existing nodes
    Connect {
        /// Tree ID
        tree_id: String,

        /// Source concept ID
        from: String,

        /// Target concept ID
        to: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace a node's successor list
    Next {
        /// Tree ID
        tree_id: String,

        /// Concept ID
        concept_id: String,

        /// Successor concept IDs, in order
        next_ids: Vec<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge unlock conditions into a node
    Unlock {
        /// Tree ID
        tree_id: String,

        /// Concept ID
        concept_id: String,

        /// Required concept ID (repeatable; replaces the list)
        #[arg(long = "require")]
        required: Vec<String>,

        /// Replace the required concepts with an empty list
        #[arg(long, conflicts_with = "required")]
        clear_required: bool,

        /// Minimum badge tier
        #[arg(long, value_enum)]
        min_badge: Option<BadgeArg>,

        /// Custom rule ID
        #[arg(long)]
        rule: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BadgeArg {
    #[value(name = "none")]
    None,
    #[value(name = "bronze")]
    Bronze,
    #[value(name = "silver")]
    Silver,
    #[value(name = "gold")]
    Gold,
}
