use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gitk",
    about = "gitk: version control over a content-addressed blob store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new gitk repository
    Init(InitArgs),
    /// Show staged changes
    Status(StatusArgs),
    /// Upload files and stage them for the next commit
    Add(AddArgs),
    /// Record the staged tree as a new commit
    Commit(CommitArgs),
    /// Show first-parent history from HEAD
    Log(LogArgs),
    /// Show an object
    Show(ShowArgs),
    /// List or create branches
    Branch(BranchArgs),
    /// Manage configured remotes
    Remote(RemoteArgs),
    /// Copy a branch and its history to a remote
    Push(PushArgs),
    /// Copy a remote branch into refs/remotes/<remote>/<branch>
    Fetch(FetchArgs),
    /// List every reference
    Refs(RefsArgs),
    /// Delete objects no reference reaches
    Gc(GcArgs),
    /// Verify object integrity and reference targets
    Fsck(FsckArgs),
    /// Ask the configured assistant
    Ai(AiArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Working tree to initialize (defaults to --repo)
    pub path: Option<PathBuf>,
    #[arg(short, long, default_value = "gitk")]
    pub bucket: String,
    #[arg(short, long, default_value = "")]
    pub prefix: String,
    /// Blob store root directory
    #[arg(long)]
    pub root: Option<PathBuf>,
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long, conflicts_with = "ai")]
    pub message: Option<String>,
    /// Generate the message with the configured assistant
    #[arg(long)]
    pub ai: bool,
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Identifier, abbreviated identifier, branch or reference
    #[arg(default_value = "HEAD")]
    pub revision: String,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: Option<String>,
    /// Start point (defaults to HEAD)
    #[arg(long, requires = "name")]
    pub start: Option<String>,
}

#[derive(Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub action: Option<RemoteAction>,
}

#[derive(Subcommand)]
pub enum RemoteAction {
    Add {
        name: String,
        #[arg(short, long)]
        bucket: String,
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
    Remove {
        name: String,
    },
}

#[derive(Args)]
pub struct PushArgs {
    #[arg(default_value = "origin")]
    pub remote: String,
    /// Branch to push (defaults to the current branch)
    pub branch: Option<String>,
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct FetchArgs {
    #[arg(default_value = "origin")]
    pub remote: String,
    #[arg(default_value = "main")]
    pub branch: String,
}

#[derive(Args)]
pub struct RefsArgs {}

#[derive(Args)]
pub struct GcArgs {
    /// Report what would be deleted without deleting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct FsckArgs {}

#[derive(Args)]
pub struct AiArgs {
    #[command(subcommand)]
    pub action: AiAction,
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Review the staged changes
    Review,
    /// Analyze a path in the repository
    Analyze {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Generate documentation for a path
    Docs {
        #[arg(default_value = ".")]
        path: String,
    },
}
