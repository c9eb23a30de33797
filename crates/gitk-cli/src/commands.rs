use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use gitk_sdk::{
    BlobClient, CommitRequest, FsBlobClient, Object, ObjectId, RefValue, RemoteConfig, RepoConfig,
    Repository, DEFAULT_BRANCH,
};
use tracing::debug;

use crate::cli::*;
use crate::scan::collect_files;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let workdir = cli.repo;
    match cli.command {
        Command::Init(args) => cmd_init(&workdir, args).await,
        Command::Status(_) => cmd_status(&workdir),
        Command::Add(args) => cmd_add(&workdir, args).await,
        Command::Commit(args) => cmd_commit(&workdir, args).await,
        Command::Log(args) => cmd_log(&workdir, args).await,
        Command::Show(args) => cmd_show(&workdir, args).await,
        Command::Branch(args) => cmd_branch(&workdir, args).await,
        Command::Remote(args) => cmd_remote(&workdir, args),
        Command::Push(args) => cmd_push(&workdir, args).await,
        Command::Fetch(args) => cmd_fetch(&workdir, args).await,
        Command::Refs(_) => cmd_refs(&workdir).await,
        Command::Gc(args) => cmd_gc(&workdir, args).await,
        Command::Fsck(_) => cmd_fsck(&workdir).await,
        Command::Ai(args) => cmd_ai(&workdir, args).await,
    }
}

fn client_for(config: &RepoConfig, workdir: &Path) -> Arc<dyn BlobClient> {
    Arc::new(FsBlobClient::new(config.storage_root(workdir)))
}

fn open(workdir: &Path) -> anyhow::Result<Repository> {
    let config = Repository::load_config(workdir)?;
    debug!(workdir = %workdir.display(), bucket = %config.storage.bucket, "opening repository");
    let client = client_for(&config, workdir);
    Repository::open(workdir, config, client).context("opening repository")
}

fn short(id: &ObjectId) -> colored::ColoredString {
    id.short_hex().yellow()
}

async fn cmd_init(workdir: &Path, args: InitArgs) -> anyhow::Result<()> {
    let target = match args.path {
        Some(path) => workdir.join(path),
        None => workdir.to_path_buf(),
    };
    std::fs::create_dir_all(&target).with_context(|| format!("creating {}", target.display()))?;

    let mut config = RepoConfig::new(args.bucket, args.prefix);
    if let Some(root) = args.root {
        config.storage.root = root;
    }
    if let Some(author) = args.author {
        config.user.author = author;
    }
    let client = client_for(&config, &target);
    let ctx = config.core.context();
    let repo = Repository::init(&ctx, &target, config, client).await?;

    println!(
        "{} Initialized empty gitk repository in {}",
        "✓".green().bold(),
        repo.workdir().join(".gitk").display().to_string().bold()
    );
    println!(
        "  Storage: {} (bucket {})",
        repo.config().storage_root(repo.workdir()).display(),
        repo.config().storage.bucket.cyan()
    );
    println!("  Branch: {}", DEFAULT_BRANCH.yellow());
    Ok(())
}

fn cmd_status(workdir: &Path) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let status = repo.status();
    if status.is_clean() {
        println!("Nothing staged since the last commit.");
        return Ok(());
    }
    for change in &status.changes {
        let code = match change.status {
            gitk_sdk::FileStatus::New => "A".green(),
            gitk_sdk::FileStatus::Modified => "M".yellow(),
            gitk_sdk::FileStatus::Deleted => "D".red(),
        };
        println!("  {code} {}", change.path);
    }
    Ok(())
}

async fn cmd_add(workdir: &Path, args: AddArgs) -> anyhow::Result<()> {
    let mut repo = open(workdir)?;
    let files = collect_files(repo.workdir(), &args.paths)?;
    if files.is_empty() {
        bail!("nothing specified, nothing added");
    }
    let ctx = repo.context();
    let staged = repo.add(&ctx, files).await.context("adding files")?;
    for entry in &staged {
        println!("  {} {} {}", "staged:".green(), entry.path, short(&entry.object_id));
    }
    Ok(())
}

async fn cmd_commit(workdir: &Path, args: CommitArgs) -> anyhow::Result<()> {
    let mut repo = open(workdir)?;
    let ctx = repo.context();
    let mut request = match (args.message, args.ai) {
        (Some(message), _) => CommitRequest::new(message),
        (None, true) => CommitRequest::assisted(),
        (None, false) => bail!("please provide a commit message with -m or use --ai"),
    };
    request.author = args.author;
    let outcome = repo.commit(&ctx, request).await.context("creating commit")?;
    let label = match outcome.updated_ref.strip_prefix("refs/heads/") {
        Some(branch) => branch.to_string(),
        None => "detached HEAD".to_string(),
    };
    let root = if outcome.commit.is_root() { " (root-commit)" } else { "" };
    println!(
        "[{}{} {}] {}",
        label.green(),
        root,
        short(&outcome.id),
        outcome.commit.summary()
    );
    Ok(())
}

async fn cmd_log(workdir: &Path, args: LogArgs) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let ctx = repo.context();
    let entries = repo.log(&ctx, args.limit).await?;
    if entries.is_empty() {
        println!("No commits yet.");
        return Ok(());
    }
    for entry in entries {
        if args.oneline {
            println!("{} {}", short(&entry.id), entry.commit.summary());
            continue;
        }
        println!("{} {}", "commit".yellow(), entry.id.to_hex().yellow());
        println!("Author: {}", entry.commit.author);
        println!("Date:   {}", entry.commit.timestamp.to_rfc2822());
        println!();
        for line in entry.commit.message.lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

async fn cmd_show(workdir: &Path, args: ShowArgs) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let ctx = repo.context();
    let id = repo.resolve(&ctx, &args.revision).await?;
    match repo.show(&ctx, &id).await? {
        Object::Blob(blob) => print!("{}", String::from_utf8_lossy(&blob.data)),
        Object::Tree(tree) => {
            for entry in &tree {
                println!(
                    "{} {} {}\t{}",
                    entry.mode.as_octal(),
                    entry.mode.target_kind(),
                    entry.target,
                    entry.name
                );
            }
        }
        Object::Commit(commit) => {
            println!("{} {}", "commit".yellow(), id.to_hex().yellow());
            println!("tree   {}", commit.tree);
            if let Some(parent) = commit.parent {
                println!("parent {parent}");
            }
            println!("Author: {}", commit.author);
            println!("Date:   {}", commit.timestamp.to_rfc2822());
            println!();
            for line in commit.message.lines() {
                println!("    {line}");
            }
        }
    }
    Ok(())
}

async fn cmd_branch(workdir: &Path, args: BranchArgs) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let ctx = repo.context();
    if let Some(name) = args.name {
        let start = match args.start {
            Some(rev) => Some(repo.resolve(&ctx, &rev).await?),
            None => None,
        };
        let target = repo.create_branch(&ctx, &name, start).await?;
        println!("Created branch {} at {}", name.yellow(), short(&target));
        return Ok(());
    }
    let branches = repo.branches(&ctx).await?;
    if branches.is_empty() {
        println!("No branches yet.");
    }
    for branch in branches {
        if branch.is_current {
            println!("* {} {}", branch.name.green().bold(), short(&branch.target));
        } else {
            println!("  {} {}", branch.name, short(&branch.target));
        }
    }
    Ok(())
}

fn cmd_remote(workdir: &Path, args: RemoteArgs) -> anyhow::Result<()> {
    let path = RepoConfig::path_in(workdir);
    let mut config = Repository::load_config(workdir)?;
    match args.action {
        Some(RemoteAction::Add { name, bucket, prefix }) => {
            config.add_remote(name.clone(), RemoteConfig::new(bucket.clone(), prefix.clone()))?;
            config.save(&path)?;
            println!("Added remote {} -> {}/{}", name.bold(), bucket.blue(), prefix);
        }
        Some(RemoteAction::Remove { name }) => {
            if config.remotes.remove(&name).is_none() {
                bail!("unknown remote: {name}");
            }
            config.save(&path)?;
            println!("Removed remote {}", name.bold());
        }
        None => {
            if config.remotes.is_empty() {
                println!("No remotes configured.");
            }
            for (name, remote) in &config.remotes {
                println!("{}\t{}/{}", name.bold(), remote.bucket, remote.prefix);
            }
        }
    }
    Ok(())
}

async fn current_or(repo: &Repository, branch: Option<String>) -> anyhow::Result<String> {
    if let Some(branch) = branch {
        return Ok(branch);
    }
    let ctx = repo.context();
    repo.current_branch(&ctx)
        .await?
        .context("HEAD is detached; name the branch to push")
}

async fn cmd_push(workdir: &Path, args: PushArgs) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let branch = current_or(&repo, args.branch).await?;
    let ctx = repo.context();
    let result = repo
        .push(&ctx, &args.remote, &branch, args.force)
        .await
        .with_context(|| format!("pushing {branch} to {}", args.remote))?;
    if result.update.is_noop() {
        println!("Everything up-to-date");
        return Ok(());
    }
    let from = result
        .update
        .old
        .map(|id| id.short_hex())
        .unwrap_or_else(|| "(new)".into());
    let marker = if result.forced { "+".red().bold() } else { " ".normal() };
    println!("To {}", args.remote.bold());
    println!(
        " {marker} {}..{}  {} -> {}",
        from,
        result.update.new.short_hex(),
        branch.yellow(),
        branch.yellow()
    );
    println!(
        "  {} objects copied, {} already present, {} bytes",
        result.stats.copied, result.stats.skipped, result.stats.bytes
    );
    Ok(())
}

async fn cmd_fetch(workdir: &Path, args: FetchArgs) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let ctx = repo.context();
    let result = repo
        .fetch(&ctx, &args.remote, &args.branch)
        .await
        .with_context(|| format!("fetching {} from {}", args.branch, args.remote))?;
    if result.update.is_noop() {
        println!("{}/{} already up to date", args.remote, args.branch);
        return Ok(());
    }
    println!("From {}", args.remote.bold());
    println!(
        "   {} -> {}  ({} objects, {} bytes)",
        args.branch.yellow(),
        result.update.name,
        result.stats.copied,
        result.stats.bytes
    );
    Ok(())
}

async fn cmd_refs(workdir: &Path) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let ctx = repo.context();
    for (name, value) in repo.references(&ctx).await? {
        match value {
            RefValue::Direct(id) => println!("{} {}", id.to_hex().yellow(), name),
            RefValue::Symbolic(target) => println!("{:<64} {} -> {}", "", name, target.cyan()),
        }
    }
    Ok(())
}

async fn cmd_gc(workdir: &Path, args: GcArgs) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let ctx = repo.context();
    let report = repo.gc(&ctx, args.dry_run).await.context("garbage collection")?;
    if report.dry_run {
        for id in &report.unreachable {
            println!("would remove {id}");
        }
        println!(
            "{} reachable, {} staged, {} unreachable (dry run)",
            report.reachable,
            report.pinned,
            report.unreachable.len()
        );
    } else {
        println!(
            "{} GC: {} objects removed, {} kept.",
            "✓".green(),
            report.unreachable.len(),
            report.reachable + report.pinned
        );
    }
    Ok(())
}

async fn cmd_fsck(workdir: &Path) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    let ctx = repo.context();
    let report = repo.fsck(&ctx).await.context("checking repository")?;
    for (id, reason) in &report.corrupt {
        println!("{} {id}: {reason}", "corrupt".red().bold());
    }
    for (name, target) in &report.dangling_refs {
        println!("{} {name} -> {target}", "dangling".red().bold());
    }
    for (name, reason) in &report.broken_history {
        println!("{} {name}: {reason}", "broken".red().bold());
    }
    if !report.is_clean() {
        bail!("repository check found problems");
    }
    println!(
        "{} {} objects checked, no issues.",
        "✓".green().bold(),
        report.objects_checked
    );
    Ok(())
}

async fn cmd_ai(workdir: &Path, args: AiArgs) -> anyhow::Result<()> {
    let repo = open(workdir)?;
    match args.action {
        AiAction::Review => {
            let review = repo.review().await.context("requesting review")?;
            for comment in &review.comments {
                println!(
                    "{}:{} [{}] {}",
                    comment.file.bold(),
                    comment.line,
                    comment.kind.cyan(),
                    comment.message
                );
            }
            if !review.summary.is_empty() {
                println!("\n{}", review.summary);
            }
        }
        AiAction::Analyze { path } => {
            let analysis = repo.analyze(&path).await.context("requesting analysis")?;
            println!("Score: {:.2}", analysis.score);
            for s in &analysis.suggestions {
                println!("{}:{} [{}] {}", s.file.bold(), s.line, s.severity.yellow(), s.message);
            }
        }
        AiAction::Docs { path } => {
            let docs = repo.docs(&path).await.context("requesting documentation")?;
            println!("{}", docs.content);
            for reference in &docs.references {
                println!("  see {}", reference.blue());
            }
        }
    }
    Ok(())
}
