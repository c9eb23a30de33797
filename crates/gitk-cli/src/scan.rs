//! Working-tree scanning for `gitk add`.

use std::path::{Component, Path};

use anyhow::{bail, Context};
use gitk_sdk::config::GITK_DIR;
use gitk_sdk::{EntryMode, WorkingFile};
use walkdir::WalkDir;

/// Read every file under `targets` (files or directories relative to
/// `workdir`), skipping the `.gitk` metadata directory.
pub fn collect_files(
    workdir: &Path,
    targets: &[impl AsRef<Path>],
) -> anyhow::Result<Vec<WorkingFile>> {
    let mut files = Vec::new();
    for target in targets {
        let start = workdir.join(target.as_ref());
        if std::fs::symlink_metadata(&start).is_err() {
            bail!("pathspec {} did not match any files", target.as_ref().display());
        }
        let walker = WalkDir::new(&start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != GITK_DIR);
        for entry in walker {
            let entry = entry.with_context(|| format!("walking {}", start.display()))?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            let path = relative_path(workdir, entry.path())?;
            let file = if file_type.is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .with_context(|| format!("reading link {}", entry.path().display()))?;
                WorkingFile::new(path, target.to_string_lossy().into_owned())
                    .with_mode(EntryMode::Symlink)
            } else {
                let data = std::fs::read(entry.path())
                    .with_context(|| format!("reading {}", entry.path().display()))?;
                WorkingFile::new(path, data).with_mode(file_mode(&entry))
            };
            files.push(file);
        }
    }
    Ok(files)
}

/// `/`-separated path of `path` below `root`.
fn relative_path(root: &Path, path: &Path) -> anyhow::Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside the repository", path.display()))?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => bail!("{} is outside the repository", path.display()),
        }
    }
    if parts.is_empty() {
        bail!("{} is not a file", path.display());
    }
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn file_mode(entry: &walkdir::DirEntry) -> EntryMode {
    use std::os::unix::fs::PermissionsExt;

    match entry.metadata() {
        Ok(meta) if meta.permissions().mode() & 0o111 != 0 => EntryMode::Executable,
        _ => EntryMode::Regular,
    }
}

#[cfg(not(unix))]
fn file_mode(_entry: &walkdir::DirEntry) -> EntryMode {
    EntryMode::Regular
}
