use crate::error::Result;
use std::fmt::Write;
use std::fs;
use std::path::Path;

const INDENT: &str = "    ";

/// Hidden entries: dot files and dunder names such as `__pycache__`.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with("__")
}

/// Renders the directory tree under `root` as indented text.
///
/// Directories end in `/`. Hidden entries are skipped and hidden directories
/// are not descended into. With `show_files` the files of every directory are
/// listed one level deeper than the directory itself.
pub fn render_tree(root: &Path, show_files: bool) -> Result<String> {
    let mut out = String::new();
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    render_dir(root, &name, 0, show_files, &mut out)?;
    Ok(out)
}

pub fn print_tree(root: &Path, show_files: bool) -> Result<()> {
    print!("{}", render_tree(root, show_files)?);
    Ok(())
}

fn render_dir(dir: &Path, name: &str, level: usize, show_files: bool, out: &mut String) -> Result<()> {
    let _ = writeln!(out, "{}{}/", INDENT.repeat(level), name);

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&entry_name) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            // symlinked directories are listed but not walked
            let descend = !entry.file_type()?.is_symlink();
            dirs.push((entry_name, path, descend));
        } else {
            files.push(entry_name);
        }
    }
    dirs.sort();
    files.sort();

    if show_files {
        let indent = INDENT.repeat(level + 1);
        for file in &files {
            let _ = writeln!(out, "{indent}{file}");
        }
    }

    for (entry_name, path, descend) in &dirs {
        if *descend {
            render_dir(path, entry_name, level + 1, show_files, out)?;
        } else {
            let _ = writeln!(out, "{}{}/", INDENT.repeat(level + 1), entry_name);
        }
    }

    Ok(())
}
