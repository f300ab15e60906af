use crate::error::{Error, Result};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Copies `source` into `destination`, prefixing the file name with a fresh
/// UUID. Failures are logged and reported as `None`.
pub fn copy_with_unique_name(source: &Path, destination: &Path) -> Option<PathBuf> {
    match try_copy_with_unique_name(source, destination) {
        Ok(target) => {
            info!(
                "File '{}' successfully copied to '{}'.",
                source.display(),
                target.display()
            );
            Some(target)
        }
        Err(e) => {
            error!("An error occurred: {}", e);
            None
        }
    }
}

/// Fallible variant of [`copy_with_unique_name`].
///
/// The destination directory is created when missing and the source's
/// modification time is carried over to the copy.
pub fn try_copy_with_unique_name(source: &Path, destination: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(Error::SourceMissing(source.to_path_buf()));
    }

    let file_name = source
        .file_name()
        .ok_or_else(|| Error::SourceMissing(source.to_path_buf()))?;

    let target = destination.join(unique_name(&file_name.to_string_lossy()));

    fs::create_dir_all(destination)?;
    fs::copy(source, &target)?;

    discard_on_error(&target, copy_modified_time(source, &target))?;

    Ok(target)
}

/// Removes a half-finished copy so a failure never leaves a file behind.
fn discard_on_error(target: &Path, result: std::io::Result<()>) -> Result<()> {
    if let Err(e) = result {
        fs::remove_file(target)?;
        return Err(e.into());
    }
    Ok(())
}

fn copy_modified_time(source: &Path, target: &Path) -> std::io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    fs::File::options()
        .write(true)
        .open(target)?
        .set_modified(modified)
}

fn unique_name(file_name: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");

        let copied = copy_with_unique_name(&dir.path().join("nope.jpg"), &dest);

        assert!(copied.is_none());
        assert!(!dest.exists());
        assert!(matches!(
            try_copy_with_unique_name(&dir.path().join("nope.jpg"), &dest),
            Err(Error::SourceMissing(_))
        ));
    }

    #[test]
    fn copies_with_uuid_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cat.png");
        fs::write(&source, b"not really a png").unwrap();
        let dest = dir.path().join("a").join("b");

        let target = copy_with_unique_name(&source, &dest).unwrap();

        let entries: Vec<_> = fs::read_dir(&dest).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let name = target.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_cat.png"));
        assert!(Uuid::parse_str(&name[..36]).is_ok());
        assert_eq!(name.len(), 36 + "_cat.png".len());
        assert_eq!(fs::read(&target).unwrap(), b"not really a png");
    }

    #[test]
    fn preserves_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        fs::write(&source, "x").unwrap();
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        fs::File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let target = try_copy_with_unique_name(&source, dir.path()).unwrap();

        assert_eq!(fs::metadata(target).unwrap().modified().unwrap(), past);
    }

    #[test]
    fn failed_metadata_copy_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("copy.txt");
        fs::write(&target, "x").unwrap();

        let failed = copy_modified_time(&dir.path().join("gone.txt"), &target);
        let err = discard_on_error(&target, failed).unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn successful_metadata_copy_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("copy.txt");
        fs::write(&target, "x").unwrap();

        discard_on_error(&target, Ok(())).unwrap();

        assert!(target.exists());
    }

    #[test]
    fn repeated_copies_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.bmp");
        fs::write(&source, "x").unwrap();
        let dest = dir.path().join("out");

        let first = try_copy_with_unique_name(&source, &dest).unwrap();
        let second = try_copy_with_unique_name(&source, &dest).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 2);
    }
}
