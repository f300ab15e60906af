use crate::conf::ModelConf;
use crate::cv::net::Net;
use crate::error::{Error, Result};
use log::{debug, info};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Rank of a run directory: the number spelled by all digits in its name,
/// zero when there are none. Values beyond `u128` saturate.
pub fn run_rank(name: &str) -> u128 {
    name.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u128, |acc, d| acc.saturating_mul(10).saturating_add(d as u128))
}

fn has_digits(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_digit())
}

/// Orders run names by rank; on equal rank a name without digits wins, then
/// the lexicographically smaller name.
fn compare_runs(a: &str, b: &str) -> Ordering {
    run_rank(a)
        .cmp(&run_rank(b))
        .then_with(|| has_digits(b).cmp(&has_digits(a)))
        .then_with(|| b.cmp(a))
}

/// Picks the most recent run directory below `model_directory`.
pub fn latest_run(model_directory: &Path) -> Result<PathBuf> {
    let mut runs = Vec::new();
    for entry in fs::read_dir(model_directory)? {
        let entry = entry?;
        // follows symlinked runs
        if entry.path().is_dir() {
            runs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    debug!("Run directories in {}: {:?}", model_directory.display(), runs);

    runs.into_iter()
        .max_by(|a, b| compare_runs(a, b))
        .map(|run| model_directory.join(run))
        .ok_or_else(|| Error::NoRunDirectories(model_directory.to_path_buf()))
}

/// Weights file of the most recent run, checked to exist.
pub fn latest_weights(model_directory: &Path, weights: &Path) -> Result<PathBuf> {
    let run = latest_run(model_directory)?;
    if let Some(name) = run.file_name() {
        info!("Using {}.", name.to_string_lossy());
    }

    let model_path = run.join(weights);
    if !model_path.is_file() {
        return Err(Error::MissingWeights(model_path));
    }
    Ok(model_path)
}

/// Loads the detector of the most recent run together with its weights path.
pub fn get_trained_model(model_directory: &Path, conf: &ModelConf) -> Result<(Net, PathBuf)> {
    let model_path = latest_weights(model_directory, &conf.weights)?;
    let model = Net::from_weights(&model_path, conf)?;
    Ok((model, model_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> PathBuf {
        ModelConf::default().weights
    }

    fn make_runs(root: &Path, names: &[&str]) {
        for name in names {
            let dir = root.join(name).join("weights");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("best.onnx"), "").unwrap();
        }
    }

    #[test]
    fn rank_uses_all_digits() {
        assert_eq!(run_rank("train"), 0);
        assert_eq!(run_rank("run10"), 10);
        assert_eq!(run_rank("exp2_v3"), 23);
        assert_eq!(run_rank(&"9".repeat(60)), u128::MAX);
    }

    #[test]
    fn picks_numerically_largest_run() {
        let dir = tempfile::tempdir().unwrap();
        make_runs(dir.path(), &["run1", "run2", "run10"]);
        fs::write(dir.path().join("run99.txt"), "").unwrap();

        let run = latest_run(dir.path()).unwrap();

        assert_eq!(run, dir.path().join("run10"));
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_runs() {
        let dir = tempfile::tempdir().unwrap();
        let runs = dir.path().join("runs");
        let store = dir.path().join("store");
        make_runs(&runs, &["run1"]);
        make_runs(&store, &["run10"]);
        std::os::unix::fs::symlink(store.join("run10"), runs.join("run10")).unwrap();

        let path = latest_weights(&runs, &weights()).unwrap();

        assert_eq!(path, runs.join("run10").join("weights").join("best.onnx"));
    }

    #[test]
    fn single_run_without_digits() {
        let dir = tempfile::tempdir().unwrap();
        make_runs(dir.path(), &["train"]);

        let path = latest_weights(dir.path(), &weights()).unwrap();

        assert_eq!(path, dir.path().join("train").join("weights").join("best.onnx"));
    }

    #[test]
    fn ties_prefer_names_without_digits() {
        assert_eq!(compare_runs("train", "train0"), Ordering::Greater);
        assert_eq!(compare_runs("run01", "run1"), Ordering::Greater);
        assert_eq!(compare_runs("run3", "run10"), Ordering::Less);
    }

    #[test]
    fn empty_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        let err = latest_run(dir.path()).unwrap_err();

        assert!(matches!(err, Error::NoRunDirectories(_)));
    }

    #[test]
    fn missing_weights_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        make_runs(dir.path(), &["run1"]);
        fs::create_dir(dir.path().join("run2")).unwrap();

        let err = latest_weights(dir.path(), &weights()).unwrap_err();

        match err {
            Error::MissingWeights(path) => assert!(path.starts_with(dir.path().join("run2"))),
            other => panic!("unexpected error: {other}"),
        }
    }
}
