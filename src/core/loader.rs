//! Record loading utilities
//!
//! Generic helpers for reading YAML records out of a project directory.
//! Records are identified by a key field inside the file (item code, set
//! name, product, order name); file names are only a convenience.

use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::core::project::{Project, RecordDir};
use crate::yaml::{read_file, YamlError};

/// Load every record of a kind
///
/// Files that fail to parse are skipped with a warning.
pub fn load_all<T: DeserializeOwned + 'static>(project: &Project, kind: RecordDir) -> Vec<(PathBuf, T)> {
    project
        .iter_record_files(kind)
        .filter_map(|path| match read_file::<T>(&path) {
            Ok(record) => Some((path, record)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                None
            }
        })
        .collect()
}

/// Find the record whose key matches
///
/// The conventional file (`<slug>.yaml`) is tried first and parse errors in it
/// are reported; otherwise every file of the kind is scanned.
pub fn find_record<T, F>(
    project: &Project,
    kind: RecordDir,
    key: &str,
    key_of: F,
) -> Result<Option<(PathBuf, T)>, YamlError>
where
    T: DeserializeOwned + 'static,
    F: Fn(&T) -> &str,
{
    let conventional = project.record_path(kind, key);
    if conventional.exists() {
        let record: T = read_file(&conventional)?;
        if key_of(&record) == key {
            return Ok(Some((conventional, record)));
        }
    }

    Ok(load_all::<T>(project, kind)
        .into_iter()
        .find(|(_, record)| key_of(record) == key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MaterialSpecSet;
    use crate::yaml::write_file;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_all_empty_project() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let sets: Vec<(PathBuf, MaterialSpecSet)> = load_all(&project, RecordDir::MaterialSets);
        assert!(sets.is_empty());
    }

    #[test]
    fn test_load_all_skips_bad_files() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let dir = project.dir(RecordDir::MaterialSets);
        fs::write(dir.join("good.yaml"), "name: Good\ndensity_factor: 0.01\n").unwrap();
        fs::write(dir.join("bad.yaml"), "name: [unclosed\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let sets: Vec<(PathBuf, MaterialSpecSet)> = load_all(&project, RecordDir::MaterialSets);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].1.name, "Good");
    }

    #[test]
    fn test_find_record_by_key_field() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let dir = project.dir(RecordDir::MaterialSets);
        // File name unrelated to the key
        write_file(&dir.join("heavy.yaml"), &MaterialSpecSet::new("SS 304 Heavy")).unwrap();

        let found: Option<(PathBuf, MaterialSpecSet)> =
            find_record(&project, RecordDir::MaterialSets, "SS 304 Heavy", |s: &MaterialSpecSet| {
                s.name.as_str()
            })
            .unwrap();
        assert_eq!(found.unwrap().0, dir.join("heavy.yaml"));

        let missing: Option<(PathBuf, MaterialSpecSet)> =
            find_record(&project, RecordDir::MaterialSets, "Other", |s: &MaterialSpecSet| {
                s.name.as_str()
            })
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_find_record_reports_broken_conventional_file() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let path = project.record_path(RecordDir::MaterialSets, "SS 304");
        fs::write(&path, "name: SS 304\ndensity_factor: [1\n").unwrap();

        let result: Result<Option<(PathBuf, MaterialSpecSet)>, YamlError> =
            find_record(&project, RecordDir::MaterialSets, "SS 304", |s: &MaterialSpecSet| {
                s.name.as_str()
            });
        assert!(result.is_err());
    }
}
