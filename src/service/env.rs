//! Environment variable sources and merging.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, ServiceError};

/// Source of `KEY=VALUE` entries stored in env files.
pub trait EnvFileReader {
    /// Reads all entries of one env file, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn read(&self, path: &Path) -> Result<Vec<String>>;
}

/// Reads env files from the local filesystem with `dotenvy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotenvReader;

impl EnvFileReader for DotenvReader {
    fn read(&self, path: &Path) -> Result<Vec<String>> {
        let env_file_error = |source| ServiceError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        let entries = dotenvy::from_path_iter(path)
            .map_err(env_file_error)?
            .map(|item| item.map(|(key, value)| format!("{key}={value}")))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(env_file_error)?;

        debug!(path = %path.display(), entries = entries.len(), "Read env file");
        Ok(entries)
    }
}

/// Collects env-file entries (files in order) followed by inline entries.
///
/// # Errors
///
/// Returns the first error reported by `reader`.
pub fn read_kv_strings<P, S>(
    reader: &dyn EnvFileReader,
    files: &[P],
    inline: &[S],
) -> Result<Vec<String>>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    for file in files {
        entries.extend(reader.read(file.as_ref())?);
    }
    entries.extend(inline.iter().map(|s| s.as_ref().to_string()));
    Ok(entries)
}

fn env_key(entry: &str) -> &str {
    entry.split_once('=').map_or(entry, |(key, _)| key)
}

/// Keeps one entry per key: the last one, at the position of its last
/// mention.
///
/// `["A=1", "B=2", "A=3"]` becomes `["B=2", "A=3"]`.
#[must_use]
pub fn merge_env<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        last_index.insert(env_key(entry.as_ref()), index);
    }

    entries
        .iter()
        .enumerate()
        .filter(|(index, entry)| last_index.get(env_key(entry.as_ref())) == Some(index))
        .map(|(_, entry)| entry.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct StaticReader(Vec<(&'static str, Vec<&'static str>)>);

    impl EnvFileReader for StaticReader {
        fn read(&self, path: &Path) -> Result<Vec<String>> {
            Ok(self
                .0
                .iter()
                .find(|(name, _)| Path::new(name) == path)
                .map(|(_, entries)| entries.iter().map(ToString::to_string).collect())
                .unwrap_or_default())
        }
    }

    #[test]
    fn test_merge_env_last_write_wins() {
        let merged = merge_env(&["A=1", "B=2", "A=3"]);
        assert_eq!(merged, vec!["B=2", "A=3"]);
    }

    #[test]
    fn test_merge_env_keeps_untouched_order() {
        let merged = merge_env(&["C=1", "A=1", "B=2", "A=2", "D=4"]);
        assert_eq!(merged, vec!["C=1", "B=2", "A=2", "D=4"]);
    }

    #[test]
    fn test_merge_env_bare_keys_and_duplicates() {
        let merged = merge_env(&["A", "A=1", "B=2", "B=2"]);
        assert_eq!(merged, vec!["A=1", "B=2"]);
        assert!(merge_env::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_files_then_inline() {
        let reader = StaticReader(vec![("one.env", vec!["A=1", "B=2"])]);
        let entries = read_kv_strings(&reader, &["one.env"], &["A=3"]).unwrap();
        assert_eq!(entries, vec!["A=1", "B=2", "A=3"]);
        assert_eq!(merge_env(&entries), vec!["B=2", "A=3"]);
    }

    #[test]
    fn test_dotenv_reader() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "A=1").unwrap();
        writeln!(file, "GREETING=\"hello world\"").unwrap();
        file.flush().unwrap();

        let entries = DotenvReader.read(file.path()).unwrap();
        assert_eq!(entries, vec!["A=1", "GREETING=hello world"]);
    }

    #[test]
    fn test_dotenv_reader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.env");

        let err = DotenvReader.read(&path).unwrap_err();
        match err {
            ServiceError::EnvFile { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
