use crate::convert::has_extension;
use crate::error::TitleBlockError;
use std::path::{Path, PathBuf};

/// Files in `dir` whose extension is one of `extensions`, sorted by path.
///
/// Only the directory itself is listed unless `recursive` is set.
pub fn find_files(
    dir: &Path,
    extensions: &[String],
    recursive: bool,
) -> Result<Vec<PathBuf>, TitleBlockError> {
    let mut files = Vec::new();
    collect(dir, extensions, recursive, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(
    dir: &Path,
    extensions: &[String],
    recursive: bool,
    out: &mut Vec<PathBuf>,
) -> Result<(), TitleBlockError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if recursive {
                collect(&path, extensions, recursive, out)?;
            }
        } else if has_extension(&path, extensions) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_filters_by_extension_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.SLDDRW");
        touch(dir.path(), "a.slddrw");
        touch(dir.path(), "scan.tif");
        touch(dir.path(), "notes.txt");

        let found = find_files(dir.path(), &["slddrw".into()], false).unwrap();
        assert_eq!(names(&found), vec!["a.slddrw", "b.SLDDRW"]);
    }

    #[test]
    fn test_recursion_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "top.dwg");
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "nested.dwg");

        let exts = vec!["dwg".to_string()];
        assert_eq!(find_files(dir.path(), &exts, false).unwrap().len(), 1);
        assert_eq!(find_files(dir.path(), &exts, true).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let err = find_files(Path::new("/nonexistent/titleblock"), &["pdf".into()], false);
        assert!(matches!(err, Err(TitleBlockError::Io(_))));
    }
}
