use std::path::{Component, Path, PathBuf};

/// Immediate subdirectories of `dir`, sorted by name so ids stay stable across scans.
pub fn sorted_subdirectories(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a `/`-separated request path onto `root`, refusing anything that could
/// leave it.
pub fn join_relative(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." || segment.contains('\\') || Path::new(segment).is_absolute() {
            return None;
        }
        out.push(segment);
    }
    Some(out)
}

/// True when any component of `path` starts with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_relative_rejects_traversal() {
        let root = Path::new("/srv/models");
        assert_eq!(
            join_relative(root, "a/./b.json"),
            Some(PathBuf::from("/srv/models/a/b.json"))
        );
        assert_eq!(join_relative(root, "a/../../etc/passwd"), None);
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("/srv/models/.git/index")));
        assert!(!is_hidden(Path::new("/srv/models/shizuku/index.json")));
    }

    #[test]
    fn test_sorted_subdirectories_skips_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("c.txt"), "").unwrap();
        let names: Vec<_> = sorted_subdirectories(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
