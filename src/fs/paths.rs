//! Lexical path arithmetic
//!
//! Nothing here touches the filesystem. Paths are joined and normalized
//! component by component so that root and prefix components (`/`, `C:\`,
//! `\\?\C:\`, `\\server\share`) survive untouched.

use crate::error::PathError;
use std::path::{Component, Path, PathBuf};

/// Join `fragments` onto `base` and normalize the result.
///
/// - `.` components are dropped
/// - `..` pops the previous component but never climbs above the root
/// - a fragment that is itself rooted (or carries a prefix) restarts the path
pub fn combine<P: AsRef<Path>>(base: &Path, fragments: &[P]) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    push_components(&mut parts, base);
    for fragment in fragments {
        push_components(&mut parts, fragment.as_ref());
    }

    parts.iter().collect()
}

/// Normalize a single path (same rules as [`combine`])
pub fn normalize(path: &Path) -> PathBuf {
    combine::<&Path>(path, &[])
}

fn push_components<'a>(parts: &mut Vec<Component<'a>>, path: &'a Path) {
    for component in path.components() {
        match component {
            Component::Prefix(_) => {
                parts.clear();
                parts.push(component);
            }
            Component::RootDir => {
                // Keep a drive prefix (`C:` + `\`), drop everything else
                parts.retain(|c| matches!(c, Component::Prefix(_)));
                parts.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => match parts.last().copied() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            Component::Normal(_) => parts.push(component),
        }
    }
}

/// Express `full` relative to `base`.
///
/// Both paths are normalized first. Fails when `base` is not a component-wise
/// prefix of `full`; comparison is case-insensitive on Windows only.
pub fn relative_to(full: &Path, base: &Path) -> Result<PathBuf, PathError> {
    let full_norm = normalize(full);
    let base_norm = normalize(base);

    let mut full_iter = full_norm.components();
    for base_part in base_norm.components() {
        match full_iter.next() {
            Some(full_part) if components_eq(&full_part, &base_part) => {}
            _ => {
                return Err(PathError::NotUnderBase {
                    path: full.to_path_buf(),
                    base: base.to_path_buf(),
                })
            }
        }
    }

    Ok(full_iter.as_path().to_path_buf())
}

#[cfg(windows)]
fn components_eq(a: &Component<'_>, b: &Component<'_>) -> bool {
    a.as_os_str()
        .to_string_lossy()
        .eq_ignore_ascii_case(&b.as_os_str().to_string_lossy())
}

#[cfg(not(windows))]
fn components_eq(a: &Component<'_>, b: &Component<'_>) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_collapses_dots() {
        let path = combine(Path::new("/data"), &["a/./b", "../c"]);
        assert_eq!(path, PathBuf::from("/data/a/c"));
    }

    #[test]
    fn test_combine_never_climbs_above_root() {
        let path = combine(Path::new("/"), &["../../etc"]);
        assert_eq!(path, PathBuf::from("/etc"));
    }

    #[test]
    fn test_combine_rooted_fragment_resets() {
        let path = combine(Path::new("/data/a"), &["/other", "x"]);
        assert_eq!(path, PathBuf::from("/other/x"));
    }

    #[test]
    fn test_combine_keeps_leading_parent_on_relative_base() {
        let path = combine(Path::new("../up"), &["../.."]);
        assert_eq!(path, PathBuf::from("../.."));
    }

    #[test]
    fn test_relative_to() {
        let rel = relative_to(Path::new("/data/a/b.txt"), Path::new("/data")).unwrap();
        assert_eq!(rel, PathBuf::from("a/b.txt"));

        let rel = relative_to(Path::new("/data"), Path::new("/data/")).unwrap();
        assert_eq!(rel, PathBuf::new());
    }

    #[test]
    fn test_relative_to_rejects_sibling_prefix() {
        // "/database" starts with "/data" as a string but not as components
        let err = relative_to(Path::new("/database/x"), Path::new("/data")).unwrap_err();
        assert!(matches!(err, PathError::NotUnderBase { .. }));
    }

    #[cfg(windows)]
    #[test]
    fn test_verbatim_prefix_survives() {
        let path = combine(Path::new(r"\\?\C:\data"), &["a", "..", "b"]);
        assert_eq!(path, PathBuf::from(r"\\?\C:\data\b"));
    }
}
