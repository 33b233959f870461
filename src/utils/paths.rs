// Path Conversion Utilities
//
// Stored paths are Unix-style strings (`/` separators), relative to the
// workspace root when one is configured. Module resolution works purely on
// these strings, so `.`/`..` are folded lexically and never touch the disk.

use anyhow::{Context, Result};
use std::path::{Path, MAIN_SEPARATOR};

/// Convert an absolute path to a relative Unix-style path (with `/` separators)
///
/// # Examples
/// ```
/// use callgraph_core::utils::paths::to_relative_unix_style;
/// use std::path::Path;
///
/// let relative = to_relative_unix_style(
///     Path::new("/home/dev/project/src/main.ts"),
///     Path::new("/home/dev/project"),
/// ).unwrap();
/// assert_eq!(relative, "src/main.ts");
/// ```
pub fn to_relative_unix_style(absolute: &Path, workspace_root: &Path) -> Result<String> {
    // Canonicalize when both exist so symlinked roots (/var -> /private/var) still match
    let (path_to_use, root_to_use) = match (absolute.canonicalize(), workspace_root.canonicalize())
    {
        (Ok(canonical_abs), Ok(canonical_root)) => (canonical_abs, canonical_root),
        _ => (absolute.to_path_buf(), workspace_root.to_path_buf()),
    };

    #[cfg(windows)]
    fn strip_unc_prefix(path: &Path) -> std::path::PathBuf {
        let path_str = path.to_string_lossy();
        if let Some(stripped) = path_str.strip_prefix(r"\\?\") {
            std::path::PathBuf::from(stripped)
        } else {
            path.to_path_buf()
        }
    }

    #[cfg(not(windows))]
    fn strip_unc_prefix(path: &Path) -> std::path::PathBuf {
        path.to_path_buf()
    }

    let normalized_path = strip_unc_prefix(&path_to_use);
    let normalized_root = strip_unc_prefix(&root_to_use);

    let relative = normalized_path
        .strip_prefix(&normalized_root)
        .with_context(|| {
            format!(
                "File path '{}' is not within workspace root '{}'",
                normalized_path.display(),
                normalized_root.display()
            )
        })?;

    let path_str = relative.to_str().context("Path contains invalid UTF-8")?;
    Ok(to_unix_separators(path_str))
}

/// Unix-style form of a path as given, without making it relative
pub fn to_unix_style(path: &Path) -> String {
    normalize_unix(&to_unix_separators(&path.to_string_lossy()))
}

fn to_unix_separators(path: &str) -> String {
    if MAIN_SEPARATOR == '\\' {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

/// Fold `.` and `..` segments and duplicate separators.
///
/// Leading `..` segments of a relative path are kept (`../a/./b` -> `../a/b`);
/// `..` never climbs above the root of an absolute path.
pub fn normalize_unix(path: &str) -> String {
    let is_absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if is_absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if is_absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Directory part of a Unix-style path (`src/a.ts` -> `src`, `a.ts` -> ``)
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => "",
    }
}

/// Join a relative Unix-style path onto a directory and normalize the result
pub fn join_unix(dir: &str, relative: &str) -> String {
    if relative.starts_with('/') || dir.is_empty() {
        return normalize_unix(relative);
    }
    normalize_unix(&format!("{}/{}", dir, relative))
}
