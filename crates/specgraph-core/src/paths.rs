use std::path::{Component, Path};

/// Render a path with forward slashes regardless of platform.
pub fn to_posix(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::CurDir => {}
            Component::Normal(part) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&part.to_string_lossy());
            }
            Component::ParentDir => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str("..");
            }
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
        }
    }
    out
}

/// Express `path` relative to `root` as a POSIX string. Returns `None` when
/// the path does not live under the root.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let posix = to_posix(rel);
    if posix.is_empty() {
        None
    } else {
        Some(posix)
    }
}

/// Normalize a caller-supplied relative path: forward slashes, no leading
/// `./`, no trailing slash, `..` collapsed lexically where safe.
pub fn normalize_relative(raw: &str) -> String {
    let cleaned = raw.trim().replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in cleaned.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(&last) if last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Lowercased path segments (directories plus file name) of a POSIX path.
pub fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// File stem of a POSIX path, without any extension.
pub fn stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.split_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Final dotted extension (lowercased, with leading dot), if any.
pub fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let idx = name.rfind('.')?;
    if idx == 0 {
        return None;
    }
    Some(name[idx..].to_lowercase())
}

/// Parent directory of a POSIX path ("" at the root).
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Join two POSIX fragments, skipping empty components.
pub fn join(base: &str, rest: &str) -> String {
    if base.is_empty() {
        normalize_relative(rest)
    } else if rest.is_empty() {
        normalize_relative(base)
    } else {
        normalize_relative(&format!("{base}/{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_paths_are_posix() {
        let root = PathBuf::from("/repo");
        let file = PathBuf::from("/repo/src/api/users.ts");
        assert_eq!(
            relative_to(&root, &file).as_deref(),
            Some("src/api/users.ts")
        );
        assert_eq!(relative_to(&root, &PathBuf::from("/elsewhere/x")), None);
    }

    #[test]
    fn normalize_strips_dot_segments() {
        assert_eq!(normalize_relative("./a/b/../c//d/"), "a/c/d");
        assert_eq!(normalize_relative("a\\b\\c"), "a/b/c");
        assert_eq!(normalize_relative("../shared"), "../shared");
    }

    #[test]
    fn stem_and_extension() {
        assert_eq!(stem("src/user.service.ts"), "user");
        assert_eq!(extension("src/user.service.ts").as_deref(), Some(".ts"));
        assert_eq!(extension("Makefile"), None);
        assert_eq!(parent("src/api/users.ts"), "src/api");
        assert_eq!(parent("users.ts"), "");
    }

    #[test]
    fn join_collapses() {
        assert_eq!(join("src/api", "../util/helpers.ts"), "src/util/helpers.ts");
        assert_eq!(join("", "x.py"), "x.py");
    }
}
