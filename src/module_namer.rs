//! Module naming: file paths and import specifiers to Closure module ids.
//!
//! `goog.module` ids are dotted names. The default namer resolves relative
//! specifiers against the importing file, strips the extension, and joins
//! path segments with dots, sanitizing anything a dotted id cannot carry.
//! Callers with their own naming scheme implement [`ModuleNameMapper`].

/// Maps paths and specifiers to Closure module ids. Pure functions.
pub trait ModuleNameMapper {
    /// Module id for an import specifier, resolved relative to the
    /// importing file (`context`).
    fn path_to_module_name(&self, context: &str, specifier: &str) -> String;

    /// Module id of a file being converted.
    fn file_name_to_module_id(&self, file_name: &str) -> String {
        self.path_to_module_name("", file_name)
    }
}

/// The default dotted-path namer.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultModuleNamer;

impl ModuleNameMapper for DefaultModuleNamer {
    fn path_to_module_name(&self, context: &str, specifier: &str) -> String {
        let resolved = if specifier.starts_with('.') {
            join_paths(dirname(context), specifier)
        } else {
            specifier.to_string()
        };
        let trimmed = strip_ts_extension(&resolved);
        trimmed
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(sanitize_segment)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Strip `.ts`, `.tsx`, `.d.ts`, `.js` extensions.
pub fn strip_ts_extension(path: &str) -> String {
    for extension in [".d.ts", ".tsx", ".ts", ".js"] {
        if let Some(stripped) = path.strip_suffix(extension) {
            return stripped.to_string();
        }
    }
    path.to_string()
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory portion of a path, without the trailing slash.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Join a relative specifier onto a directory, normalizing `.` and `..`.
pub fn join_paths(dir: &str, specifier: &str) -> String {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Normalize a path in place: resolve `.` and `..` segments.
pub fn normalize_path(path: &str) -> String {
    join_paths("", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_specifier() {
        let namer = DefaultModuleNamer;
        assert_eq!(namer.path_to_module_name("pkg/thisfile.ts", "./dep"), "pkg.dep");
        assert_eq!(
            namer.path_to_module_name("a/b/c.ts", "../sibling/mod"),
            "a.sibling.mod"
        );
    }

    #[test]
    fn test_file_name_to_module_id() {
        let namer = DefaultModuleNamer;
        assert_eq!(namer.file_name_to_module_id("pkg/thisfile.ts"), "pkg.thisfile");
        assert_eq!(namer.file_name_to_module_id("pkg/types.d.ts"), "pkg.types");
    }

    #[test]
    fn test_sanitizes_invalid_characters() {
        let namer = DefaultModuleNamer;
        assert_eq!(
            namer.path_to_module_name("", "some-pkg/mod.name"),
            "some_pkg.mod_name"
        );
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("a/b", "./c"), "a/b/c");
        assert_eq!(join_paths("a/b", "../c"), "a/c");
        assert_eq!(join_paths("", "./c"), "c");
    }
}
