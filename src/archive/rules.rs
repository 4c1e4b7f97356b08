// ABOUTME: Server-supplied packaging rules and the per-file filter they define.
// ABOUTME: Files pass when their extension is allowed and no path component is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Component;

use crate::walk::FileSystemEntry;

/// Packaging rules fetched from the remote service.
///
/// An empty `acceptable_extensions` set allows every extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    #[serde(default)]
    pub acceptable_extensions: BTreeSet<String>,
    #[serde(default)]
    pub ignore_directories: BTreeSet<String>,
}

impl DeployConfig {
    pub fn new<E, D>(extensions: E, ignore_directories: D) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            acceptable_extensions: extensions.into_iter().map(Into::into).collect(),
            ignore_directories: ignore_directories.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `entry` belongs in the package.
    pub fn accepts(&self, entry: &FileSystemEntry) -> bool {
        entry.is_file() && self.extension_allowed(entry) && !self.is_ignored(entry)
    }

    fn extension_allowed(&self, entry: &FileSystemEntry) -> bool {
        if self.acceptable_extensions.is_empty() {
            return true;
        }
        let Some(extension) = entry.extension() else {
            return false;
        };
        // Rules may be written as ".js" or "js".
        self.acceptable_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.') == extension)
    }

    fn is_ignored(&self, entry: &FileSystemEntry) -> bool {
        entry
            .relative_path()
            .components()
            .any(|component| match component {
                Component::Normal(name) => name
                    .to_str()
                    .is_some_and(|name| self.ignore_directories.contains(name)),
                _ => false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::EntryKind;
    use std::path::Path;

    fn file(relative: &str) -> FileSystemEntry {
        let root = Path::new("/app");
        FileSystemEntry::new(root, root.join(relative), EntryKind::File)
    }

    #[test]
    fn empty_rules_accept_every_file() {
        let rules = DeployConfig::default();
        assert!(rules.accepts(&file("README")));
        assert!(rules.accepts(&file("lib/server.js")));
    }

    #[test]
    fn extensions_match_with_or_without_dot() {
        let rules = DeployConfig::new([".js", "json"], Vec::<String>::new());
        assert!(rules.accepts(&file("a.js")));
        assert!(rules.accepts(&file("package.json")));
        assert!(!rules.accepts(&file("b.txt")));
        assert!(!rules.accepts(&file("Makefile")));
    }

    #[test]
    fn any_ignored_component_excludes_file() {
        let rules = DeployConfig::new(Vec::<String>::new(), ["node_modules", "ignored"]);
        assert!(!rules.accepts(&file("node_modules/express/index.js")));
        assert!(!rules.accepts(&file("sub/ignored/c.js")));
        assert!(rules.accepts(&file("sub/kept/c.js")));
    }

    #[test]
    fn directories_are_never_accepted() {
        let rules = DeployConfig::default();
        let root = Path::new("/app");
        let dir = FileSystemEntry::new(root, root.join("lib"), EntryKind::Directory);
        assert!(!rules.accepts(&dir));
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{"acceptableExtensions": [".js"], "ignoreDirectories": ["tmp"]}"#;
        let rules: DeployConfig = serde_json::from_str(json).unwrap();
        assert!(rules.acceptable_extensions.contains(".js"));
        assert!(rules.ignore_directories.contains("tmp"));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let rules: DeployConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(rules, DeployConfig::default());
    }
}
