//! Module resolution index
//!
//! Maps import specifiers to analyzed files. Everything here works on stored
//! paths (Unix-style strings); the file system is never consulted, so a
//! specifier resolves only to a file that is part of the analysis.

use std::collections::HashMap;

use crate::config::PathMapping;
use crate::utils::paths::{join_unix, normalize_unix, parent_dir};

/// Suffixes tried after a specifier, in precedence order
const CANDIDATE_SUFFIXES: &[&str] = &[
    "",
    ".ts",
    ".tsx",
    "/index.ts",
    "/index.tsx",
    ".d.ts",
    "/index.d.ts",
    ".js",
    ".jsx",
    ".mjs",
    ".cjs",
    "/index.js",
    "/index.jsx",
];

/// TypeScript sources an ESM-style `.js` specifier may stand for
const SOURCE_EXTENSION_SWAPS: &[(&str, &[&str])] = &[
    (".js", &[".ts", ".tsx", ".d.ts"]),
    (".jsx", &[".tsx"]),
    (".mjs", &[".mts", ".d.mts"]),
    (".cjs", &[".cts", ".d.cts"]),
];

/// Stored path -> file slot, plus the alias table from the project config
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    files: HashMap<String, usize>,
    aliases: Vec<PathMapping>,
    /// Directory alias targets are joined onto
    alias_base: Option<String>,
    /// `baseUrl`, for non-relative specifiers no alias claims
    base_url: Option<String>,
}

impl ModuleIndex {
    /// Index analyzed files by their normalized stored path.
    ///
    /// The first file registered under a path keeps it.
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut files = HashMap::new();
        for (slot, path) in paths.into_iter().enumerate() {
            files.entry(normalize_unix(path)).or_insert(slot);
        }
        Self {
            files,
            ..Default::default()
        }
    }

    /// Attach `paths` aliases and `baseUrl`, both expressed in stored-path space
    pub fn with_aliases(
        mut self,
        aliases: Vec<PathMapping>,
        alias_base: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        self.aliases = aliases;
        self.alias_base = alias_base.map(|dir| normalize_unix(&dir));
        self.base_url = base_url.map(|dir| normalize_unix(&dir));
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Slot of the file `specifier` refers to when imported from `from_file`
    pub fn resolve(&self, from_file: &str, specifier: &str) -> Option<usize> {
        if is_relative(specifier) {
            return self.try_candidates(&join_unix(parent_dir(from_file), specifier));
        }
        if specifier.starts_with('/') {
            return self.try_candidates(&normalize_unix(specifier));
        }

        if let Some(slot) = self.resolve_alias(specifier) {
            return Some(slot);
        }
        let base_url = self.base_url.as_deref()?;
        self.try_candidates(&join_unix(base_url, specifier))
    }

    /// First matching `paths` pattern wins; its targets are tried in order
    fn resolve_alias(&self, specifier: &str) -> Option<usize> {
        let base = self.alias_base.as_deref().unwrap_or("");
        let (mapping, wildcard) = self.aliases.iter().find_map(|mapping| {
            mapping
                .match_specifier(specifier)
                .map(|wildcard| (mapping, wildcard))
        })?;

        mapping
            .substitute(&wildcard)
            .find_map(|target| self.try_candidates(&join_unix(base, &target)))
    }

    /// Exact path, then TypeScript sources behind a `.js`-family extension,
    /// then the extension and index-file suffixes
    fn try_candidates(&self, candidate: &str) -> Option<usize> {
        if candidate.is_empty() {
            return None;
        }
        if let Some(&slot) = self.files.get(candidate) {
            return Some(slot);
        }

        for (extension, replacements) in SOURCE_EXTENSION_SWAPS {
            if let Some(stem) = candidate.strip_suffix(extension) {
                for replacement in *replacements {
                    if let Some(&slot) = self.files.get(&format!("{}{}", stem, replacement)) {
                        return Some(slot);
                    }
                }
            }
        }

        CANDIDATE_SUFFIXES
            .iter()
            .skip(1)
            .find_map(|suffix| self.files.get(&format!("{}{}", candidate, suffix)).copied())
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use std::fs;
    use tempfile::TempDir;

    fn index(paths: &[&str]) -> ModuleIndex {
        ModuleIndex::new(paths.iter().copied())
    }

    #[test]
    fn test_relative_candidate_order() {
        let modules = index(&[
            "src/util.js",
            "src/util.ts",
            "src/util/index.ts",
            "src/app/main.ts",
            "src/lib/index.tsx",
        ]);

        assert_eq!(modules.resolve("src/app/main.ts", "../util"), Some(1));
        assert_eq!(modules.resolve("src/app/main.ts", "../util.js"), Some(0));
        assert_eq!(modules.resolve("src/app/main.ts", "../util/index"), Some(2));
        assert_eq!(modules.resolve("src/app/main.ts", "../lib"), Some(4));
        assert_eq!(modules.resolve("src/app/main.ts", "./missing"), None);
        assert_eq!(modules.resolve("src/app/main.ts", "react"), None);
    }

    #[test]
    fn test_esm_js_specifier_finds_ts_source() {
        let modules = index(&["src/a.ts", "src/b.ts"]);
        assert_eq!(modules.resolve("src/b.ts", "./a.js"), Some(0));
    }

    #[test]
    fn test_declaration_files_and_js_fallbacks() {
        let modules = index(&["types/api.d.ts", "lib/legacy.cjs", "lib/widgets/index.jsx"]);
        assert_eq!(modules.resolve("main.ts", "./types/api"), Some(0));
        assert_eq!(modules.resolve("main.ts", "./lib/legacy"), Some(1));
        assert_eq!(modules.resolve("main.ts", "./lib/widgets"), Some(2));
    }

    #[test]
    fn test_first_registration_keeps_path() {
        let modules = index(&["src/a.ts", "src/./a.ts"]);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules.resolve("src/b.ts", "./a"), Some(0));
    }

    #[test]
    fn test_aliases_and_base_url() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("tsconfig.json"),
            r#"{"compilerOptions": {"baseUrl": ".", "paths": {"@app/*": ["src/app/*", "src/fallback/*"], "@core": ["src/core/index.ts"]}}}"#,
        )
        .unwrap();
        let config = ProjectConfig::discover(temp.path()).unwrap();

        let modules = index(&[
            "src/app/feature.ts",
            "src/fallback/other.ts",
            "src/core/index.ts",
            "shared/log.ts",
        ])
        .with_aliases(config.path_mappings.clone(), Some(".".to_string()), Some(".".to_string()));

        assert_eq!(modules.resolve("src/main.ts", "@app/feature"), Some(0));
        assert_eq!(modules.resolve("src/main.ts", "@app/other"), Some(1));
        assert_eq!(modules.resolve("src/main.ts", "@core"), Some(2));
        assert_eq!(modules.resolve("src/main.ts", "shared/log"), Some(3));
        assert_eq!(modules.resolve("src/main.ts", "lodash"), None);
    }
}
