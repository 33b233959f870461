//! Project configuration (`tsconfig.json` / `jsconfig.json`)
//!
//! Only the options that change how files are grouped and how import
//! specifiers resolve are read. A missing config yields permissive defaults;
//! a malformed one is an error the analyzer downgrades to a warning.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names searched for, in order, in each directory
const CONFIG_FILE_NAMES: &[&str] = &["tsconfig.json", "jsconfig.json"];

/// Accept `"strict": "true"` as well as `"strict": true`
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{}'. Expected true or false",
                s
            ))),
        },
    }
}

/// Raw config file contents
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    compiler_options: Option<RawCompilerOptions>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    allow_js: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    strict: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    no_emit: Option<bool>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    module_resolution: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<HashMap<String, Vec<String>>>,
    /// Directory of the config file that declared `paths`
    #[serde(skip)]
    paths_dir: Option<PathBuf>,
}

/// Effective project options after `extends` chains are merged
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Config file the options were read from; `None` when defaults are used
    pub config_path: Option<PathBuf>,
    pub allow_js: bool,
    pub strict: bool,
    pub no_emit: bool,
    pub target: Option<String>,
    pub module: Option<String>,
    pub module_resolution: Option<String>,
    /// Absolute `baseUrl`
    pub base_url: Option<PathBuf>,
    /// `paths` entries, most specific first
    pub path_mappings: Vec<PathMapping>,
    /// Directory `paths` targets are relative to when there is no `baseUrl`
    paths_dir: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            allow_js: true,
            strict: false,
            no_emit: true,
            target: None,
            module: None,
            module_resolution: None,
            base_url: None,
            path_mappings: Vec::new(),
            paths_dir: None,
        }
    }
}

impl ProjectConfig {
    /// Find the nearest config file at or above `dir` and load it.
    ///
    /// `tsconfig.json` wins over `jsconfig.json` in the same directory. No
    /// config anywhere up the tree is not an error.
    pub fn discover(dir: &Path) -> Result<Self> {
        match find_config_file(dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!("No tsconfig.json or jsconfig.json above {}", dir.display());
                Ok(Self::default())
            }
        }
    }

    /// Load one config file, following relative `extends` chains
    pub fn load(path: &Path) -> Result<Self> {
        let mut visited = HashSet::new();
        let raw = load_config_inner(path, &mut visited)?;
        let options = raw.compiler_options.unwrap_or_default();
        let defaults = Self::default();

        Ok(Self {
            config_path: Some(path.to_path_buf()),
            allow_js: options.allow_js.unwrap_or(defaults.allow_js),
            strict: options.strict.unwrap_or(defaults.strict),
            no_emit: options.no_emit.unwrap_or(defaults.no_emit),
            target: options.target,
            module: options.module,
            module_resolution: options.module_resolution,
            base_url: options.base_url.map(PathBuf::from),
            path_mappings: options
                .paths
                .as_ref()
                .map(build_path_mappings)
                .unwrap_or_default(),
            paths_dir: options.paths_dir,
        })
    }

    /// Directory that `paths` targets are joined onto
    pub fn paths_base(&self) -> Option<&Path> {
        self.base_url.as_deref().or(self.paths_dir.as_deref())
    }
}

/// Walk upward from `dir` looking for a config file
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    dir.ancestors().find_map(|ancestor| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| ancestor.join(name))
            .find(|candidate| candidate.is_file())
    })
}

fn parse_config(source: &str) -> Result<RawConfig> {
    let stripped = strip_jsonc(source);
    let normalized = remove_trailing_commas(&stripped);
    let config = serde_json::from_str(&normalized).context("failed to parse config JSON")?;
    Ok(config)
}

fn load_config_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<RawConfig> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        bail!("extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let mut config = parse_config(&source)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;

    let config_dir = path
        .parent()
        .ok_or_else(|| anyhow!("config has no parent directory"))?;
    if let Some(options) = config.compiler_options.as_mut() {
        // Both are relative to the file that declares them, not the one extending it
        if let Some(base_url) = options.base_url.take() {
            options.base_url = Some(config_dir.join(base_url).to_string_lossy().into_owned());
        }
        if options.paths.is_some() {
            options.paths_dir = Some(config_dir.to_path_buf());
        }
    }

    if let Some(extends) = config.extends.take() {
        match resolve_extends_path(config_dir, &extends) {
            Some(base_path) => {
                let base_config = load_config_inner(&base_path, visited)?;
                config = merge_configs(base_config, config);
            }
            None => debug!(
                "Ignoring package extends '{}' in {}",
                extends,
                path.display()
            ),
        }
    }

    visited.remove(&canonical);
    Ok(config)
}

/// Relative or absolute `extends` targets; package names are not followed
fn resolve_extends_path(config_dir: &Path, extends: &str) -> Option<PathBuf> {
    let mut candidate = PathBuf::from(extends);
    if !candidate.is_absolute() && !extends.starts_with('.') {
        return None;
    }
    if candidate.extension().is_none() {
        candidate.set_extension("json");
    }

    if candidate.is_absolute() {
        Some(candidate)
    } else {
        Some(config_dir.join(candidate))
    }
}

fn merge_configs(base: RawConfig, mut child: RawConfig) -> RawConfig {
    let compiler_options = match (base.compiler_options, child.compiler_options.take()) {
        (Some(base_opts), Some(child_opts)) => Some(merge_compiler_options(base_opts, child_opts)),
        (Some(base_opts), None) => Some(base_opts),
        (None, Some(child_opts)) => Some(child_opts),
        (None, None) => None,
    };

    RawConfig {
        extends: None,
        compiler_options,
    }
}

fn merge_compiler_options(base: RawCompilerOptions, child: RawCompilerOptions) -> RawCompilerOptions {
    let (paths, paths_dir) = match child.paths {
        Some(paths) => (Some(paths), child.paths_dir),
        None => (base.paths, base.paths_dir),
    };

    RawCompilerOptions {
        allow_js: child.allow_js.or(base.allow_js),
        strict: child.strict.or(base.strict),
        no_emit: child.no_emit.or(base.no_emit),
        target: child.target.or(base.target),
        module: child.module.or(base.module),
        module_resolution: child.module_resolution.or(base.module_resolution),
        base_url: child.base_url.or(base.base_url),
        paths,
        paths_dir,
    }
}

/// One `paths` entry: `"@app/*": ["src/app/*"]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub pattern: String,
    prefix: String,
    suffix: String,
    pub targets: Vec<String>,
}

impl PathMapping {
    /// The text matched by `*`, or an empty string for an exact pattern
    pub fn match_specifier(&self, specifier: &str) -> Option<String> {
        if !self.pattern.contains('*') {
            return (self.pattern == specifier).then(String::new);
        }

        if !specifier.starts_with(&self.prefix) || !specifier.ends_with(&self.suffix) {
            return None;
        }

        let start = self.prefix.len();
        let end = specifier.len().saturating_sub(self.suffix.len());
        if end < start {
            return None;
        }

        Some(specifier[start..end].to_string())
    }

    /// Targets with the wildcard substituted
    pub fn substitute(&self, wildcard: &str) -> impl Iterator<Item = String> + '_ {
        let wildcard = wildcard.to_string();
        self.targets.iter().map(move |target| {
            if target.contains('*') {
                target.replace('*', &wildcard)
            } else {
                target.clone()
            }
        })
    }

    pub fn specificity(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }
}

fn build_path_mappings(paths: &HashMap<String, Vec<String>>) -> Vec<PathMapping> {
    let mut mappings = Vec::new();
    for (pattern, targets) in paths {
        if targets.is_empty() {
            continue;
        }
        let pattern = normalize_path_pattern(pattern);
        let targets = targets
            .iter()
            .map(|target| normalize_path_pattern(target))
            .collect();
        let (prefix, suffix) = split_path_pattern(&pattern);
        mappings.push(PathMapping {
            pattern,
            prefix,
            suffix,
            targets,
        });
    }
    mappings.sort_by(|left, right| {
        right
            .specificity()
            .cmp(&left.specificity())
            .then_with(|| right.pattern.len().cmp(&left.pattern.len()))
            .then_with(|| left.pattern.cmp(&right.pattern))
    });
    mappings
}

fn normalize_path_pattern(value: &str) -> String {
    value.trim().replace('\\', "/")
}

fn split_path_pattern(pattern: &str) -> (String, String) {
    match pattern.find('*') {
        Some(star_idx) => {
            let (prefix, rest) = pattern.split_at(star_idx);
            (prefix.to_string(), rest[1..].to_string())
        }
        None => (pattern.to_string(), String::new()),
    }
}

/// Drop `//` and `/* */` comments outside strings, keeping line breaks
fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
                out.push(ch);
            }
            continue;
        }

        if in_block_comment {
            if ch == '*' {
                if let Some('/') = chars.peek().copied() {
                    chars.next();
                    in_block_comment = false;
                }
            } else if ch == '\n' {
                out.push(ch);
            }
            continue;
        }

        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match (ch, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                chars.next();
                in_line_comment = true;
            }
            ('/', Some('*')) => {
                chars.next();
                in_block_comment = true;
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Drop commas that directly precede `}` or `]`
fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == ',' {
            let next = chars.clone().find(|next| !next.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_jsonc_comments_and_trailing_commas() {
        let source = r#"{
  // line comment
  "compilerOptions": {
    /* block */ "strict": true,
    "baseUrl": "./src", // "not": "a key"
    "paths": { "@/*": ["*",], },
  },
}"#;
        let config = parse_config(source).unwrap();
        let options = config.compiler_options.unwrap();
        assert_eq!(options.strict, Some(true));
        assert_eq!(options.base_url.as_deref(), Some("./src"));
        assert_eq!(options.paths.unwrap()["@/*"], vec!["*".to_string()]);
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let stripped = strip_jsonc(r#"{"a": "http://x/*y*/", "b": "c\"//"}"#);
        assert_eq!(stripped, r#"{"a": "http://x/*y*/", "b": "c\"//"}"#);
        assert_eq!(remove_trailing_commas(r#"{"a": ",}"}"#), r#"{"a": ",}"}"#);
    }

    #[test]
    fn test_bool_or_string() {
        let options: RawCompilerOptions =
            serde_json::from_str(r#"{"allowJs": "false", "noEmit": "TRUE"}"#).unwrap();
        assert_eq!(options.allow_js, Some(false));
        assert_eq!(options.no_emit, Some(true));
        assert!(serde_json::from_str::<RawCompilerOptions>(r#"{"strict": "maybe"}"#).is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        // Some ancestor of the temp dir might hold a config; only check when none does
        if find_config_file(&nested).is_none() {
            let config = ProjectConfig::discover(&nested).unwrap();
            assert!(config.config_path.is_none());
            assert!(config.allow_js);
            assert!(!config.strict);
            assert!(config.no_emit);
        }
    }

    #[test]
    fn test_discover_walks_upward_and_prefers_tsconfig() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("jsconfig.json"), r#"{"compilerOptions": {"strict": false}}"#)
            .unwrap();
        fs::write(
            temp.path().join("tsconfig.json"),
            r#"{"compilerOptions": {"strict": true, "target": "es2020"}}"#,
        )
        .unwrap();

        let config = ProjectConfig::discover(&nested).unwrap();
        assert_eq!(config.config_path, Some(temp.path().join("tsconfig.json")));
        assert!(config.strict);
        assert_eq!(config.target.as_deref(), Some("es2020"));

        fs::remove_file(temp.path().join("tsconfig.json")).unwrap();
        let config = ProjectConfig::discover(&nested).unwrap();
        assert_eq!(config.config_path, Some(temp.path().join("jsconfig.json")));
    }

    #[test]
    fn test_extends_chain_merges_and_resolves_relative_dirs() {
        let temp = TempDir::new().unwrap();
        let configs = temp.path().join("configs");
        fs::create_dir_all(&configs).unwrap();
        fs::write(
            configs.join("base.json"),
            r#"{"compilerOptions": {"baseUrl": "..", "paths": {"@lib/*": ["lib/*"]}, "strict": true, "module": "esnext"}}"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("tsconfig.json"),
            r#"{"extends": "./configs/base", "compilerOptions": {"strict": false}}"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&temp.path().join("tsconfig.json")).unwrap();
        assert!(!config.strict);
        assert_eq!(config.module.as_deref(), Some("esnext"));
        assert_eq!(config.base_url, Some(configs.join("..")));
        assert_eq!(config.paths_base(), Some(configs.join("..").as_path()));
        assert_eq!(config.path_mappings.len(), 1);
        assert_eq!(config.path_mappings[0].pattern, "@lib/*");
    }

    #[test]
    fn test_paths_without_base_url_are_relative_to_declaring_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("tsconfig.json"),
            r#"{"compilerOptions": {"paths": {"~/*": ["./src/*"]}}}"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&temp.path().join("tsconfig.json")).unwrap();
        assert!(config.base_url.is_none());
        assert_eq!(config.paths_base(), Some(temp.path()));
    }

    #[test]
    fn test_extends_cycle_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.json"), r#"{"extends": "./b.json"}"#).unwrap();
        fs::write(temp.path().join("b.json"), r#"{"extends": "./a.json"}"#).unwrap();

        let error = ProjectConfig::load(&temp.path().join("a.json")).unwrap_err();
        assert!(format!("{:#}", error).contains("extends cycle"));
    }

    #[test]
    fn test_package_extends_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("tsconfig.json"),
            r#"{"extends": "@tsconfig/node18/tsconfig.json", "compilerOptions": {"allowJs": false}}"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&temp.path().join("tsconfig.json")).unwrap();
        assert!(!config.allow_js);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("tsconfig.json"), "{ not json").unwrap();
        assert!(ProjectConfig::discover(temp.path()).is_err());
    }

    #[test]
    fn test_path_mapping_order_and_matching() {
        let mut paths = HashMap::new();
        paths.insert("*".to_string(), vec!["types/*".to_string()]);
        paths.insert("@app/*".to_string(), vec!["src/app/*".to_string()]);
        paths.insert("@app/core".to_string(), vec!["src/core/index.ts".to_string()]);
        paths.insert("empty/*".to_string(), Vec::new());

        let mappings = build_path_mappings(&paths);
        let patterns: Vec<_> = mappings.iter().map(|m| m.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["@app/core", "@app/*", "*"]);

        assert_eq!(mappings[0].match_specifier("@app/core"), Some(String::new()));
        assert_eq!(mappings[0].match_specifier("@app/core/x"), None);
        assert_eq!(mappings[1].match_specifier("@app/ui/button"), Some("ui/button".to_string()));
        assert_eq!(
            mappings[1].substitute("ui/button").collect::<Vec<_>>(),
            vec!["src/app/ui/button".to_string()]
        );
    }
}
