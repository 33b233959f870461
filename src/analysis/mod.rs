//! Analysis orchestration
//!
//! One `analyze()` run: validate options, load the project config, extract
//! every file in parallel, wait for all of them, link on one thread, then
//! aggregate. No state survives from one run into the next.

mod result;

pub use result::{AnalysisMetadata, AnalysisResult, AnalyzedFile, ClassRelationCounts};

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::error::{AnalysisError, Diagnostic, DiagnosticKind, ExtractionError};
use crate::extractors::base::{FileExtraction, Visibility};
use crate::extractors::manager::ExtractorManager;
use crate::language::Dialect;
use crate::linker::{self, ModuleIndex};
use crate::utils::paths::{normalize_unix, to_relative_unix_style, to_unix_style};

/// Options for one analysis run
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Keep `private` and `#private` members in the result
    pub include_private: bool,
    /// Only analyze TypeScript files
    pub ts_only: bool,
    /// Only analyze JavaScript files
    pub js_only: bool,
    /// Directory the project config is discovered from
    pub project_root: Option<PathBuf>,
    /// When set, stored file paths are relative to this directory
    pub workspace_root: Option<PathBuf>,
    /// Files not started before this much time has passed are skipped
    pub timeout: Option<Duration>,
}

/// One file queued for extraction
enum Input {
    Disk { path: PathBuf, stored: String },
    Memory { stored: String, content: String },
}

impl Input {
    fn stored(&self) -> &str {
        match self {
            Input::Disk { stored, .. } | Input::Memory { stored, .. } => stored,
        }
    }
}

enum FileOutcome {
    Extracted(FileExtraction),
    Failed(Diagnostic),
    TimedOut(String),
}

/// Runs analyses; holds only the markers and result of the latest run
#[derive(Debug, Default)]
pub struct Analyzer {
    options: AnalysisOptions,
    manager: ExtractorManager,
    processed: HashSet<String>,
    last_result: Option<Arc<AnalysisResult>>,
}

impl Analyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Result of the most recent successful run
    pub fn last_result(&self) -> Option<Arc<AnalysisResult>> {
        self.last_result.clone()
    }

    /// Stored paths handled by the current run
    pub fn processed_files(&self) -> impl Iterator<Item = &str> {
        self.processed.iter().map(String::as_str)
    }

    /// Discard everything the previous run accumulated
    pub fn reset(&mut self) {
        self.processed.clear();
        self.last_result = None;
    }

    /// Analyze files on disk, in the order given
    pub fn analyze(&mut self, paths: &[PathBuf]) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let inputs = paths
            .iter()
            .map(|path| Input::Disk {
                stored: self.stored_path(path),
                path: path.clone(),
            })
            .collect();
        self.run(inputs)
    }

    /// Analyze in-memory sources given as `(path, content)` pairs
    pub fn analyze_sources(
        &mut self,
        sources: &[(String, String)],
    ) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let inputs = sources
            .iter()
            .map(|(path, content)| Input::Memory {
                stored: normalize_unix(&path.replace('\\', "/")),
                content: content.clone(),
            })
            .collect();
        self.run(inputs)
    }

    fn run(&mut self, inputs: Vec<Input>) -> Result<Arc<AnalysisResult>, AnalysisError> {
        self.reset();
        if self.options.ts_only && self.options.js_only {
            return Err(AnalysisError::ConflictingDialectFilters);
        }

        let mut warnings = Vec::new();
        let config = self.load_config(&mut warnings);
        let config_path = config.config_path.as_deref().map(to_unix_style);

        let queued = self.select_inputs(inputs, &mut warnings);
        if queued.is_empty() {
            info!("No files to analyze");
            let result = Arc::new(AnalysisResult::empty(warnings, config_path));
            self.last_result = Some(result.clone());
            return Ok(result);
        }

        let started = Instant::now();
        let deadline = self.options.timeout.map(|timeout| started + timeout);
        let manager = self.manager;

        // Per-file phase: independent, order preserved by the indexed collect
        let outcomes: Vec<FileOutcome> = queued
            .par_iter()
            .map(|input| {
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    return FileOutcome::TimedOut(input.stored().to_string());
                }
                let extracted = match input {
                    Input::Disk { path, stored } => manager.extract_file(path, stored),
                    Input::Memory { stored, content } => manager.extract_source(stored, content),
                };
                match extracted {
                    Ok(extraction) => FileOutcome::Extracted(extraction),
                    Err(error) => FileOutcome::Failed(skipped(input.stored(), &error)),
                }
            })
            .collect();

        let mut extractions = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                FileOutcome::Extracted(mut extraction) => {
                    if !self.options.include_private {
                        extraction
                            .symbols
                            .retain(|symbol| symbol.visibility != Visibility::Private);
                    }
                    extractions.push(extraction);
                }
                FileOutcome::Failed(diagnostic) => warnings.push(diagnostic),
                FileOutcome::TimedOut(stored) => {
                    warn!("Skipping {}: run timeout reached", stored);
                    warnings.push(Diagnostic::new(
                        DiagnosticKind::Timeout,
                        Some(stored),
                        "not started before the run timeout",
                    ));
                }
            }
        }

        // Join barrier passed: link on this thread over complete indices
        let modules = self.module_index(&extractions, &config);
        let linked = linker::link(&extractions, &modules);
        let result = AnalysisResult::aggregate(extractions, linked, warnings, config_path);

        info!(
            "Analyzed {} files in {:?}: {} symbols, {} call relations ({} cross-file), {} warnings",
            result.metadata.total_files,
            started.elapsed(),
            result.metadata.total_symbols,
            result.metadata.total_call_relations,
            result.cross_file_calls().count(),
            result.warnings.len()
        );

        let result = Arc::new(result);
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// A malformed config is reported and replaced by defaults
    fn load_config(&self, warnings: &mut Vec<Diagnostic>) -> ProjectConfig {
        let Some(root) = self
            .options
            .project_root
            .as_deref()
            .or(self.options.workspace_root.as_deref())
        else {
            return ProjectConfig::default();
        };

        match ProjectConfig::discover(root) {
            Ok(config) => {
                if let Some(path) = &config.config_path {
                    debug!("Using project config {}", path.display());
                }
                config
            }
            Err(error) => {
                warn!("Ignoring project config: {:#}", error);
                let file_path = crate::config::find_config_file(root).map(|path| to_unix_style(&path));
                warnings.push(Diagnostic::new(
                    DiagnosticKind::ConfigReadFailure,
                    file_path,
                    format!("{:#}", error),
                ));
                ProjectConfig::default()
            }
        }
    }

    /// Drop duplicates, unsupported extensions and dialect-filtered files
    fn select_inputs(&mut self, inputs: Vec<Input>, warnings: &mut Vec<Diagnostic>) -> Vec<Input> {
        let mut queued = Vec::with_capacity(inputs.len());

        for input in inputs {
            let stored = input.stored().to_string();
            if !self.processed.insert(stored.clone()) {
                warn!("Skipping duplicate file {}", stored);
                warnings.push(Diagnostic::new(
                    DiagnosticKind::DuplicateFile,
                    Some(stored),
                    "file listed more than once",
                ));
                continue;
            }

            let Some(dialect) = Dialect::from_path(Path::new(&stored)) else {
                let error = ExtractionError::UnsupportedExtension {
                    path: stored.clone(),
                };
                warnings.push(skipped(&stored, &error));
                continue;
            };
            if (self.options.ts_only && !dialect.is_typescript())
                || (self.options.js_only && !dialect.is_javascript())
            {
                debug!("Skipping {} ({} filtered out)", stored, dialect);
                continue;
            }

            queued.push(input);
        }

        queued
    }

    fn module_index(&self, extractions: &[FileExtraction], config: &ProjectConfig) -> ModuleIndex {
        ModuleIndex::new(extractions.iter().map(|e| e.file_path.as_str())).with_aliases(
            config.path_mappings.clone(),
            config.paths_base().map(|dir| self.stored_path(dir)),
            config.base_url.as_deref().map(|dir| self.stored_path(dir)),
        )
    }

    /// Unix-style path, relative to the workspace root when one is set
    fn stored_path(&self, path: &Path) -> String {
        match &self.options.workspace_root {
            Some(root) => to_relative_unix_style(path, root).unwrap_or_else(|_| to_unix_style(path)),
            None => to_unix_style(path),
        }
    }
}

fn skipped(stored: &str, error: &ExtractionError) -> Diagnostic {
    warn!("Skipping {}: {}", stored, error);
    error.to_diagnostic(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::base::{CallType, SymbolKind};
    use crate::extractors::patterns::{ClosureType, ModulePatternType};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn workspace_options(root: &Path) -> AnalysisOptions {
        AnalysisOptions {
            workspace_root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    fn sources(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(path, code)| (path.to_string(), code.to_string()))
            .collect()
    }

    #[test]
    fn test_zero_files_is_an_empty_result() {
        let mut analyzer = Analyzer::new(AnalysisOptions::default());
        let result = analyzer.analyze(&[]).unwrap();

        assert_eq!(result.metadata.total_files, 0);
        assert!(result.symbols.is_empty());
        assert!(result.call_relations.is_empty());
        assert!(result.warnings.is_empty());
        assert!(analyzer.last_result().is_some());
    }

    #[test]
    fn test_two_file_scenario_on_disk() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a.ts", "export class A { greet(){} }\n");
        let b = write(temp.path(), "b.ts", "import { A } from './a';\nnew A().greet();\n");

        let mut analyzer = Analyzer::new(workspace_options(temp.path()));
        let result = analyzer.analyze(&[a, b]).unwrap();

        let owned: Vec<_> = result.symbols_in_file("a.ts").collect();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().any(|s| s.kind == SymbolKind::Class));
        assert!(owned.iter().any(|s| s.kind == SymbolKind::Method));

        assert_eq!(result.import_relations.len(), 1);
        assert_eq!(result.import_relations[0].file_path, "b.ts");
        assert_eq!(result.import_relations[0].resolved_file_path.as_deref(), Some("a.ts"));

        let mut types: Vec<_> = result.call_relations.iter().map(|r| r.call_type).collect();
        types.sort();
        assert_eq!(types, vec![CallType::Method, CallType::Constructor]);
        assert_eq!(result.cross_file_calls().count(), 2);

        let files: Vec<_> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(files, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_iife_scenario() {
        let mut analyzer = Analyzer::new(AnalysisOptions::default());
        let result = analyzer
            .analyze_sources(&sources(&[(
                "iife.js",
                "(function(){ var x = 1; function inner(){ return x; } })();\n",
            )]))
            .unwrap();

        assert_eq!(result.patterns.module_patterns.len(), 1);
        assert_eq!(result.patterns.module_patterns[0].pattern_type, ModulePatternType::Iife);
        assert_eq!(result.patterns.closures.len(), 1);
        assert_eq!(result.patterns.closures[0].closure_type, ClosureType::Iife);
        assert_eq!(
            result.patterns.closures[0].location,
            result.patterns.module_patterns[0].location
        );
    }

    #[test]
    fn test_runs_are_deterministic() {
        let files = sources(&[
            ("src/a.ts", "export function a() { helper(); }\nfunction helper() {}\n"),
            ("src/b.ts", "import { a } from './a';\nclass B { run() { a(); this.run(); } }\n"),
        ]);
        let mut analyzer = Analyzer::new(AnalysisOptions::default());
        let first = analyzer.analyze_sources(&files).unwrap();
        let second = analyzer.analyze_sources(&files).unwrap();

        assert_eq!(first.symbols, second.symbols);
        assert_eq!(first.call_relations, second.call_relations);
        assert_eq!(first.metadata.total_call_relations, second.metadata.total_call_relations);
    }

    #[test]
    fn test_resolution_soundness() {
        let mut analyzer = Analyzer::new(AnalysisOptions::default());
        let result = analyzer
            .analyze_sources(&sources(&[
                ("a.ts", "export class A {\n  private secret() {}\n  open() { this.secret(); }\n}\n"),
                ("b.ts", "import { A } from './a';\nimport x from 'ext';\nnew A().open();\nx();\n"),
            ]))
            .unwrap();

        let ids: HashSet<&str> = result.symbols.iter().map(|s| s.id.as_str()).collect();
        for relation in &result.call_relations {
            for endpoint in [&relation.caller, &relation.callee] {
                if let Some(id) = endpoint.symbol_id() {
                    assert!(ids.contains(id));
                }
            }
            assert_eq!(relation.is_cross_file(), relation.caller.file_path != relation.callee.file_path);
        }
        let paths: HashSet<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert!(result
            .import_relations
            .iter()
            .filter_map(|import| import.resolved_file_path.as_deref())
            .all(|path| paths.contains(path)));
    }

    #[test]
    fn test_private_members_filtered_unless_requested() {
        let code = sources(&[(
            "a.ts",
            "class A {\n  private hidden() {}\n  #inner = 1;\n  shown() { this.hidden(); }\n}\n",
        )]);

        let mut analyzer = Analyzer::new(AnalysisOptions::default());
        let result = analyzer.analyze_sources(&code).unwrap();
        assert!(result.symbols.iter().all(|s| s.visibility != Visibility::Private));
        let hidden_call = result
            .call_relations
            .iter()
            .find(|r| r.callee.name == "hidden")
            .unwrap();
        assert!(!hidden_call.callee.is_resolved());

        let mut analyzer = Analyzer::new(AnalysisOptions {
            include_private: true,
            ..Default::default()
        });
        let result = analyzer.analyze_sources(&code).unwrap();
        assert_eq!(
            result
                .symbols
                .iter()
                .filter(|s| s.visibility == Visibility::Private)
                .count(),
            2
        );
    }

    #[test]
    fn test_conflicting_dialect_filters_are_rejected() {
        let mut analyzer = Analyzer::new(AnalysisOptions {
            ts_only: true,
            js_only: true,
            ..Default::default()
        });
        let error = analyzer.analyze(&[PathBuf::from("a.ts")]).unwrap_err();
        assert!(matches!(error, AnalysisError::ConflictingDialectFilters));
        assert!(analyzer.last_result().is_none());
    }

    #[test]
    fn test_dialect_filters() {
        let files = sources(&[("a.ts", "export const a = 1;\n"), ("b.js", "var b = 2;\n")]);

        let mut analyzer = Analyzer::new(AnalysisOptions {
            ts_only: true,
            ..Default::default()
        });
        let result = analyzer.analyze_sources(&files).unwrap();
        let kept: Vec<_> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(kept, vec!["a.ts"]);

        let mut analyzer = Analyzer::new(AnalysisOptions {
            js_only: true,
            ..Default::default()
        });
        let result = analyzer.analyze_sources(&files).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].dialect, Dialect::JavaScript);
    }

    #[test]
    fn test_skipped_files_become_warnings() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "good.ts", "export function ok() {}\n");
        let broken = write(temp.path(), "broken.ts", "function ( {\n");
        let notes = write(temp.path(), "notes.md", "# notes\n");
        let missing = temp.path().join("missing.ts");

        let mut analyzer = Analyzer::new(workspace_options(temp.path()));
        let result = analyzer
            .analyze(&[good.clone(), broken, notes, missing, good])
            .unwrap();

        assert_eq!(result.metadata.total_files, 1);
        assert_eq!(result.files[0].path, "good.ts");

        let kinds: Vec<_> = result.warnings.iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&DiagnosticKind::UnparsableSource));
        assert!(kinds.contains(&DiagnosticKind::UnsupportedFile));
        assert!(kinds.contains(&DiagnosticKind::UnreadableFile));
        assert!(kinds.contains(&DiagnosticKind::DuplicateFile));
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn test_tsconfig_path_aliases() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "tsconfig.json",
            r#"{
  // aliases for shared code
  "compilerOptions": {
    "baseUrl": ".",
    "paths": { "@lib/*": ["src/lib/*"], },
  },
}"#,
        );
        let math = write(temp.path(), "src/lib/math.ts", "export function add() {}\n");
        let main = write(
            temp.path(),
            "src/main.ts",
            "import { add } from '@lib/math';\nadd();\n",
        );

        let mut analyzer = Analyzer::new(AnalysisOptions {
            project_root: Some(temp.path().to_path_buf()),
            workspace_root: Some(temp.path().to_path_buf()),
            ..Default::default()
        });
        let result = analyzer.analyze(&[math, main]).unwrap();

        assert!(result.metadata.config_path.as_deref().unwrap().ends_with("tsconfig.json"));
        assert_eq!(
            result.import_relations[0].resolved_file_path.as_deref(),
            Some("src/lib/math.ts")
        );
        let add = result.call_relations.iter().find(|r| r.callee.name == "add").unwrap();
        assert!(add.callee.is_resolved());
        assert!(add.is_cross_file());
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "tsconfig.json", "{ \"compilerOptions\": ");
        let file = write(temp.path(), "a.ts", "export const a = 1;\n");

        let mut analyzer = Analyzer::new(AnalysisOptions {
            project_root: Some(temp.path().to_path_buf()),
            workspace_root: Some(temp.path().to_path_buf()),
            ..Default::default()
        });
        let result = analyzer.analyze(&[file]).unwrap();

        assert_eq!(result.metadata.total_files, 1);
        assert!(result.metadata.config_path.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, DiagnosticKind::ConfigReadFailure);
    }

    #[test]
    fn test_timeout_skips_unstarted_files() {
        let mut analyzer = Analyzer::new(AnalysisOptions {
            timeout: Some(Duration::ZERO),
            ..Default::default()
        });
        let result = analyzer
            .analyze_sources(&sources(&[("a.ts", "f();\n"), ("b.ts", "g();\n")]))
            .unwrap();

        assert_eq!(result.metadata.total_files, 0);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings.iter().all(|w| w.kind == DiagnosticKind::Timeout));
    }

    #[test]
    fn test_reset_discards_previous_run() {
        let mut analyzer = Analyzer::new(AnalysisOptions::default());
        analyzer
            .analyze_sources(&sources(&[("a.ts", "export const a = 1;\n")]))
            .unwrap();
        assert_eq!(analyzer.processed_files().count(), 1);

        analyzer.reset();
        assert!(analyzer.last_result().is_none());
        assert_eq!(analyzer.processed_files().count(), 0);

        // The same file is not a duplicate in a fresh run
        let result = analyzer
            .analyze_sources(&sources(&[("a.ts", "export const a = 1;\n")]))
            .unwrap();
        assert!(result.warnings.is_empty());
    }
}
