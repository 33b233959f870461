//! Aggregated analysis result
//!
//! Built once per run from the per-file extractions and the linker output.
//! Every query reads the stored lists; nothing here resolves or re-parses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Diagnostic;
use crate::extractors::base::{
    CallEndpoint, CallRelation, ExportRelation, FileExtraction, ImportRelation, Symbol,
};
use crate::extractors::patterns::{PatternKind, PatternSet};
use crate::language::Dialect;
use crate::linker::LinkedGraph;

/// One file that made it into the result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedFile {
    pub path: String,
    pub dialect: Dialect,
    /// Blake3 hex digest of the content
    pub content_hash: String,
    pub line_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub analysis_date: DateTime<Utc>,
    pub total_files: usize,
    pub total_symbols: usize,
    pub total_call_relations: usize,
    pub total_import_relations: usize,
    pub total_export_relations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

/// Relations touching one class
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassRelationCounts {
    /// Relations whose callee belongs to the class
    pub inbound: usize,
    /// Relations whose caller belongs to the class
    pub outbound: usize,
}

/// Everything one `analyze()` run produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub symbols: Vec<Symbol>,
    pub call_relations: Vec<CallRelation>,
    pub import_relations: Vec<ImportRelation>,
    pub export_relations: Vec<ExportRelation>,
    pub patterns: PatternSet,
    pub files: Vec<AnalyzedFile>,
    pub warnings: Vec<Diagnostic>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Merge per-file extractions and the linked graph
    pub fn aggregate(
        extractions: Vec<FileExtraction>,
        linked: LinkedGraph,
        mut warnings: Vec<Diagnostic>,
        config_path: Option<String>,
    ) -> Self {
        let mut symbols = Vec::new();
        let mut patterns = PatternSet::default();
        let mut files = Vec::with_capacity(extractions.len());

        for extraction in extractions {
            files.push(AnalyzedFile {
                path: extraction.file_path,
                dialect: extraction.dialect,
                content_hash: extraction.content_hash,
                line_count: extraction.line_count,
            });
            symbols.extend(extraction.symbols);
            patterns.extend(extraction.patterns);
        }
        warnings.extend(linked.warnings);

        let metadata = AnalysisMetadata {
            analysis_date: Utc::now(),
            total_files: files.len(),
            total_symbols: symbols.len(),
            total_call_relations: linked.call_relations.len(),
            total_import_relations: linked.import_relations.len(),
            total_export_relations: linked.export_relations.len(),
            config_path,
        };

        Self {
            symbols,
            call_relations: linked.call_relations,
            import_relations: linked.import_relations,
            export_relations: linked.export_relations,
            patterns,
            files,
            warnings,
            metadata,
        }
    }

    /// A result with no files, used when there is nothing to analyze
    pub fn empty(warnings: Vec<Diagnostic>, config_path: Option<String>) -> Self {
        Self::aggregate(Vec::new(), LinkedGraph::default(), warnings, config_path)
    }

    /// Relations whose caller and callee live in different files
    pub fn cross_file_calls(&self) -> impl Iterator<Item = &CallRelation> {
        self.call_relations
            .iter()
            .filter(|relation| relation.is_cross_file())
    }

    /// Inbound/outbound relation counts per class name
    pub fn class_relation_counts(&self) -> BTreeMap<String, ClassRelationCounts> {
        let mut counts: BTreeMap<String, ClassRelationCounts> = BTreeMap::new();
        for relation in &self.call_relations {
            if let Some(class) = endpoint_class(&relation.caller) {
                counts.entry(class.to_string()).or_default().outbound += 1;
            }
            if let Some(class) = endpoint_class(&relation.callee) {
                counts.entry(class.to_string()).or_default().inbound += 1;
            }
        }
        counts
    }

    /// Pattern records per kind; every kind is present
    pub fn pattern_counts(&self) -> BTreeMap<PatternKind, usize> {
        self.patterns.counts()
    }

    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.id == id)
    }

    pub fn symbols_in_file<'a>(&'a self, file_path: &'a str) -> impl Iterator<Item = &'a Symbol> {
        self.symbols
            .iter()
            .filter(move |symbol| symbol.file_path == file_path)
    }

    /// Relations whose caller resolved to `symbol_id`
    pub fn calls_from<'a>(&'a self, symbol_id: &'a str) -> impl Iterator<Item = &'a CallRelation> {
        self.call_relations
            .iter()
            .filter(move |relation| relation.caller.symbol_id() == Some(symbol_id))
    }

    /// Relations whose callee resolved to `symbol_id`
    pub fn calls_to<'a>(&'a self, symbol_id: &'a str) -> impl Iterator<Item = &'a CallRelation> {
        self.call_relations
            .iter()
            .filter(move |relation| relation.callee.symbol_id() == Some(symbol_id))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn endpoint_class(endpoint: &CallEndpoint) -> Option<&str> {
    endpoint.class_name.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::base::CallType;
    use crate::extractors::manager::ExtractorManager;
    use crate::linker::{link, ModuleIndex};

    fn result_for(sources: &[(&str, &str)]) -> AnalysisResult {
        let manager = ExtractorManager::new();
        let extractions: Vec<_> = sources
            .iter()
            .map(|(path, code)| manager.extract_source(path, code).unwrap())
            .collect();
        let modules = ModuleIndex::new(extractions.iter().map(|e| e.file_path.as_str()));
        let linked = link(&extractions, &modules);
        AnalysisResult::aggregate(extractions, linked, Vec::new(), None)
    }

    #[test]
    fn test_empty_result() {
        let result = AnalysisResult::empty(Vec::new(), None);
        assert_eq!(result.metadata.total_files, 0);
        assert!(result.symbols.is_empty());
        assert_eq!(result.cross_file_calls().count(), 0);
        assert!(result.class_relation_counts().is_empty());
        assert!(result.pattern_counts().values().all(|&count| count == 0));
    }

    #[test]
    fn test_class_relation_counts_and_call_queries() {
        let result = result_for(&[(
            "shop.ts",
            r#"class Cart {
  add() {}
}
class Checkout {
  constructor(private cart: Cart) {}
  run() {
    this.cart.add();
    this.cart.add();
  }
}
"#,
        )]);

        let counts = result.class_relation_counts();
        assert_eq!(counts["Cart"].inbound, 2);
        assert_eq!(counts["Cart"].outbound, 0);
        assert!(counts["Checkout"].outbound >= 2);

        let add = result
            .symbols
            .iter()
            .find(|symbol| symbol.name == "add")
            .unwrap();
        let run = result
            .symbols
            .iter()
            .find(|symbol| symbol.name == "run")
            .unwrap();
        assert_eq!(result.calls_to(&add.id).count(), 2);
        assert!(result
            .calls_from(&run.id)
            .any(|relation| relation.call_type == CallType::Method));
        assert_eq!(result.symbol(&add.id).map(|s| s.name.as_str()), Some("add"));
        assert_eq!(result.symbols_in_file("shop.ts").count(), result.symbols.len());
        assert_eq!(result.metadata.total_symbols, result.symbols.len());
    }

    #[test]
    fn test_json_shape_is_camel_case() {
        let result = result_for(&[("a.js", "var api = { run: function () {} };\napi.run();\n")]);
        let json = result.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["callRelations"].is_array());
        assert!(value["metadata"]["analysisDate"].is_string());
        assert_eq!(value["metadata"]["totalFiles"], 1);
        assert!(value["patterns"]["objectLiterals"].is_array());
        assert!(value["symbols"][0]["isExported"].is_boolean());

        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
