//! Dynamic-code pattern detection
//!
//! Records JavaScript idioms that hide structure from a plain declaration
//! walk: computed member access, closures and IIFEs, prototype methods,
//! CommonJS/AMD/UMD module shapes, callbacks, object literals and function
//! expressions.

mod detector;
mod types;

pub use detector::detect_patterns;
pub use types::*;

use once_cell::sync::Lazy;
use regex::Regex;

/// `Identifier.prototype.Identifier`
pub(crate) static PROTOTYPE_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_$][A-Za-z0-9_$]*)\.prototype\.([A-Za-z_$][A-Za-z0-9_$]*)$").unwrap()
});

/// Callee text suggesting the callback runs asynchronously.
///
/// Heuristic only: the match is an unanchored substring test, so unrelated
/// names that happen to contain a keyword (`authenticate` contains `then`,
/// `catchAll` contains `catch`) are flagged too.
static ASYNC_CALLEE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)async|then|catch|settimeout|setinterval").unwrap());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::typescript::test_support::parse;

    fn patterns_for(path: &str, code: &str) -> PatternSet {
        let (extractor, tree) = parse(path, code);
        let table = extractor.extract_symbols(&tree);
        extractor.extract_patterns(&tree, &table)
    }

    #[test]
    fn test_prototype_member_pattern() {
        let captures = PROTOTYPE_MEMBER.captures("Person.prototype.greet").unwrap();
        assert_eq!(&captures[1], "Person");
        assert_eq!(&captures[2], "greet");

        assert!(PROTOTYPE_MEMBER.is_match("$el.prototype._init"));
        assert!(!PROTOTYPE_MEMBER.is_match("a.b.prototype.c"));
        assert!(!PROTOTYPE_MEMBER.is_match("Person.prototype"));
        assert!(!PROTOTYPE_MEMBER.is_match("Person.prototype[name]"));
    }

    #[test]
    fn test_iife_is_module_pattern_and_closure() {
        let code = "(function () {\n  var x = 1;\n})();\n";
        let patterns = patterns_for("src/iife.js", code);

        assert_eq!(patterns.module_patterns.len(), 1);
        assert_eq!(patterns.module_patterns[0].pattern_type, ModulePatternType::Iife);
        assert_eq!(patterns.closures.len(), 1);
        assert_eq!(patterns.closures[0].closure_type, ClosureType::Iife);
        assert_eq!(patterns.closures[0].location, patterns.module_patterns[0].location);
        assert_eq!(patterns.closures[0].location.start.line, 1);
    }

    #[test]
    fn test_umd_wrapper() {
        let code = r#"
(function (root, factory) {
  if (typeof define === 'function' && define.amd) { define([], factory); }
  else if (typeof exports === 'object') { module.exports = factory(); }
})(this, function () { return { version: 1 }; });
"#;
        let patterns = patterns_for("src/umd.js", code);
        let types: Vec<_> = patterns.module_patterns.iter().map(|p| p.pattern_type).collect();

        assert!(types.contains(&ModulePatternType::Umd));
        assert!(types.contains(&ModulePatternType::Amd));
        assert!(types.contains(&ModulePatternType::CommonJs));
        assert!(!types.contains(&ModulePatternType::Iife));
    }

    #[test]
    fn test_revealing_module_exports() {
        let code = "var counter = (function () {\n  function inc() {}\n  return { inc: inc, reset() {} };\n})();\n";
        let patterns = patterns_for("src/counter.js", code);

        assert_eq!(patterns.module_patterns[0].exported_names, vec!["inc", "reset"]);
        assert_eq!(patterns.closures[0].inner_function_count, 2);
    }

    #[test]
    fn test_dynamic_access_types() {
        let code = "obj[key] = 1;\nconst v = obj['name'];\nhandlers[type](event);\n";
        let patterns = patterns_for("src/dyn.js", code);
        let types: Vec<_> = patterns
            .dynamic_property_accesses
            .iter()
            .map(|p| p.access_type)
            .collect();

        assert_eq!(types, vec![AccessType::Write, AccessType::Read, AccessType::Call]);
        assert_eq!(patterns.dynamic_property_accesses[1].property, "'name'");
    }

    #[test]
    fn test_callbacks_and_function_expressions() {
        let code = r#"
promise.then(result => handle(result));
items.forEach(function each(item) {}, this);
setTimeout(async () => {}, 10);
"#;
        let patterns = patterns_for("src/cb.js", code);

        assert_eq!(patterns.callbacks.len(), 3);
        assert!(patterns.callbacks[0].is_async);
        assert!(patterns.callbacks[0].is_arrow);
        assert!(!patterns.callbacks[1].is_async);
        assert_eq!(patterns.callbacks[1].argument_index, 0);
        assert!(patterns.callbacks[2].is_async);
        // Substring matching: `authenticate` contains `then`
        assert!(ASYNC_CALLEE.is_match("authenticate"));

        assert_eq!(patterns.function_expressions.len(), 3);
        assert_eq!(patterns.function_expressions[1].name.as_deref(), Some("each"));
        assert!(patterns.function_expressions[2].is_async);
    }

    #[test]
    fn test_prototype_and_object_literals() {
        let code = r#"
function Person() {}
Person.prototype.greet = function () {};
Person.prototype.kind = 'human';
var empty = {};
var api = { get: function () {}, size: 1, run() {} };
"#;
        let patterns = patterns_for("src/p.js", code);

        assert_eq!(patterns.prototype_methods.len(), 2);
        assert!(patterns.prototype_methods[0].is_function);
        assert!(!patterns.prototype_methods[1].is_function);
        assert_eq!(patterns.prototype_methods[0].constructor, "Person");

        assert_eq!(patterns.object_literals.len(), 1);
        assert_eq!(patterns.object_literals[0].property_names, vec!["size"]);
        assert_eq!(patterns.object_literals[0].method_names, vec!["get", "run"]);

        let assigned = &patterns.function_expressions[0];
        assert_eq!(assigned.assigned_to.as_deref(), Some("Person.prototype.greet"));
    }

    #[test]
    fn test_nested_function_closure_and_counts() {
        let code = "function outer() {\n  function inner() {}\n  return () => inner();\n}\nfunction flat() {}\n";
        let patterns = patterns_for("src/n.js", code);

        assert_eq!(patterns.closures.len(), 1);
        assert_eq!(patterns.closures[0].name.as_deref(), Some("outer"));
        assert_eq!(patterns.closures[0].inner_function_count, 2);

        let counts = patterns.counts();
        assert_eq!(counts[&PatternKind::Closure], 1);
        assert_eq!(counts[&PatternKind::Callback], 0);
        assert_eq!(counts.len(), 7);
    }
}
