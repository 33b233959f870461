//! Types for dynamic-code pattern detection
//!
//! One record type per idiom. Records only annotate; they never change the
//! symbols or relations extracted for the same code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::extractors::base::Location;

/// How a computed member (`obj[key]`) is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Read,
    Write,
    Call,
}

/// `obj[key]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPropertyAccess {
    pub object: String,
    pub property: String,
    pub access_type: AccessType,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosureType {
    Iife,
    NestedFunction,
}

/// An IIFE, or a function declaration that defines functions inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Closure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub closure_type: ClosureType,
    pub inner_function_count: usize,
    pub location: Location,
}

/// `Ctor.prototype.method = …`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrototypeMethod {
    pub constructor: String,
    pub method_name: String,
    /// The assigned value is a function expression
    pub is_function: bool,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModulePatternType {
    #[serde(rename = "IIFE")]
    Iife,
    #[serde(rename = "CommonJS")]
    CommonJs,
    #[serde(rename = "AMD")]
    Amd,
    #[serde(rename = "UMD")]
    Umd,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePattern {
    pub pattern_type: ModulePatternType,
    pub exported_names: Vec<String>,
    pub location: Location,
}

/// A call passing a function as an argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Callback {
    pub callee: String,
    /// Index of the first function argument
    pub argument_index: usize,
    pub is_arrow: bool,
    /// Heuristic: the callee text mentions an async-flavoured API
    pub is_async: bool,
    pub location: Location,
}

/// A non-empty `{ … }` expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectLiteral {
    pub property_names: Vec<String>,
    pub method_names: Vec<String>,
    pub location: Location,
}

/// A function, arrow or generator expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionExpression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// What the expression is assigned to (`handler`, `Foo.prototype.bar`, a key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub is_arrow: bool,
    pub is_async: bool,
    pub is_generator: bool,
    pub location: Location,
}

/// Pattern kinds, used as keys for per-kind counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    DynamicPropertyAccess,
    Closure,
    PrototypeMethod,
    ModulePattern,
    Callback,
    ObjectLiteral,
    FunctionExpression,
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PatternKind::DynamicPropertyAccess => "dynamicPropertyAccess",
            PatternKind::Closure => "closure",
            PatternKind::PrototypeMethod => "prototypeMethod",
            PatternKind::ModulePattern => "modulePattern",
            PatternKind::Callback => "callback",
            PatternKind::ObjectLiteral => "objectLiteral",
            PatternKind::FunctionExpression => "functionExpression",
        };
        f.write_str(name)
    }
}

/// All pattern records, one list per kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSet {
    pub dynamic_property_accesses: Vec<DynamicPropertyAccess>,
    pub closures: Vec<Closure>,
    pub prototype_methods: Vec<PrototypeMethod>,
    pub module_patterns: Vec<ModulePattern>,
    pub callbacks: Vec<Callback>,
    pub object_literals: Vec<ObjectLiteral>,
    pub function_expressions: Vec<FunctionExpression>,
}

impl PatternSet {
    /// Number of records per kind; every kind is present, zero included
    pub fn counts(&self) -> BTreeMap<PatternKind, usize> {
        BTreeMap::from([
            (
                PatternKind::DynamicPropertyAccess,
                self.dynamic_property_accesses.len(),
            ),
            (PatternKind::Closure, self.closures.len()),
            (PatternKind::PrototypeMethod, self.prototype_methods.len()),
            (PatternKind::ModulePattern, self.module_patterns.len()),
            (PatternKind::Callback, self.callbacks.len()),
            (PatternKind::ObjectLiteral, self.object_literals.len()),
            (PatternKind::FunctionExpression, self.function_expressions.len()),
        ])
    }

    pub fn len(&self) -> usize {
        self.counts().values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append another file's records, keeping their order
    pub fn extend(&mut self, other: PatternSet) {
        self.dynamic_property_accesses
            .extend(other.dynamic_property_accesses);
        self.closures.extend(other.closures);
        self.prototype_methods.extend(other.prototype_methods);
        self.module_patterns.extend(other.module_patterns);
        self.callbacks.extend(other.callbacks);
        self.object_literals.extend(other.object_literals);
        self.function_expressions.extend(other.function_expressions);
    }
}
