//! Export-condition vocabulary and the `ConditionChain` type.

use serde::{Serialize, Serializer};
use std::fmt;

/// Recognized source extensions, in lookup priority order.
///
/// Source lookups and wildcard matches walk this list front to back, so when several
/// files share a basename the earliest extension is the one picked. Every
/// such file is still a conflict candidate: `index.ts` next to `index.js`
/// fails entry collection.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Non-default environment variants that may have a dedicated source file
/// (`index.development.ts`, `index.react-server.ts`, ...).
pub const SPECIAL_CONDITIONS: &[&str] = &[
    "development",
    "production",
    "react-server",
    "react-native",
    "edge-light",
];

/// Conditions that select a module system. A chain holds at most one.
pub const RUNTIME_CONDITIONS: &[&str] = &["import", "require", "module", "default"];

/// Condition selecting a declaration file.
pub const TYPES_CONDITION: &str = "types";

/// Source-variant key used when no special condition applies.
pub const DEFAULT_VARIANT: &str = "default";

pub fn is_special_condition(condition: &str) -> bool {
    SPECIAL_CONDITIONS.contains(&condition)
}

pub fn is_runtime_condition(condition: &str) -> bool {
    RUNTIME_CONDITIONS.contains(&condition)
}

pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext)
}

/// The `type` field of a package manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PackageType {
    Module,
    #[default]
    CommonJs,
}

impl PackageType {
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some("module") => PackageType::Module,
            _ => PackageType::CommonJs,
        }
    }

    pub fn is_esm(self) -> bool {
        matches!(self, PackageType::Module)
    }
}

/// Infer the runtime condition an output file is consumed under.
///
/// Explicit `.mjs`/`.cjs` extensions win; anything else follows the package type.
pub fn export_type_from_file(output: &str, package_type: PackageType) -> &'static str {
    if output.ends_with(".mjs") || output.ends_with(".d.mts") {
        "import"
    } else if output.ends_with(".cjs") || output.ends_with(".d.cts") {
        "require"
    } else if package_type.is_esm() {
        "import"
    } else {
        "require"
    }
}

/// Ordered, deduplicated set of export conditions leading to one output.
///
/// Serialized as a dot-joined string (`"import.development"`).
///
/// Invariants upheld by [`ConditionChain::push`]:
/// - at most one runtime condition (`import`/`require`/`module`/`default`);
///   a specific one replaces `default` in place, later ones are dropped
/// - at most one special condition; the outermost is kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionChain(Vec<String>);

impl ConditionChain {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a chain from a dot-joined string, applying the push rules.
    pub fn parse(joined: &str) -> Self {
        let mut chain = Self::new();
        for condition in joined.split('.').filter(|c| !c.is_empty()) {
            chain.push(condition);
        }
        chain
    }

    /// Append a condition. Returns `false` if the chain rejected it.
    pub fn push(&mut self, condition: &str) -> bool {
        if condition.is_empty() || self.contains(condition) {
            return false;
        }

        if is_runtime_condition(condition) {
            if let Some(pos) = self.0.iter().position(|c| is_runtime_condition(c)) {
                if self.0[pos] == DEFAULT_VARIANT {
                    self.0[pos] = condition.to_string();
                    return true;
                }
                return false;
            }
        } else if is_special_condition(condition) && self.special().is_some() {
            return false;
        }

        self.0.push(condition.to_string());
        true
    }

    /// Chained variant of [`push`](Self::push) for building literals.
    pub fn with(mut self, condition: &str) -> Self {
        self.push(condition);
        self
    }

    pub fn conditions(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, condition: &str) -> bool {
        self.0.iter().any(|c| c == condition)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The runtime condition, if any.
    pub fn runtime(&self) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|c| is_runtime_condition(c))
    }

    /// The special condition, if any.
    pub fn special(&self) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|c| is_special_condition(c))
    }

    /// Whether this chain selects a declaration file.
    pub fn is_types(&self) -> bool {
        self.contains(TYPES_CONDITION)
    }
}

impl fmt::Display for ConditionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl Serialize for ConditionChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
