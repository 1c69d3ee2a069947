//! Provider configuration.

use serde::Deserialize;

/// Grammar scopes clang can compile.
pub const DEFAULT_GRAMMAR_SCOPES: [&str; 4] =
    ["source.c", "source.cpp", "source.objc", "source.objcpp"];

/// Configuration for the clang diagnostics provider.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    /// Documents whose grammar scope is in this list are compiled on events.
    #[serde(default = "default_grammar_scopes")]
    pub grammar_scopes: Vec<String>,
    /// Recompile when a document is saved. Default: true.
    #[serde(default = "default_true")]
    pub run_on_save: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            grammar_scopes: default_grammar_scopes(),
            run_on_save: true,
        }
    }
}

impl DiagnosticsConfig {
    #[must_use]
    pub fn handles_grammar(&self, scope: &str) -> bool {
        self.grammar_scopes.iter().any(|s| s == scope)
    }
}

fn default_grammar_scopes() -> Vec<String> {
    DEFAULT_GRAMMAR_SCOPES.iter().map(ToString::to_string).collect()
}

const fn default_true() -> bool {
    true
}
