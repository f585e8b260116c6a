//! # Prompt-to-Ruleset Compilation
//!
//! The rule catalog maps technology keywords to guidance snippets that are
//! injected into the LLM system prompt. Matching is deliberately simple:
//! a rule fires when one of its trigger substrings occurs in the normalized
//! prompt, or when the client's explicit stack selection names it.
//!
//! The same normalization feeds the cache key, so two requests that differ
//! only in casing or whitespace resolve to the same cached generation.

pub mod catalog;

pub use catalog::builtin_rules;

use sha2::{Digest, Sha256};

/// A single technology rule: trigger substrings plus the guidance text
/// appended to the system prompt when the rule fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechRule {
    /// Canonical technology name, matched against explicit stack selections
    pub name: &'static str,
    /// Substrings that activate this rule when found in the normalized prompt
    pub triggers: &'static [&'static str],
    /// Guidance injected into the system prompt
    pub guidance: &'static str,
}

/// The technology-rule dictionary with matching and prompt compilation.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: Vec<TechRule>,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }
}

impl RuleCatalog {
    pub fn new(rules: Vec<TechRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return every rule activated by the prompt or the stack selection.
    ///
    /// Each rule is reported at most once, in catalog order.
    pub fn matching(&self, normalized_prompt: &str, stack: &[String]) -> Vec<&TechRule> {
        let stack_normalized: Vec<String> =
            stack.iter().map(|entry| normalize_prompt(entry)).collect();

        self.rules
            .iter()
            .filter(|rule| {
                let by_prompt = rule
                    .triggers
                    .iter()
                    .any(|trigger| normalized_prompt.contains(trigger));
                let by_stack = stack_normalized.iter().any(|entry| {
                    entry == rule.name
                        || rule.triggers.iter().any(|trigger| entry.contains(trigger))
                });
                by_prompt || by_stack
            })
            .collect()
    }

    /// Compile the full system prompt for a generation request.
    ///
    /// The base instructions pin the output contract (a single JSON object
    /// describing the file tree); matched rules contribute a technology
    /// guidelines section.
    pub fn compile_system_prompt(&self, normalized_prompt: &str, stack: &[String]) -> String {
        let mut prompt = String::from(BASE_SYSTEM_PROMPT);

        let matched = self.matching(normalized_prompt, stack);
        if !matched.is_empty() {
            prompt.push_str("\n## Technology guidelines\n");
            for rule in matched {
                prompt.push_str("- ");
                prompt.push_str(rule.name);
                prompt.push_str(": ");
                prompt.push_str(rule.guidance);
                prompt.push('\n');
            }
        }

        prompt
    }
}

/// Base instructions for the scaffold-synthesis model.
///
/// The output contract matters more than the prose: the response must be a
/// single JSON object so the backend can parse it without heuristics.
const BASE_SYSTEM_PROMPT: &str = "\
You are a project scaffolding assistant. Generate a complete, runnable \
starter project for the user's requested technology stack.

Respond with a single JSON object and nothing else, using this shape:
{\"name\": \"<short-project-name>\", \"files\": [{\"path\": \"<relative/path>\", \"content\": \"<file content>\"}]}

Rules for the file tree:
- Paths are relative, use forward slashes, and never contain '..'.
- Include build manifests, a minimal README, and a .gitignore.
- Every file must contain working content, not placeholders.
- Prefer small, conventional project layouts over exhaustive ones.
";

/// Normalize a prompt for matching and cache keying.
///
/// Lowercases, strips control characters, and collapses whitespace runs to
/// single spaces. Idempotent.
pub fn normalize_prompt(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compute the cache key for a prompt and stack selection.
///
/// SHA-256 over the normalized prompt plus the sorted, deduplicated,
/// normalized stack entries; stable under re-spacing, casing, and stack
/// reordering.
pub fn cache_key(prompt: &str, stack: &[String]) -> String {
    let normalized = normalize_prompt(prompt);

    let mut entries: Vec<String> = stack
        .iter()
        .map(|entry| normalize_prompt(entry))
        .filter(|entry| !entry.is_empty())
        .collect();
    entries.sort();
    entries.dedup();

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update(b"\n");
    hasher.update(entries.join(",").as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stack(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_prompt("  React\tapp\n with   PostgreSQL "),
            "react app with postgresql"
        );
    }

    #[test]
    fn test_cache_key_stable_under_stack_reordering() {
        let a = cache_key("a react app", &stack(&["react", "postgres"]));
        let b = cache_key("A  React APP", &stack(&["Postgres", "react", "react"]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_cache_key_differs_for_different_prompts() {
        let a = cache_key("a react app", &[]);
        let b = cache_key("a vue app", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_prompt_trigger_matches_rule() {
        let catalog = RuleCatalog::default();
        let matched = catalog.matching(&normalize_prompt("A Next.js dashboard"), &[]);
        assert!(matched.iter().any(|rule| rule.name == "nextjs"));
    }

    #[test]
    fn test_stack_selection_matches_rule_without_prompt_mention() {
        let catalog = RuleCatalog::default();
        let matched = catalog.matching(
            &normalize_prompt("a plain dashboard"),
            &stack(&["PostgreSQL"]),
        );
        assert!(matched.iter().any(|rule| rule.name == "postgresql"));
    }

    #[test]
    fn test_rule_injected_exactly_once() {
        let catalog = RuleCatalog::default();
        // Prompt and stack both name react; the guideline must appear once
        let prompt = catalog.compile_system_prompt(
            &normalize_prompt("a React app with react-router"),
            &stack(&["react"]),
        );
        assert_eq!(prompt.matches("- react: ").count(), 1);
    }

    #[test]
    fn test_unmatched_catalog_adds_no_guidelines_section() {
        let catalog = RuleCatalog::default();
        let prompt = catalog.compile_system_prompt(&normalize_prompt("an empty project"), &[]);
        assert!(!prompt.contains("## Technology guidelines"));
        assert!(prompt.contains("single JSON object"));
    }

    #[test]
    fn test_compiled_prompt_contains_matched_guidance() {
        let catalog = RuleCatalog::default();
        let prompt = catalog.compile_system_prompt(
            &normalize_prompt("an express api"),
            &stack(&["typescript"]),
        );
        assert!(prompt.contains("- express: "));
        assert!(prompt.contains("- typescript: "));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "\\PC{0,200}") {
            let once = normalize_prompt(&raw);
            prop_assert_eq!(normalize_prompt(&once), once);
        }

        #[test]
        fn prop_cache_key_ignores_surrounding_whitespace(raw in "[a-z ]{1,80}") {
            let padded = format!("  {raw}\t");
            prop_assert_eq!(cache_key(&raw, &[]), cache_key(&padded, &[]));
        }
    }
}
