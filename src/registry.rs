//! Catalog of known wire services and the patterns that identify them.
//!
//! Each service carries two tiers of matchers:
//!
//! - **name patterns**: high-precision, word-boundary aware expressions used on
//!   byline text and on attribution candidates pulled out of article copy
//! - **meta patterns**: loose expressions used on author metadata and URLs
//!
//! Registry order is significant. The byline and meta channels give a text to
//! the first service that matches it, so iteration order must stay fixed.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// A single wire service and its two pattern tiers.
#[derive(Debug)]
pub struct WireServiceDefinition {
    /// Unique service id, also the display name (e.g. `"Reuters"`).
    pub name: &'static str,
    /// High-precision matchers, tested in order.
    pub name_patterns: Vec<Regex>,
    /// Low-precision matchers for metadata fields and URLs, tested in order.
    pub meta_patterns: Vec<Regex>,
}

impl WireServiceDefinition {
    pub fn matches_name(&self, text: &str) -> bool {
        self.name_patterns.iter().any(|p| p.is_match(text))
    }

    pub fn matches_meta(&self, text: &str) -> bool {
        self.meta_patterns.iter().any(|p| p.is_match(text))
    }

    /// True when `snippet` satisfies one of this service's own patterns, either tier.
    pub fn owns_snippet(&self, snippet: &str) -> bool {
        self.matches_name(snippet) || self.matches_meta(snippet)
    }
}

/// Read-only, ordered collection of [`WireServiceDefinition`]s.
#[derive(Debug)]
pub struct PatternRegistry {
    services: Vec<WireServiceDefinition>,
}

static REGISTRY: Lazy<PatternRegistry> = Lazy::new(PatternRegistry::builtin);

impl PatternRegistry {
    /// The process-wide registry, built on first use.
    pub fn global() -> &'static PatternRegistry {
        &REGISTRY
    }

    pub fn lookup(&self, service_id: &str) -> Option<&WireServiceDefinition> {
        self.services.iter().find(|s| s.name == service_id)
    }

    /// Services in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = &WireServiceDefinition> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    fn builtin() -> Self {
        let services = vec![
            service(
                "Associated Press",
                &[
                    (r"\b(Associated Press|AP|A\.P\.)\b", false),
                    (r"\bThe Associated Press\b", false),
                ],
                &[(r"associated.?press", false), (r"\bap\b", false)],
            ),
            service(
                "Reuters",
                &[(r"\bReuters\b", false), (r"\bREUTERS\b", true)],
                &[(r"reuters", false)],
            ),
            service(
                "Bloomberg",
                &[
                    (r"\bBloomberg\b", false),
                    (r"\bBloomberg News\b", false),
                    (r"\bBloomberg LP\b", false),
                ],
                &[(r"bloomberg", false)],
            ),
            service(
                "Agence France-Presse",
                &[
                    (r"\bAFP\b", true),
                    (r"\bAgence France-Presse\b", false),
                    (r"\bA\.F\.P\.\b", true),
                ],
                &[(r"afp", false), (r"agence.france.presse", false)],
            ),
            service(
                "Press Association",
                &[
                    (r"\bPress Association\b", false),
                    (r"\bPA\b", true),
                    (r"\bP\.A\.\b", true),
                ],
                &[(r"press.association", false)],
            ),
            service(
                "Deutsche Presse-Agentur",
                &[
                    (r"\bDPA\b", true),
                    (r"\bdpa\b", true),
                    (r"\bDeutsche Presse-Agentur\b", false),
                ],
                &[(r"dpa", false), (r"deutsche.presse", false)],
            ),
            service(
                "Xinhua",
                &[(r"\bXinhua\b", false), (r"\bXinhua News Agency\b", false)],
                &[(r"xinhua", false)],
            ),
            service(
                "TASS",
                &[(r"\bTASS\b", true), (r"\bRussian News Agency TASS\b", false)],
                &[(r"tass", false)],
            ),
            service(
                "The Conversation",
                &[(r"\bThe Conversation\b", false)],
                &[(r"theconversation", false), (r"the.conversation", false)],
            ),
            service(
                "Stacker",
                &[(r"\bStacker\b", false), (r"\bStacker Newswire\b", false)],
                &[(r"stacker", false)],
            ),
        ];

        PatternRegistry { services }
    }
}

/// Build one definition. Each pattern is `(source, case_sensitive)`.
fn service(
    name: &'static str,
    name_patterns: &[(&str, bool)],
    meta_patterns: &[(&str, bool)],
) -> WireServiceDefinition {
    WireServiceDefinition {
        name,
        name_patterns: name_patterns.iter().map(|&(p, cs)| compile(p, cs)).collect(),
        meta_patterns: meta_patterns.iter().map(|&(p, cs)| compile(p, cs)).collect(),
    }
}

fn compile(pattern: &str, case_sensitive: bool) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .expect("valid wire service pattern")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_order_is_fixed() {
        let names: Vec<&str> = PatternRegistry::global().entries().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "Associated Press",
                "Reuters",
                "Bloomberg",
                "Agence France-Presse",
                "Press Association",
                "Deutsche Presse-Agentur",
                "Xinhua",
                "TASS",
                "The Conversation",
                "Stacker",
            ]
        );
    }

    #[test]
    fn test_every_service_has_both_tiers() {
        for service in PatternRegistry::global().entries() {
            assert!(!service.name_patterns.is_empty(), "{} has no name patterns", service.name);
            assert!(!service.meta_patterns.is_empty(), "{} has no meta patterns", service.name);
        }
    }

    #[test]
    fn test_lookup() {
        let registry = PatternRegistry::global();
        let reuters = registry.lookup("Reuters").unwrap();
        assert!(reuters.matches_name("By Jane Doe, Reuters"));
        assert!(reuters.matches_meta("https://www.reuters.com/world"));
        assert!(registry.lookup("Daily Planet").is_none());
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_name_patterns_respect_word_boundaries() {
        let ap = PatternRegistry::global().lookup("Associated Press").unwrap();
        assert!(ap.matches_name("(AP) — Officials said"));
        assert!(ap.matches_name("by the associated press"));
        assert!(!ap.matches_name("Apple shares rose"));
        assert!(!ap.matches_name("a happy ending"));
    }

    #[test]
    fn test_acronyms_are_case_sensitive() {
        let registry = PatternRegistry::global();
        let afp = registry.lookup("Agence France-Presse").unwrap();
        assert!(afp.matches_name("AFP"));
        assert!(!afp.matches_name("afp"));

        let pa = registry.lookup("Press Association").unwrap();
        assert!(pa.matches_name("PA Media"));
        assert!(!pa.matches_name("Pa and Ma went home"));

        let tass = registry.lookup("TASS").unwrap();
        assert!(!tass.matches_name("Tass"));
        assert!(tass.matches_name("Russian news agency tass"));
    }

    #[test]
    fn test_meta_patterns_are_loose() {
        let conversation = PatternRegistry::global().lookup("The Conversation").unwrap();
        assert!(conversation.matches_meta("https://theconversation.com/article-123"));
        assert!(!conversation.matches_name("theconversation.com"));
    }

    #[test]
    fn test_owns_snippet_checks_both_tiers() {
        let bloomberg = PatternRegistry::global().lookup("Bloomberg").unwrap();
        assert!(bloomberg.owns_snippet("Bloomberg News"));
        assert!(bloomberg.owns_snippet("@bloombergbiz"));
        assert!(!bloomberg.owns_snippet("Reuters"));
    }
}
