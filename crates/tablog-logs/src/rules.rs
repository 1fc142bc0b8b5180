use regex::Regex;

use tablog_types::SeverityLevel;

use crate::error::LogError;

/// Characters that turn a `^`-anchored rule string into a regular expression
const REGEX_META: &[char] = &[
    '[', ']', '(', ')', '.', '*', '+', '?', '{', '}', '|', '\\', '^', '$',
];

/// Reference rule table, evaluated top to bottom
const DEFAULT_RULES: &[(SeverityLevel, &[&str])] = &[
    (
        SeverityLevel::Debug,
        &[
            "^DEBUG",
            "^D:",
            "^Debug:",
            "^-D-",
            "^-Debug-",
            r"\[DEBUG\s*\]",
            r"DEBUG\]",
        ],
    ),
    (
        SeverityLevel::Info,
        &[
            "^INFO",
            "^I:",
            "^Information:",
            "^-I-",
            "^-Info-",
            r"\[INFO\s*\]",
            r"INFO\]",
        ],
    ),
    (
        SeverityLevel::Warning,
        &[
            "^WARNING",
            "^W:",
            "^Warning:",
            "^-W-",
            "^-Warning-",
            "^Warning",
            r"^\[main\] Warning",
            "^#WARNING",
            r"^\*\*WARN",
            r"^\[NV\]\[.*?\]Warning",
            r"\[WARNING\]",
            r"WARN\]",
            r"\[WARN\s*\]",
        ],
    ),
    (
        SeverityLevel::Error,
        &[
            "^ERROR",
            "^E:",
            "^Error:",
            "^-E-",
            "^-Error-",
            "^FATAL",
            "^F:",
            "^Fatal:",
            "^-F-",
            "^-Fatal-",
            "^CRITICAL",
            "^C:",
            "^-C-",
            "^-Critical-",
            "^Segmentation fault encountered",
            "^Critical:",
            r"^\*\*ERROR",
            r"^\[NV\]\[.*?\]Error",
            r"^\[main\] Error",
            r"^\[ErrorParser\]",
            "^ERR",
            "^TOTAL ERRORS",
            r"\[ERROR\s*\]",
            r"ERROR\]",
            r"\[FATAL\s*\]",
            r"\[CRITICAL\s*\]",
            "FATAL",
            r"(?i)Extended\s+Error\s+Info",
        ],
    ),
];

/// A single classification test, decided once at construction
#[derive(Clone, Debug)]
pub enum Rule {
    /// Line starts with the literal (case-sensitive)
    LiteralPrefix(String),
    /// Regular expression found anywhere in the line
    Pattern(Regex),
}

impl Rule {
    pub fn literal_prefix(prefix: impl Into<String>) -> Self {
        Self::LiteralPrefix(prefix.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Parse an authored rule string.
    ///
    /// `^` followed by plain text is a literal prefix test, anything else is
    /// compiled as an unanchored regex. Empty strings yield `None`.
    pub fn parse(authored: &str) -> Result<Option<Self>, regex::Error> {
        if authored.is_empty() {
            return Ok(None);
        }
        if let Some(prefix) = authored.strip_prefix('^')
            && !prefix.is_empty()
            && !prefix.contains(REGEX_META)
        {
            return Ok(Some(Self::literal_prefix(prefix)));
        }
        Self::pattern(authored).map(Some)
    }

    /// Check if the rule claims the line
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::LiteralPrefix(prefix) => line.starts_with(prefix.as_str()),
            Self::Pattern(re) => re.is_match(line),
        }
    }

    /// The rule in its authored form
    pub fn source(&self) -> String {
        match self {
            Self::LiteralPrefix(prefix) => format!("^{}", prefix),
            Self::Pattern(re) => re.as_str().to_string(),
        }
    }
}

#[derive(Clone, Debug)]
struct LevelRules {
    level: SeverityLevel,
    rules: Vec<Rule>,
}

/// Immutable, ordered collection of per-level rules
#[derive(Debug)]
pub struct RuleSet {
    /// Levels in evaluation order, `Text` never present
    levels: Vec<LevelRules>,

    /// Patterns dropped during construction
    diagnostics: Vec<LogError>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// A rule set without rules; every line classifies as `Text`
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Classify a line: the first level (in evaluation order) with any
    /// matching rule wins, later levels are not consulted.
    pub fn classify(&self, line: &str) -> SeverityLevel {
        self.levels
            .iter()
            .find(|entry| entry.rules.iter().any(|rule| rule.matches(line)))
            .map(|entry| entry.level)
            .unwrap_or(SeverityLevel::Text)
    }

    /// Levels in evaluation order
    pub fn levels(&self) -> impl Iterator<Item = SeverityLevel> + '_ {
        self.levels.iter().map(|entry| entry.level)
    }

    /// Rules configured for a level, in declaration order
    pub fn rules_for(&self, level: SeverityLevel) -> &[Rule] {
        self.levels
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| entry.rules.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of usable rules
    pub fn rule_count(&self) -> usize {
        self.levels.iter().map(|entry| entry.rules.len()).sum()
    }

    /// Patterns that were dropped because they failed to compile
    pub fn diagnostics(&self) -> &[LogError] {
        &self.diagnostics
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        DEFAULT_RULES
            .iter()
            .fold(Self::builder(), |builder, (level, patterns)| {
                builder.level(*level, patterns.iter().copied())
            })
            .build()
    }
}

/// Builder for [`RuleSet`]. Levels are evaluated in the order first added.
#[derive(Default)]
pub struct RuleSetBuilder {
    levels: Vec<LevelRules>,
    diagnostics: Vec<LogError>,
}

impl RuleSetBuilder {
    /// Add authored rule strings for a level. Invalid patterns are dropped
    /// and recorded as diagnostics.
    pub fn level<I, S>(mut self, level: SeverityLevel, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if level == SeverityLevel::Text {
            tracing::warn!("ignoring rules configured for the Text level");
            return self;
        }

        let mut parsed = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match Rule::parse(pattern) {
                Ok(Some(rule)) => parsed.push(rule),
                Ok(None) => {}
                Err(source) => {
                    tracing::warn!(%level, pattern, error = %source, "dropping invalid pattern");
                    self.diagnostics.push(LogError::InvalidPattern {
                        level,
                        pattern: pattern.to_string(),
                        source,
                    });
                }
            }
        }

        self.entry(level).extend(parsed);
        self
    }

    /// Add an already constructed rule
    pub fn rule(mut self, level: SeverityLevel, rule: Rule) -> Self {
        if level == SeverityLevel::Text {
            tracing::warn!("ignoring rule configured for the Text level");
            return self;
        }
        self.entry(level).push(rule);
        self
    }

    pub fn build(self) -> RuleSet {
        RuleSet {
            levels: self.levels,
            diagnostics: self.diagnostics,
        }
    }

    fn entry(&mut self, level: SeverityLevel) -> &mut Vec<Rule> {
        let pos = match self.levels.iter().position(|entry| entry.level == level) {
            Some(pos) => pos,
            None => {
                self.levels.push(LevelRules {
                    level,
                    rules: Vec::new(),
                });
                self.levels.len() - 1
            }
        };
        &mut self.levels[pos].rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_prefix() {
        let rule = Rule::parse("^ERROR").unwrap().unwrap();
        assert!(matches!(rule, Rule::LiteralPrefix(ref p) if p == "ERROR"));
        assert!(rule.matches("ERROR: disk full"));
        assert!(!rule.matches("xERROR: disk full"));
        assert!(!rule.matches("error: disk full"));
    }

    #[test]
    fn test_parse_general_pattern() {
        let rule = Rule::parse(r"\[WARN\s*\]").unwrap().unwrap();
        assert!(matches!(rule, Rule::Pattern(_)));
        assert!(rule.matches("2024 [WARN ] retry"));
        assert!(rule.matches("[WARN]x"));
        assert!(!rule.matches("WARN retry"));
    }

    #[test]
    fn test_anchored_regex_stays_regex() {
        let rule = Rule::parse(r"^\[main\] Error").unwrap().unwrap();
        assert!(matches!(rule, Rule::Pattern(_)));
        assert!(rule.matches("[main] Error: boom"));
        assert!(!rule.matches(" [main] Error: boom"));
    }

    #[test]
    fn test_empty_rule_is_skipped() {
        assert!(Rule::parse("").unwrap().is_none());
    }

    #[test]
    fn test_source_round_trip() {
        assert_eq!(Rule::parse("^-W-").unwrap().unwrap().source(), "^-W-");
        assert_eq!(Rule::parse("FATAL").unwrap().unwrap().source(), "FATAL");
    }

    #[test]
    fn test_unclassified_line_is_text() {
        let rules = RuleSet::default();
        assert_eq!(rules.classify("just some output"), SeverityLevel::Text);
        assert_eq!(rules.classify(""), SeverityLevel::Text);
    }

    #[test]
    fn test_default_rules() {
        let rules = RuleSet::default();
        assert_eq!(rules.classify("DEBUG starting"), SeverityLevel::Debug);
        assert_eq!(rules.classify("-I- loaded 3 modules"), SeverityLevel::Info);
        assert_eq!(rules.classify("2024 [WARN ] retry"), SeverityLevel::Warning);
        assert_eq!(rules.classify("**WARN low memory"), SeverityLevel::Warning);
        assert_eq!(rules.classify("ERROR: disk full"), SeverityLevel::Error);
        assert_eq!(rules.classify("job FATAL here"), SeverityLevel::Error);
        assert_eq!(
            rules.classify("see extended error info below"),
            SeverityLevel::Error
        );
        assert_eq!(
            rules.classify("[NV][09/Dec/2025 17:09:35 IST]Warning: slow"),
            SeverityLevel::Warning
        );
        assert!(rules.diagnostics().is_empty());
    }

    #[test]
    fn test_only_debug_pattern_classifies_debug() {
        let rules = RuleSet::builder()
            .level(SeverityLevel::Debug, ["^DBG"])
            .level(SeverityLevel::Error, ["^ERR"])
            .build();
        assert_eq!(rules.classify("DBG value=1"), SeverityLevel::Debug);
        assert_eq!(rules.classify("nothing"), SeverityLevel::Text);
    }

    #[test]
    fn test_first_level_wins() {
        let rules = RuleSet::builder()
            .level(SeverityLevel::Debug, ["retry"])
            .level(SeverityLevel::Error, ["^ERROR"])
            .build();
        // Matches both; Debug is evaluated first
        assert_eq!(rules.classify("ERROR retry failed"), SeverityLevel::Debug);

        let reversed = RuleSet::builder()
            .level(SeverityLevel::Error, ["^ERROR"])
            .level(SeverityLevel::Debug, ["retry"])
            .build();
        assert_eq!(reversed.classify("ERROR retry failed"), SeverityLevel::Error);
    }

    #[test]
    fn test_invalid_pattern_is_dropped() {
        let rules = RuleSet::builder()
            .level(SeverityLevel::Warning, [r"\[WARN", "^W:"])
            .build();
        assert_eq!(rules.rule_count(), 1);
        assert_eq!(rules.diagnostics().len(), 1);
        assert!(matches!(
            &rules.diagnostics()[0],
            LogError::InvalidPattern { level: SeverityLevel::Warning, pattern, .. } if pattern == r"\[WARN"
        ));
        assert_eq!(rules.classify("W: careful"), SeverityLevel::Warning);
    }

    #[test]
    fn test_text_level_never_has_rules() {
        let rules = RuleSet::builder()
            .level(SeverityLevel::Text, ["anything"])
            .rule(SeverityLevel::Text, Rule::literal_prefix("x"))
            .build();
        assert_eq!(rules.rule_count(), 0);
        assert_eq!(rules.levels().count(), 0);
    }

    #[test]
    fn test_repeated_level_extends_in_place() {
        let rules = RuleSet::builder()
            .level(SeverityLevel::Info, ["^I:"])
            .level(SeverityLevel::Error, ["^E:"])
            .level(SeverityLevel::Info, ["^INFO"])
            .build();
        let order: Vec<_> = rules.levels().collect();
        assert_eq!(order, vec![SeverityLevel::Info, SeverityLevel::Error]);
        assert_eq!(rules.rules_for(SeverityLevel::Info).len(), 2);
        assert!(rules.rules_for(SeverityLevel::Debug).is_empty());
    }
}
