use crate::error::RuleError;
use crate::rule::{OrderBy, RedirectKind, Rule, RuleId};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Evaluation priority of a regex rule. Lower values are evaluated first.
///
/// Valid priorities are `1..=99`; the default is the lowest priority, 99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 99;

    pub fn new(value: i64) -> Result<Self, RuleError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RuleError::PriorityOutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<i64> for Priority {
    type Error = RuleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for i64 {
    fn from(priority: Priority) -> Self {
        i64::from(priority.0)
    }
}

/// A path redirect driven by a regular expression.
///
/// The pattern is searched for anywhere in the request path; authors add
/// `^` and `$` themselves when they want an anchored match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexRedirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RuleId>,
    pub pattern: String,
    /// Path or URL sent as the redirect location.
    pub replacement: String,
    #[serde(default)]
    pub kind: RedirectKind,
    #[serde(default)]
    pub priority: Priority,
}

impl RegexRedirect {
    /// Creates an unsaved rule with the default priority.
    ///
    /// Surrounding whitespace is trimmed from the pattern and replacement.
    pub fn new(pattern: impl AsRef<str>, replacement: impl AsRef<str>, kind: RedirectKind) -> Self {
        Self {
            id: None,
            pattern: pattern.as_ref().trim().to_string(),
            replacement: replacement.as_ref().trim().to_string(),
            kind,
            priority: Priority::default(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Compiles the pattern.
    pub fn compile(&self) -> Result<Regex, RuleError> {
        Regex::new(&self.pattern).map_err(|e| RuleError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })
    }
}

impl Rule for RegexRedirect {
    const KIND: &'static str = "RegexRedirect";

    fn id(&self) -> Option<RuleId> {
        self.id
    }

    fn with_id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    fn orderable_by(_order: OrderBy) -> bool {
        true
    }

    fn order_value(&self, order: OrderBy) -> i64 {
        match order {
            OrderBy::Id => self.id.map_or(i64::MAX, RuleId::get),
            OrderBy::Priority => i64::from(self.priority),
        }
    }

    fn normalize(mut self) -> Self {
        let pattern = self.pattern.trim();
        if pattern.len() != self.pattern.len() {
            self.pattern = pattern.to_string();
        }
        let replacement = self.replacement.trim();
        if replacement.len() != self.replacement.len() {
            self.replacement = replacement.to_string();
        }
        self
    }

    fn validate(&self) -> Result<(), RuleError> {
        self.compile().map(|_| ())
    }
}

/// A [`RegexRedirect`] paired with its compiled matcher.
///
/// Built once when the ordered index is built so request handling never
/// compiles patterns. Serializes as the plain rule and recompiles on
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RegexRedirect", into = "RegexRedirect")]
pub struct CompiledRegexRedirect {
    rule: RegexRedirect,
    matcher: Regex,
}

impl CompiledRegexRedirect {
    pub fn rule(&self) -> &RegexRedirect {
        &self.rule
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    /// Searches the path for the pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

impl PartialEq for CompiledRegexRedirect {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule
    }
}

impl TryFrom<RegexRedirect> for CompiledRegexRedirect {
    type Error = RuleError;

    fn try_from(rule: RegexRedirect) -> Result<Self, Self::Error> {
        let matcher = rule.compile()?;
        Ok(Self { rule, matcher })
    }
}

impl From<CompiledRegexRedirect> for RegexRedirect {
    fn from(compiled: CompiledRegexRedirect) -> Self {
        compiled.rule
    }
}
