use crate::error::RuleError;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Identity of a stored rule, assigned by the backing store on first save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(i64);

impl RuleId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a redirect is permanent (301) or temporary (302).
///
/// Serialized as the status code string, which is also how the kind is
/// persisted by the storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RedirectKind {
    #[default]
    #[serde(rename = "301")]
    Permanent,
    #[serde(rename = "302")]
    Temporary,
}

impl RedirectKind {
    /// The HTTP status code sent for this kind of redirect.
    pub const fn status_code(self) -> StatusCode {
        match self {
            RedirectKind::Permanent => StatusCode::MOVED_PERMANENTLY,
            RedirectKind::Temporary => StatusCode::FOUND,
        }
    }

    /// The persisted form, `"301"` or `"302"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            RedirectKind::Permanent => "301",
            RedirectKind::Temporary => "302",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RedirectKind::Permanent => "Permanent",
            RedirectKind::Temporary => "Temporary",
        }
    }
}

impl Display for RedirectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RedirectKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "301" => Ok(RedirectKind::Permanent),
            "302" => Ok(RedirectKind::Temporary),
            other if other.eq_ignore_ascii_case("permanent") => Ok(RedirectKind::Permanent),
            other if other.eq_ignore_ascii_case("temporary") => Ok(RedirectKind::Temporary),
            other => Err(RuleError::UnknownKind(other.to_string())),
        }
    }
}

/// A field a backing store can order rule records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderBy {
    Id,
    Priority,
}

impl OrderBy {
    /// Field (and column) name.
    pub const fn field(self) -> &'static str {
        match self {
            OrderBy::Id => "id",
            OrderBy::Priority => "priority",
        }
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

/// A redirect rule record kept in a backing store and indexed by the redirector.
pub trait Rule: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Type name, used to scope cache keys per rule type.
    const KIND: &'static str;

    /// The store-assigned id, or `None` if the rule has never been saved.
    fn id(&self) -> Option<RuleId>;

    /// Returns the rule with its id set.
    fn with_id(self, id: RuleId) -> Self;

    /// Whether records of this type carry the given ordering field.
    fn orderable_by(order: OrderBy) -> bool {
        matches!(order, OrderBy::Id)
    }

    /// Value of the ordering field for this record.
    ///
    /// Only meaningful when [`Rule::orderable_by`] returns `true` for `order`.
    fn order_value(&self, order: OrderBy) -> i64 {
        match order {
            OrderBy::Id | OrderBy::Priority => self.id().map_or(i64::MAX, RuleId::get),
        }
    }

    /// Cleans up user-entered fields before the rule is written.
    fn normalize(self) -> Self {
        self
    }

    /// Checks the rule before it is written.
    fn validate(&self) -> Result<(), RuleError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_status_code() {
        assert_eq!(RedirectKind::Permanent.status_code(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(RedirectKind::Temporary.status_code(), StatusCode::FOUND);
        assert_eq!(RedirectKind::default(), RedirectKind::Permanent);
    }

    #[test]
    fn kind_parses_codes_and_labels() {
        assert_eq!("301".parse::<RedirectKind>().unwrap(), RedirectKind::Permanent);
        assert_eq!("302".parse::<RedirectKind>().unwrap(), RedirectKind::Temporary);
        assert_eq!("Temporary".parse::<RedirectKind>().unwrap(), RedirectKind::Temporary);
        assert_eq!(" permanent ".parse::<RedirectKind>().unwrap(), RedirectKind::Permanent);

        let err = "307".parse::<RedirectKind>().unwrap_err();
        assert_eq!(err, RuleError::UnknownKind("307".to_string()));
    }

    #[test]
    fn kind_serializes_as_status_string() {
        assert_eq!(serde_json::to_string(&RedirectKind::Temporary).unwrap(), "\"302\"");
        let kind: RedirectKind = serde_json::from_str("\"301\"").unwrap();
        assert_eq!(kind, RedirectKind::Permanent);
    }

    #[test]
    fn kind_display_uses_label() {
        assert_eq!(RedirectKind::Permanent.to_string(), "Permanent");
        assert_eq!(RedirectKind::Temporary.as_str(), "302");
    }
}
