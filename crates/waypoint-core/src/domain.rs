use crate::error::RuleError;
use crate::rule::{RedirectKind, Rule, RuleId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Trailing character marking a source domain as a subdomain prefix of the
/// target domain, e.g. `www.`.
pub const SUBDOMAIN_SEPARATOR: char = '.';

/// A whole-host redirect from one domain to another.
///
/// The source `domain` is either a fully qualified host (`old.example.com`)
/// or a subdomain prefix ending with [`SUBDOMAIN_SEPARATOR`] (`www.`), which
/// is completed with the target domain. See [`DomainRedirect::fqdn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRedirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RuleId>,
    /// The domain to redirect from.
    pub domain: String,
    /// The domain of the site to redirect to.
    pub target_domain: String,
    #[serde(default)]
    pub kind: RedirectKind,
}

impl DomainRedirect {
    /// Creates an unsaved domain redirect.
    pub fn new(
        domain: impl Into<String>,
        target_domain: impl Into<String>,
        kind: RedirectKind,
    ) -> Self {
        Self {
            id: None,
            domain: domain.into(),
            target_domain: target_domain.into(),
            kind,
        }
    }

    /// Whether the source domain is a subdomain prefix of the target domain.
    pub fn is_subdomain_prefix(&self) -> bool {
        self.domain.ends_with(SUBDOMAIN_SEPARATOR)
    }

    /// The fully qualified source host, used as the exact-match lookup key.
    ///
    /// `www.` redirecting to `example.com` yields `www.example.com`; a source
    /// without the trailing separator is returned verbatim.
    pub fn fqdn(&self) -> String {
        if self.is_subdomain_prefix() {
            format!("{}{}", self.domain, self.target_domain)
        } else {
            self.domain.clone()
        }
    }
}

impl Display for DomainRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} redirect from '{}' to '{}'",
            self.kind,
            self.fqdn(),
            self.target_domain
        )
    }
}

impl Rule for DomainRedirect {
    const KIND: &'static str = "DomainRedirect";

    fn id(&self) -> Option<RuleId> {
        self.id
    }

    fn with_id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    fn normalize(mut self) -> Self {
        self.domain = self.domain.trim().to_string();
        self.target_domain = self.target_domain.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), RuleError> {
        if self.domain.trim().is_empty() {
            return Err(RuleError::EmptyDomain);
        }
        if self.target_domain.trim().is_empty() {
            return Err(RuleError::EmptyTargetDomain);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_appends_target_to_subdomain_prefix() {
        let rule = DomainRedirect::new("www.", "example.com", RedirectKind::Permanent);
        assert!(rule.is_subdomain_prefix());
        assert_eq!(rule.fqdn(), "www.example.com");
    }

    #[test]
    fn fqdn_is_verbatim_without_separator() {
        let rule = DomainRedirect::new("old.example.org", "example.com", RedirectKind::Permanent);
        assert!(!rule.is_subdomain_prefix());
        assert_eq!(rule.fqdn(), "old.example.org");
    }

    #[test]
    fn fqdn_keeps_ports_and_case() {
        let rule = DomainRedirect::new(
            "Legacy.Example.com:8080",
            "example.com",
            RedirectKind::Temporary,
        );
        assert_eq!(rule.fqdn(), "Legacy.Example.com:8080");
    }

    #[test]
    fn display_describes_redirect() {
        let rule = DomainRedirect::new("www.", "example.com", RedirectKind::Temporary);
        assert_eq!(
            rule.to_string(),
            "Temporary redirect from 'www.example.com' to 'example.com'"
        );
    }

    #[test]
    fn validate_rejects_empty_domains() {
        let rule = DomainRedirect::new("  ", "example.com", RedirectKind::Permanent);
        assert_eq!(rule.validate(), Err(RuleError::EmptyDomain));

        let rule = DomainRedirect::new("www.", "", RedirectKind::Permanent);
        assert_eq!(rule.validate(), Err(RuleError::EmptyTargetDomain));

        let rule = DomainRedirect::new("www.", "example.com", RedirectKind::Permanent);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn normalize_trims_domains() {
        let rule =
            DomainRedirect::new(" www. ", "example.com\n", RedirectKind::Permanent).normalize();
        assert_eq!(rule.fqdn(), "www.example.com");
    }

    #[test]
    fn with_id_sets_identity() {
        let rule = DomainRedirect::new("www.", "example.com", RedirectKind::Permanent);
        assert_eq!(rule.id(), None);
        assert_eq!(rule.with_id(RuleId::new(7)).id(), Some(RuleId::new(7)));
    }

    #[test]
    fn only_id_ordering_is_supported() {
        assert!(DomainRedirect::orderable_by(crate::rule::OrderBy::Id));
        assert!(!DomainRedirect::orderable_by(crate::rule::OrderBy::Priority));
    }
}
