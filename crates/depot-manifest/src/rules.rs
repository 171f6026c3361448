//! # Field Rules — Atomic Validators
//!
//! Each rule is a pure check over a candidate string value: it either
//! accepts, or rejects with a human-readable reason. Rules carry no
//! mutable state; regular expressions are compiled once when the
//! schema registry is built.
//!
//! The one exception is [`Rule::SpdxLicense`], which needs external
//! reference data — the engine routes it through its configured
//! [`crate::LicenseSource`] instead of calling [`Rule::check`].

use regex::Regex;
use url::Url;

use crate::error::RuleKind;

/// An atomic validation rule attached to a schema field.
///
/// For string-list fields the rule applies to each item independently.
#[derive(Debug, Clone)]
pub enum Rule {
    /// String length within `[min, max]`, inclusive, in characters.
    Length { min: usize, max: usize },
    /// Anchored full match; `allowed` names the permitted character
    /// class for the rejection reason.
    Regexp { regex: Regex, allowed: &'static str },
    /// Membership in an explicit literal set.
    OneOf { choices: &'static [&'static str] },
    /// Structural URL well-formedness: parseable, with scheme and host.
    Url,
    /// Structural email well-formedness: `local@domain` shape.
    Email,
    /// Semantic-version coercion: at least one `.`, numeric components.
    SemVer,
    /// Case-sensitive membership in the cached SPDX license registry.
    /// Evaluated by the engine against its license source.
    SpdxLicense,
}

impl Rule {
    /// The taxonomy kind used in error reporting.
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Length { .. } => RuleKind::Length,
            Rule::Regexp { .. } => RuleKind::Regexp,
            Rule::OneOf { .. } => RuleKind::OneOf,
            Rule::Url => RuleKind::Url,
            Rule::Email => RuleKind::Email,
            Rule::SemVer => RuleKind::SemVer,
            Rule::SpdxLicense => RuleKind::SpdxLicense,
        }
    }

    /// Apply the rule to a value, returning the rejection reason on
    /// failure.
    ///
    /// `SpdxLicense` always passes here: registry membership requires
    /// external data, and the engine evaluates that rule through its
    /// license source before falling back to this method.
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            Rule::Length { min, max } => {
                let len = value.chars().count();
                if len < *min || len > *max {
                    Err(format!("length must be between {min} and {max}, got {len}"))
                } else {
                    Ok(())
                }
            }
            Rule::Regexp { regex, allowed } => {
                if regex.is_match(value) {
                    Ok(())
                } else {
                    Err(format!("only {allowed} characters are allowed"))
                }
            }
            Rule::OneOf { choices } => {
                if choices.contains(&value) {
                    Ok(())
                } else {
                    Err(format!("must be one of [{}]", choices.join(", ")))
                }
            }
            Rule::Url => check_url(value),
            Rule::Email => check_email(value),
            Rule::SemVer => check_semver(value),
            Rule::SpdxLicense => Ok(()),
        }
    }
}

/// A URL is acceptable when it parses and carries both a scheme and a
/// host. No resolution or dereferencing is attempted.
fn check_url(value: &str) -> Result<(), String> {
    match Url::parse(value) {
        Ok(url) if url.has_host() => Ok(()),
        Ok(_) => Err("URL must include a host".to_string()),
        Err(e) => Err(format!("invalid URL: {e}")),
    }
}

/// An email is acceptable when it has the `local@domain` shape: a
/// single `@`, a non-empty local part, and a dotted domain without
/// whitespace. Deliverability is not checked.
fn check_email(value: &str) -> Result<(), String> {
    let Some((local, domain)) = value.split_once('@') else {
        return Err("email must contain a single '@'".to_string());
    };
    if local.is_empty() || domain.contains('@') {
        return Err("email must contain a single '@'".to_string());
    }
    if !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.chars().any(char::is_whitespace)
        || local.chars().any(char::is_whitespace)
    {
        return Err("email domain is malformed".to_string());
    }
    Ok(())
}

/// Semantic-version check with coercion: `"1.2"` is acceptable because
/// it coerces to `"1.2.0"`, but a value with no `.` at all is not,
/// even when it would coerce (a bare `"1"` is more likely a mistake
/// than a one-component version).
fn check_semver(value: &str) -> Result<(), String> {
    const REASON: &str = "invalid semantic versioning format, see https://semver.org/";
    if !value.contains('.') {
        return Err(REASON.to_string());
    }
    match coerce_semver(value) {
        Some(_) => Ok(()),
        None => Err(REASON.to_string()),
    }
}

/// Coerce a loose version string into `major.minor.patch[-pre][+build]`,
/// padding missing numeric components with zeros. Returns `None` when
/// the value cannot be read as a version at all.
pub fn coerce_semver(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // Split off build metadata, then a pre-release tag.
    let (rest, build) = match value.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (value, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = Vec::with_capacity(3);
    for part in &parts {
        let n: u64 = part.parse().ok()?;
        numbers.push(n);
    }
    while numbers.len() < 3 {
        numbers.push(0);
    }

    let tag_ok = |tag: &str| {
        !tag.is_empty()
            && tag
                .split('.')
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
    };
    if let Some(pre) = pre {
        if !tag_ok(pre) {
            return None;
        }
    }
    if let Some(build) = build {
        if !tag_ok(build) {
            return None;
        }
    }

    let mut out = format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre {
        out.push('-');
        out.push_str(pre);
    }
    if let Some(build) = build {
        out.push('+');
        out.push_str(build);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regexp(pattern: &str, allowed: &'static str) -> Rule {
        Rule::Regexp {
            regex: Regex::new(pattern).unwrap(),
            allowed,
        }
    }

    // ---- Length ----

    #[test]
    fn test_length_bounds_inclusive() {
        let rule = Rule::Length { min: 1, max: 3 };
        assert!(rule.check("a").is_ok());
        assert!(rule.check("abc").is_ok());
        assert!(rule.check("").is_err());
        assert!(rule.check("abcd").is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let rule = Rule::Length { min: 1, max: 2 };
        assert!(rule.check("éé").is_ok());
    }

    // ---- Regexp ----

    #[test]
    fn test_regexp_full_match_only() {
        let rule = regexp(r"^[a-z\d\-_]+$", "[a-z0-9-_]");
        assert!(rule.check("esp32").is_ok());
        let err = rule.check("ESP 32!").unwrap_err();
        assert!(err.contains("[a-z0-9-_]"), "reason names the class: {err}");
    }

    // ---- OneOf ----

    #[test]
    fn test_one_of_membership() {
        let rule = Rule::OneOf {
            choices: &["git", "hg", "svn"],
        };
        assert!(rule.check("git").is_ok());
        let err = rule.check("cvs").unwrap_err();
        assert!(err.contains("git, hg, svn"));
    }

    // ---- Url ----

    #[test]
    fn test_url_requires_scheme_and_host() {
        assert!(Rule::Url.check("https://example.com/pkg").is_ok());
        assert!(Rule::Url.check("example.com/pkg").is_err());
        assert!(Rule::Url.check("mailto:me@example.com").is_err());
        assert!(Rule::Url.check("not a url").is_err());
    }

    // ---- Email ----

    #[test]
    fn test_email_shape() {
        assert!(Rule::Email.check("dev@example.com").is_ok());
        assert!(Rule::Email.check("no-at-sign").is_err());
        assert!(Rule::Email.check("@example.com").is_err());
        assert!(Rule::Email.check("a@b").is_err());
        assert!(Rule::Email.check("a@b.c@d.e").is_err());
        assert!(Rule::Email.check("a b@example.com").is_err());
    }

    // ---- SemVer ----

    #[test]
    fn test_semver_two_components_coercible() {
        assert!(Rule::SemVer.check("1.2").is_ok());
        assert_eq!(coerce_semver("1.2").unwrap(), "1.2.0");
    }

    #[test]
    fn test_semver_full_and_tagged() {
        assert!(Rule::SemVer.check("1.2.3").is_ok());
        assert!(Rule::SemVer.check("1.2.3-rc.1").is_ok());
        assert!(Rule::SemVer.check("1.2.3+build5").is_ok());
        assert_eq!(coerce_semver("1.2-rc.1").unwrap(), "1.2.0-rc.1");
    }

    #[test]
    fn test_semver_rejects_no_dot() {
        assert!(Rule::SemVer.check("1").is_err());
    }

    #[test]
    fn test_semver_rejects_non_numeric() {
        assert!(Rule::SemVer.check("abc").is_err());
        assert!(Rule::SemVer.check("a.b.c").is_err());
        assert!(Rule::SemVer.check("1.2.3.4").is_err());
    }

    // ---- SpdxLicense ----

    #[test]
    fn test_spdx_rule_defers_to_engine() {
        // The pure check is a pass-through; the engine consults the
        // license source for this rule.
        assert!(Rule::SpdxLicense.check("anything").is_ok());
        assert_eq!(Rule::SpdxLicense.kind(), RuleKind::SpdxLicense);
    }
}
