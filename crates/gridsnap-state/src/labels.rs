//! Label selectors.
//!
//! A [`LabelSelector`] is a conjunction of [`Requirement`]s evaluated
//! against a pod's label set. Selectors can be built programmatically or
//! parsed from their textual form:
//!
//! ```text
//! app=web,tier!=cache,zone in (a,b),env notin (dev),canary,!legacy
//! ```
//!
//! The empty selector matches every label set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};
use crate::types::Labels;

/// Comparison applied by a single requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// One `key <operator> values` clause of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    key: String,
    operator: Operator,
    #[serde(default)]
    values: Vec<String>,
}

impl Requirement {
    /// Build a requirement, checking the value count against the operator.
    ///
    /// `Equals`/`NotEquals` take exactly one value, `In`/`NotIn` at least
    /// one, `Exists`/`DoesNotExist` none.
    pub fn new(
        key: impl Into<String>,
        operator: Operator,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> StateResult<Self> {
        let key = key.into();
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.sort();
        values.dedup();

        let text = || format!("{key} {operator:?} {values:?}");
        if !is_valid_key(&key) {
            return Err(invalid(&text(), "label key must be non-empty [A-Za-z0-9-_./]"));
        }
        if let Some(bad) = values.iter().find(|v| !is_valid_value(v)) {
            return Err(invalid(&text(), &format!("invalid label value {bad:?}")));
        }

        let count_ok = match operator {
            Operator::Equals | Operator::NotEquals => values.len() == 1,
            Operator::In | Operator::NotIn => !values.is_empty(),
            Operator::Exists | Operator::DoesNotExist => values.is_empty(),
        };
        if !count_ok {
            return Err(invalid(&text(), "wrong number of values for operator"));
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Evaluate this requirement against a label set.
    ///
    /// Negative operators (`NotEquals`, `NotIn`) match when the key is
    /// absent.
    pub fn matches(&self, labels: &Labels) -> bool {
        let value = labels.get(&self.key);
        let contains = |v: &String| self.values.iter().any(|want| want == v);
        match self.operator {
            Operator::Equals | Operator::In => value.is_some_and(contains),
            Operator::NotEquals | Operator::NotIn => !value.is_some_and(contains),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.values.first().map_or("", String::as_str);
        match self.operator {
            Operator::Equals => write!(f, "{}={first}", self.key),
            Operator::NotEquals => write!(f, "{}!={first}", self.key),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// A conjunction of label requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    #[serde(default)]
    requirements: Vec<Requirement>,
    /// Set only by [`LabelSelector::nothing`].
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    match_nothing: bool,
}

impl LabelSelector {
    /// Selector matching every label set.
    pub fn everything() -> Self {
        Self::default()
    }

    /// Selector matching no label set.
    pub fn nothing() -> Self {
        Self {
            requirements: Vec::new(),
            match_nothing: true,
        }
    }

    /// Equality selector requiring every `key=value` pair in `labels`.
    pub fn from_labels(labels: &Labels) -> Self {
        labels
            .iter()
            .fold(Self::everything(), |sel, (k, v)| sel.with_equals(k.as_str(), v.as_str()))
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_equals(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_requirement(Requirement {
            key: key.into(),
            operator: Operator::Equals,
            values: vec![value.into()],
        })
    }

    pub fn with_exists(self, key: impl Into<String>) -> Self {
        self.with_requirement(Requirement {
            key: key.into(),
            operator: Operator::Exists,
            values: Vec::new(),
        })
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Whether this selector accepts every label set.
    pub fn is_everything(&self) -> bool {
        !self.match_nothing && self.requirements.is_empty()
    }

    /// Whether `labels` satisfies every requirement.
    pub fn matches(&self, labels: &Labels) -> bool {
        !self.match_nothing && self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.match_nothing {
            return f.write_str("<none>");
        }
        for (i, req) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{req}")?;
        }
        Ok(())
    }
}

impl FromStr for LabelSelector {
    type Err = StateError;

    fn from_str(s: &str) -> StateResult<Self> {
        if s.trim().is_empty() {
            return Ok(Self::everything());
        }

        let mut selector = Self::everything();
        for term in split_terms(s).map_err(|reason| invalid(s, reason))? {
            let requirement = parse_term(term.trim()).map_err(|e| match e {
                StateError::InvalidSelector { reason, .. } => invalid(s, &reason),
            })?;
            selector.requirements.push(requirement);
        }
        Ok(selector)
    }
}

/// Split on commas that are not inside a `( ... )` value set.
fn split_terms(s: &str) -> Result<Vec<&str>, &'static str> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => {
                if depth > 0 {
                    return Err("nested parentheses");
                }
                depth += 1;
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or("unbalanced parentheses")?;
            }
            ',' if depth == 0 => {
                terms.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced parentheses");
    }
    terms.push(&s[start..]);
    Ok(terms)
}

fn parse_term(term: &str) -> StateResult<Requirement> {
    if term.is_empty() {
        return Err(invalid(term, "empty requirement"));
    }

    if let Some((head, rest)) = term.split_once('(') {
        let Some(inner) = rest.trim_end().strip_suffix(')') else {
            return Err(invalid(term, "trailing characters after value set"));
        };
        let mut words = head.split_whitespace();
        let (Some(key), Some(op), None) = (words.next(), words.next(), words.next()) else {
            return Err(invalid(term, "expected `key in (...)` or `key notin (...)`"));
        };
        let operator = match op {
            "in" => Operator::In,
            "notin" => Operator::NotIn,
            other => return Err(invalid(term, &format!("unknown set operator {other:?}"))),
        };
        let values: Vec<&str> = inner.split(',').map(str::trim).collect();
        if values.iter().any(|v| v.is_empty()) {
            return Err(invalid(term, "empty value in set"));
        }
        return Requirement::new(key, operator, values);
    }

    if let Some((key, value)) = term.split_once("!=") {
        return Requirement::new(key.trim(), Operator::NotEquals, [value.trim()]);
    }
    if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
        return Requirement::new(key.trim(), Operator::Equals, [value.trim()]);
    }
    if let Some(key) = term.strip_prefix('!') {
        return Requirement::new(key.trim(), Operator::DoesNotExist, Vec::<String>::new());
    }
    Requirement::new(term, Operator::Exists, Vec::<String>::new())
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
}

fn is_valid_value(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn invalid(selector: &str, reason: &str) -> StateError {
    StateError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn everything_matches_any_labels() {
        let sel = LabelSelector::everything();
        assert!(sel.is_everything());
        assert!(sel.matches(&Labels::new()));
        assert!(sel.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn nothing_matches_no_labels() {
        let sel = LabelSelector::nothing();
        assert!(!sel.is_everything());
        assert!(!sel.matches(&Labels::new()));
        assert!(!sel.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn equality_requires_exact_value() {
        let sel = LabelSelector::everything().with_equals("app", "web");
        assert!(sel.matches(&labels(&[("app", "web"), ("tier", "fe")])));
        assert!(!sel.matches(&labels(&[("app", "db")])));
        assert!(!sel.matches(&Labels::new()));
    }

    #[test]
    fn exists_ignores_value() {
        let sel = LabelSelector::everything().with_exists("canary");
        assert_eq!(sel.to_string(), "canary");
        assert!(sel.matches(&labels(&[("canary", "")])));
        assert!(!sel.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn negative_operators_match_missing_key() {
        let sel: LabelSelector = "app!=web,zone notin (a,b)".parse().unwrap();
        assert!(sel.matches(&Labels::new()));
        assert!(sel.matches(&labels(&[("app", "db"), ("zone", "c")])));
        assert!(!sel.matches(&labels(&[("app", "web")])));
        assert!(!sel.matches(&labels(&[("zone", "b")])));
    }

    #[test]
    fn parses_every_operator() {
        let sel: LabelSelector = "app=web, tier==fe, zone in (b, a), env notin (dev), canary, !legacy"
            .parse()
            .unwrap();

        let ops: Vec<Operator> = sel.requirements().iter().map(Requirement::operator).collect();
        assert_eq!(
            ops,
            vec![
                Operator::Equals,
                Operator::Equals,
                Operator::In,
                Operator::NotIn,
                Operator::Exists,
                Operator::DoesNotExist,
            ]
        );
        assert_eq!(sel.requirements()[2].values(), ["a", "b"]);
    }

    #[test]
    fn display_round_trips() {
        let text = "app=web,tier!=cache,zone in (a,b),env notin (dev),canary,!legacy";
        let sel: LabelSelector = text.parse().unwrap();
        assert_eq!(sel.to_string(), text);
        assert_eq!(sel.to_string().parse::<LabelSelector>().unwrap(), sel);
    }

    #[test]
    fn empty_string_parses_to_everything() {
        let sel: LabelSelector = "  ".parse().unwrap();
        assert!(sel.is_everything());
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["app=web,", "zone in (a", "zone in a,b)", "zone within (a)", "=web", "a b", "zone in ()"] {
            let err = bad.parse::<LabelSelector>().unwrap_err();
            assert!(
                matches!(&err, StateError::InvalidSelector { selector, .. } if selector == bad),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn requirement_checks_value_count() {
        assert!(Requirement::new("app", Operator::Equals, ["a", "b"]).is_err());
        assert!(Requirement::new("app", Operator::In, Vec::<String>::new()).is_err());
        assert!(Requirement::new("app", Operator::Exists, ["a"]).is_err());
        assert!(Requirement::new("app", Operator::In, ["a", "b"]).is_ok());
    }

    #[test]
    fn from_labels_requires_all_pairs() {
        let set = labels(&[("app", "web"), ("tier", "fe")]);
        let sel = LabelSelector::from_labels(&set);

        assert!(sel.matches(&set));
        assert!(!sel.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn serde_round_trip_keeps_semantics() {
        let sel: LabelSelector = "app in (web,api),!legacy".parse().unwrap();
        let json = serde_json::to_string(&sel).unwrap();
        let back: LabelSelector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sel);
        assert!(!json.contains("match_nothing"));
    }
}
