//! Caller directives: column renames, type overrides, member property
//! extraction and query parameters.
//!
//! A directive whose name starts with `~` is a column mapping rule:
//!
//! - `~2` renames the column at output position 2 (ordinal rule)
//! - `~[Measures].[Score]` renames the column built from that unique or
//!   level name (name rule)
//! - `~[Store].[Store].[Store]##UniqueName##` adds a column holding the
//!   unique name of the member at that level (property rule); the base may
//!   also be a member position, as in `~1##Caption##`
//!
//! Everything else is a text substitution parameter for the query.

pub mod parameter;

use crate::axis::Member;
use crate::schema::ColumnType;
use log::debug;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use thiserror::Error;

pub use parameter::{substitute, Parameter, PARAMETER_MARKER};

pub const RENAME_MARKER: char = '~';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Mapping rules {rules:?} all match column {column:?}")]
    Ambiguous { column: String, rules: Vec<String> },
}

/// A (selector, value, optional type) triple supplied alongside the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub value: String,
    pub column_type: Option<ColumnType>,
}

impl Directive {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Directive {
            name: name.into(),
            value: value.to_string(),
            column_type: None,
        }
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }
}

impl<'de> Deserialize<'de> for Directive {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DirectiveHelper {
            name: String,
            value: serde_json::Value,
            #[serde(rename = "type")]
            column_type: Option<String>,
        }

        let helper = DirectiveHelper::deserialize(deserializer)?;
        let value = match helper.value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        let column_type = helper
            .column_type
            .map(|t| ColumnType::from_str(&t))
            .transpose()
            .map_err(serde::de::Error::custom)?;

        Ok(Directive {
            name: helper.name,
            value,
            column_type,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyToken {
    Caption,
    LevelName,
    UniqueName,
    LevelNumber,
}

impl PropertyToken {
    const ALL: [(PropertyToken, &'static str); 4] = [
        (PropertyToken::Caption, "##Caption##"),
        (PropertyToken::LevelName, "##LevelName##"),
        (PropertyToken::UniqueName, "##UniqueName##"),
        (PropertyToken::LevelNumber, "##LevelNumber##"),
    ];

    /// Splits a trailing token off a selector, ignoring case.
    pub fn split(selector: &str) -> Option<(&str, PropertyToken)> {
        Self::ALL.iter().find_map(|(token, text)| {
            let at = selector.len().checked_sub(text.len())?;
            let suffix = selector.get(at..)?;
            suffix
                .eq_ignore_ascii_case(text)
                .then(|| (&selector[..at], *token))
        })
    }

    pub fn default_type(&self) -> ColumnType {
        match self {
            PropertyToken::LevelNumber => ColumnType::Int32,
            _ => ColumnType::String,
        }
    }

    /// Raw text of this member field, `None` when the server did not send it.
    pub fn extract(&self, member: &Member) -> Option<String> {
        match self {
            PropertyToken::Caption => Some(member.caption.clone()),
            PropertyToken::LevelName => Some(member.level_name.clone()),
            PropertyToken::UniqueName => Some(member.unique_name.clone()),
            PropertyToken::LevelNumber => member.level_number.map(|n| n.to_string()),
        }
    }
}

/// Which member of a row tuple a property rule reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSelector {
    Position(usize),
    Level(String),
}

impl MemberSelector {
    fn parse(base: &str) -> Self {
        match base.parse::<usize>() {
            Ok(position) => MemberSelector::Position(position),
            Err(_) => MemberSelector::Level(base.to_string()),
        }
    }

    pub fn matches(&self, position: usize, member: &Member) -> bool {
        match self {
            MemberSelector::Position(p) => *p == position,
            MemberSelector::Level(level) => member.level_name == *level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRule {
    pub member: MemberSelector,
    pub token: PropertyToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Ordinal(usize),
    Name(String),
    Property(PropertyRule),
}

impl Selector {
    pub fn parse(text: &str) -> Self {
        if let Some((base, token)) = PropertyToken::split(text) {
            return Selector::Property(PropertyRule {
                member: MemberSelector::parse(base),
                token,
            });
        }
        match text.parse::<usize>() {
            Ok(ordinal) => Selector::Ordinal(ordinal),
            Err(_) => Selector::Name(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    /// Selector text without the rename marker.
    pub text: String,
    pub selector: Selector,
    pub target: String,
    pub column_type: Option<ColumnType>,
}

impl MappingRule {
    pub fn property(&self) -> Option<&PropertyRule> {
        match &self.selector {
            Selector::Property(rule) => Some(rule),
            _ => None,
        }
    }
}

/// The structural identity of a column, as seen by rule matching.
#[derive(Debug, Clone, Copy)]
pub struct ColumnIdentity<'a> {
    /// Hierarchy level, property or tuple unique name the column came from.
    pub underlying: &'a str,
    pub default_name: &'a str,
    pub ordinal: usize,
}

/// Outcome of matching the rule set against one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub name: Option<String>,
    pub column_type: Option<ColumnType>,
    /// Indices of every rule that matched, for bookkeeping.
    pub matched: Vec<usize>,
}

/// Resolved mapping rules for one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    rules: Vec<MappingRule>,
}

impl ColumnMapping {
    pub fn new(rules: Vec<MappingRule>) -> Self {
        let mut unique: Vec<MappingRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if !unique.contains(&rule) {
                unique.push(rule);
            }
        }
        ColumnMapping { rules: unique }
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Property rules in the order they were supplied, with their index.
    pub fn property_rules(&self) -> impl Iterator<Item = (usize, &MappingRule, &PropertyRule)> {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| rule.property().map(|p| (index, rule, p)))
    }

    /// Matches the rules against one column.
    ///
    /// Name rules win over value rules (a rule whose target already equals
    /// the default name), which win over ordinal rules. Within the value and
    /// ordinal tiers the first rule supplied wins; two name rules for one
    /// column is an error. The explicit type comes from the first tier
    /// winner, in tier order, that carries one.
    pub fn resolve(&self, column: ColumnIdentity<'_>) -> Result<Resolution, MappingError> {
        let name_tier = self.matching(|rule| match &rule.selector {
            Selector::Name(name) => name == column.underlying || name == column.default_name,
            Selector::Property(_) => rule.text == column.underlying,
            Selector::Ordinal(_) => false,
        });
        if name_tier.len() > 1 {
            return Err(MappingError::Ambiguous {
                column: column.default_name.to_string(),
                rules: name_tier.iter().map(|&i| self.rules[i].text.clone()).collect(),
            });
        }
        let value_tier = self.matching(|rule| {
            rule.property().is_none() && rule.target == column.default_name
        });
        let ordinal_tier = self.matching(|rule| rule.selector == Selector::Ordinal(column.ordinal));

        let mut resolution = Resolution::default();
        for tier in [&name_tier, &value_tier, &ordinal_tier] {
            if let Some(&winner) = tier.first() {
                let rule = &self.rules[winner];
                if resolution.name.is_none() {
                    resolution.name = Some(rule.target.clone());
                }
                if resolution.column_type.is_none() {
                    resolution.column_type = rule.column_type;
                }
            }
            for &index in tier.iter() {
                if !resolution.matched.contains(&index) {
                    resolution.matched.push(index);
                }
            }
        }

        Ok(resolution)
    }

    fn matching<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&MappingRule) -> bool,
    {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| predicate(rule))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Splits caller directives into column mapping rules and query parameters.
pub fn resolve_directives(directives: &[Directive]) -> (ColumnMapping, Vec<Parameter>) {
    let mut rules = Vec::new();
    let mut parameters = Vec::new();

    for directive in directives {
        match directive.name.strip_prefix(RENAME_MARKER) {
            Some(text) => {
                let selector = Selector::parse(text);
                debug!("Column mapping rule {:?} -> {:?}", selector, directive.value);
                rules.push(MappingRule {
                    text: text.to_string(),
                    selector,
                    target: directive.value.clone(),
                    column_type: directive.column_type,
                });
            }
            None => parameters.push(Parameter {
                name: directive.name.clone(),
                value: directive.value.clone(),
            }),
        }
    }

    (ColumnMapping::new(rules), parameters)
}
