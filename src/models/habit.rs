// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit and todo models.
//!
//! Recurrence rules serialize to their canonical RFC 5545 string form and
//! are parsed back into [`RRuleSet`] values on read, so a cached or synced
//! habit always revives with a working rule object.

use chrono::{DateTime, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A recurring activity occurrence governed by a recurrence rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct Habit {
    pub id: String,
    pub activity_id: String,
    /// When true, a missed due day counts as a negative occurrence.
    #[serde(default)]
    pub neglection: bool,
    #[serde(with = "rule_string")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub rule: RRuleSet,
    #[serde(default, with = "opt_rule_string", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub reminder: Option<RRuleSet>,
    /// Overrides cached from creation time; used when the referenced
    /// activity has been deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A one-shot activity occurrence with a due timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct Todo {
    pub id: String,
    pub activity_id: String,
    #[serde(default)]
    pub neglection: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub due: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Serde adapter: recurrence rule <-> canonical string.
pub mod rule_string {
    use rrule::RRuleSet;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(rule: &RRuleSet, serializer: S) -> Result<S::Ok, S::Error> {
        rule.to_string().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RRuleSet, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<RRuleSet>().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional recurrence rules.
pub mod opt_rule_string {
    use rrule::RRuleSet;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        rule: &Option<RRuleSet>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        rule.as_ref().map(|r| r.to_string()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RRuleSet>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => raw
                .parse::<RRuleSet>()
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
