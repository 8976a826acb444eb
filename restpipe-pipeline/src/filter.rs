//! Read filters.

use restpipe_http::Url;
use restpipe_types::IdentityPart;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Limits and constraints applied to a read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadFilter {
    /// Maximum number of records to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Number of records to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Field constraints, sent as query parameters.
    #[serde(default, rename = "where", skip_serializing_if = "Map::is_empty")]
    pub where_clause: Map<String, Value>,
}

impl ReadFilter {
    /// An empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Adds a field constraint.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_clause.insert(field.into(), value.into());
        self
    }

    /// Whether the filter constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none() && self.where_clause.is_empty()
    }

    /// Query parameters in a stable order: `limit`, `offset`, then
    /// constraints by field name. String values are sent bare, everything
    /// else as JSON.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        for (field, value) in &self.where_clause {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            pairs.push((field.clone(), rendered));
        }
        pairs
    }

    /// Appends the query parameters to `url`.
    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut query = url.query_pairs_mut();
        for (key, value) in self.query_pairs() {
            query.append_pair(&key, &value);
        }
    }
}

impl From<&ReadFilter> for IdentityPart {
    fn from(filter: &ReadFilter) -> Self {
        IdentityPart::Seq(vec![
            IdentityPart::from(filter.limit),
            IdentityPart::from(filter.offset),
            IdentityPart::from(&Value::Object(filter.where_clause.clone())),
        ])
    }
}
