//! Composite schema configuration and the request data it applies to.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::SectionSchema;

/// A request data grouping validated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Body,
    Params,
    Query,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Body, Section::Params, Section::Query];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Params => "params",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The schemas configured for one route: at most one per section.
///
/// Sections left as `None` are neither read nor modified by validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    pub body: Option<Arc<SectionSchema>>,
    pub params: Option<Arc<SectionSchema>>,
    pub query: Option<Arc<SectionSchema>>,
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, schema: SectionSchema) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    pub fn with_params(mut self, schema: SectionSchema) -> Self {
        self.params = Some(Arc::new(schema));
        self
    }

    pub fn with_query(mut self, schema: SectionSchema) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    pub fn get(&self, section: Section) -> Option<&SectionSchema> {
        match section {
            Section::Body => self.body.as_deref(),
            Section::Params => self.params.as_deref(),
            Section::Query => self.query.as_deref(),
        }
    }

    pub fn has(&self, section: Section) -> bool {
        self.get(section).is_some()
    }

    /// Configured sections in body, params, query order.
    pub fn sections(&self) -> impl Iterator<Item = (Section, &SectionSchema)> {
        Section::ALL
            .into_iter()
            .filter_map(|section| self.get(section).map(|schema| (section, schema)))
    }

    pub fn is_empty(&self) -> bool {
        self.sections().next().is_none()
    }
}

/// The three data sections of an inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSections {
    pub body: Value,
    pub params: Value,
    pub query: Value,
}

impl Default for RequestSections {
    fn default() -> Self {
        Self {
            body: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
        }
    }
}

impl RequestSections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    pub fn get(&self, section: Section) -> &Value {
        match section {
            Section::Body => &self.body,
            Section::Params => &self.params,
            Section::Query => &self.query,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut Value {
        match section {
            Section::Body => &mut self.body,
            Section::Params => &mut self.params,
            Section::Query => &mut self.query,
        }
    }
}
