//! Entity records returned by the audit management API.
//!
//! Only the fields the client actually uses are modelled; anything else the
//! server sends is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// The kind of entity a record or search hit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An audit engagement.
    Audit,
    /// A finding raised during an audit.
    Finding,
    /// A customer organization.
    Organization,
    /// A project grouping audits.
    Project,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audit => write!(f, "audit"),
            Self::Finding => write!(f, "finding"),
            Self::Organization => write!(f, "organization"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// Lifecycle status of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Scoping and scheduling.
    Planning,
    /// Fieldwork underway.
    InProgress,
    /// Closed out.
    Completed,
    /// Abandoned.
    Cancelled,
}

/// An audit engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    /// Identifier, unique among audits.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Standard the audit is performed against (e.g. `ISO 27001`).
    #[serde(default)]
    pub standard: String,
    /// Current lifecycle status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AuditStatus>,
    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
}

/// A finding raised during an audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier, unique among findings.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Severity label as sent by the server (`critical`, `high`, ...).
    #[serde(default)]
    pub severity: String,
    /// Creation timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Identifier, unique among organizations.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Industry sector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Logo shown next to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Whether the organization is active. Absent on older servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Fields sent when creating or updating an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInput {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Logo shown next to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl OrganizationInput {
    /// Input carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A project grouping audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Identifier, unique among projects.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Common view over the four searchable record types.
///
/// Each implementor names its kind, its display labels, and the fields a
/// search query is matched against.
pub trait Searchable {
    /// The kind tag used in search results.
    const KIND: EntityKind;

    /// Identifier within the record's own collection.
    fn id(&self) -> i64;

    /// Primary display label.
    fn title(&self) -> &str;

    /// Secondary display label, if any.
    fn subtitle(&self) -> Option<&str>;

    /// Fields a query is matched against. Absent fields are `None`.
    fn search_fields(&self) -> Vec<Option<&str>>;
}

impl Searchable for Audit {
    const KIND: EntityKind = EntityKind::Audit;

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn subtitle(&self) -> Option<&str> {
        Some(&self.standard)
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name), self.description.as_deref()]
    }
}

impl Searchable for Finding {
    const KIND: EntityKind = EntityKind::Finding;

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn subtitle(&self) -> Option<&str> {
        Some(&self.severity)
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.title), self.description.as_deref()]
    }
}

impl Searchable for Organization {
    const KIND: EntityKind = EntityKind::Organization;

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn subtitle(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name)]
    }
}

impl Searchable for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn subtitle(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name)]
    }
}
