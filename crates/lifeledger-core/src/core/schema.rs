// crates/lifeledger-core/src/core/schema.rs
// ============================================================================
// Module: Lifeledger Schema Model
// Description: Dataset descriptors and field definitions.
// Purpose: Describe datasets, their ordered fields, and relational policies.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A dataset is declared by a [`DatasetDefinition`]: an id, a display name, a
//! kind, and an ordered list of [`FieldDefinition`]s. Field definitions carry
//! the relational semantics the storage engine does not understand natively:
//! uniqueness, relation targets, and delete policies.
//!
//! A field is a relation field iff `isRelation` is set and both
//! `relatedDataset` and `relatedField` are non-empty. Its payload value is a
//! record identifier in the related dataset, read as a typed [`Reference`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::DatasetId;
use crate::core::identifiers::FieldKey;
use crate::core::identifiers::IdentifierError;
use crate::core::identifiers::RecordId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dataset definition validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Dataset name is empty.
    #[error("dataset {0} has an empty name")]
    EmptyName(DatasetId),
    /// Two fields share the same key.
    #[error("dataset {dataset} declares field {key} more than once")]
    DuplicateFieldKey {
        /// Dataset identifier.
        dataset: DatasetId,
        /// Repeated field key.
        key: FieldKey,
    },
    /// A field sets both delete policies.
    #[error(
        "field {key} on dataset {dataset} cannot set both preventDeleteIfReferenced and \
         cascadeDeleteIfReferenced"
    )]
    ConflictingDeletePolicies {
        /// Dataset identifier.
        dataset: DatasetId,
        /// Offending field key.
        key: FieldKey,
    },
    /// A delete policy is set on a field that is not a relation field.
    #[error("field {key} on dataset {dataset} sets a delete policy but is not a relation field")]
    PolicyWithoutRelation {
        /// Dataset identifier.
        dataset: DatasetId,
        /// Offending field key.
        key: FieldKey,
    },
    /// A relation field is missing its target dataset or field.
    #[error("field {key} on dataset {dataset} is a relation without relatedDataset/relatedField")]
    IncompleteRelation {
        /// Dataset identifier.
        dataset: DatasetId,
        /// Offending field key.
        key: FieldKey,
    },
    /// A relation field names a malformed target dataset.
    #[error("field {key} on dataset {dataset} relates to an invalid dataset: {source}")]
    InvalidRelatedDataset {
        /// Dataset identifier.
        dataset: DatasetId,
        /// Offending field key.
        key: FieldKey,
        /// Identifier parse failure.
        source: IdentifierError,
    },
}

// ============================================================================
// SECTION: Dataset Kinds
// ============================================================================

/// Kind of data a dataset tracks.
///
/// # Invariants
/// - Unknown labels round-trip unchanged through [`DatasetType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatasetType {
    /// Body composition scans.
    Dexa,
    /// Lab results.
    Bloodwork,
    /// Self-experiments.
    Experiment,
    /// Generic metrics.
    Metric,
    /// Daily logs.
    DailyLog,
    /// Journal entries.
    Journaling,
    /// Time tracking entries.
    TimeTracking,
    /// Todo items.
    Todo,
    /// Contacts and meetings.
    PeopleCrm,
    /// Financial entries.
    Finance,
    /// Habit tracking.
    Habit,
    /// Any other caller-defined kind.
    Custom(String),
}

impl DatasetType {
    /// Returns the wire label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dexa => "dexa",
            Self::Bloodwork => "bloodwork",
            Self::Experiment => "experiment",
            Self::Metric => "metric",
            Self::DailyLog => "daily_log",
            Self::Journaling => "journaling",
            Self::TimeTracking => "time_tracking",
            Self::Todo => "todo",
            Self::PeopleCrm => "people_crm",
            Self::Finance => "finance",
            Self::Habit => "habit",
            Self::Custom(label) => label,
        }
    }
}

impl From<String> for DatasetType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "dexa" => Self::Dexa,
            "bloodwork" => Self::Bloodwork,
            "experiment" => Self::Experiment,
            "metric" => Self::Metric,
            "daily_log" => Self::DailyLog,
            "journaling" => Self::Journaling,
            "time_tracking" => Self::TimeTracking,
            "todo" => Self::Todo,
            "people_crm" => Self::PeopleCrm,
            "finance" => Self::Finance,
            "habit" => Self::Habit,
            _ => Self::Custom(label),
        }
    }
}

impl From<&str> for DatasetType {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<DatasetType> for String {
    fn from(value: DatasetType) -> Self {
        match value {
            DatasetType::Custom(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Field Types
// ============================================================================

/// Declared type of a field. Payload values are not checked against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Calendar date or date-time text.
    Date,
    /// Boolean flag.
    Boolean,
    /// Numeric value.
    Number,
    /// Percentage value.
    Percentage,
    /// Plain text.
    Text,
    /// Markdown text.
    Markdown,
    /// Single file path.
    File,
    /// List of file paths.
    FileMultiple,
    /// Single image path.
    Image,
    /// List of image paths.
    ImageMultiple,
    /// One option out of a fixed set.
    SelectSingle,
    /// Several options out of a fixed set.
    SelectMultiple,
    /// Free text with suggestions.
    Autocomplete,
    /// List of tags.
    Tags,
    /// Arbitrary JSON.
    Json,
    /// Any other label.
    Other(String),
}

impl FieldType {
    /// Returns the wire label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Percentage => "percentage",
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::File => "file",
            Self::FileMultiple => "file-multiple",
            Self::Image => "image",
            Self::ImageMultiple => "image-multiple",
            Self::SelectSingle => "select-single",
            Self::SelectMultiple => "select-multiple",
            Self::Autocomplete => "autocomplete",
            Self::Tags => "tags",
            Self::Json => "json",
            Self::Other(label) => label,
        }
    }

    /// Returns true when values of this type name blob store paths.
    #[must_use]
    pub const fn holds_files(&self) -> bool {
        matches!(self, Self::File | Self::FileMultiple | Self::Image | Self::ImageMultiple)
    }
}

impl From<String> for FieldType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "date" => Self::Date,
            "boolean" => Self::Boolean,
            "number" => Self::Number,
            "percentage" => Self::Percentage,
            "text" => Self::Text,
            "markdown" => Self::Markdown,
            "file" => Self::File,
            "file-multiple" | "file-list" => Self::FileMultiple,
            "image" => Self::Image,
            "image-multiple" => Self::ImageMultiple,
            "select-single" => Self::SelectSingle,
            "select-multiple" => Self::SelectMultiple,
            "autocomplete" => Self::Autocomplete,
            "tags" => Self::Tags,
            "json" => Self::Json,
            _ => Self::Other(label),
        }
    }
}

impl From<&str> for FieldType {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Field Definitions
// ============================================================================

/// Option offered by select-style fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Stored option value.
    pub id: String,
    /// Display label.
    pub label: String,
}

/// Delete behavior of a relation field when its target record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Deleting the target leaves referencing records untouched.
    #[default]
    None,
    /// Deleting the target fails while any referencing record exists.
    Prevent,
    /// Deleting the target first deletes every referencing record.
    Cascade,
}

/// Target of a relation field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationTarget {
    /// Dataset the field points into.
    pub dataset: DatasetId,
    /// Field of the target dataset used for display.
    pub field: String,
}

/// Typed value of a relation field read from a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Dataset holding the referenced record.
    pub dataset_id: DatasetId,
    /// Referenced record identifier.
    pub record_id: RecordId,
}

impl Reference {
    /// Reads a reference from a relation field's payload value.
    ///
    /// Absent, null, non-string, and empty values yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the value is a malformed record id.
    pub fn from_value(
        dataset_id: &DatasetId,
        value: Option<&Value>,
    ) -> Result<Option<Self>, IdentifierError> {
        let Some(Value::String(raw)) = value else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let record_id = RecordId::parse(raw.as_str())?;
        Ok(Some(Self {
            dataset_id: dataset_id.clone(),
            record_id,
        }))
    }
}

/// Declared field of a dataset.
///
/// # Invariants
/// - `key` is unique within its dataset.
/// - At most one of the two delete policy flags is set (checked by
///   [`DatasetDefinition::validate`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Payload key.
    pub key: FieldKey,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable name used in error messages.
    #[serde(default)]
    pub display_name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional unit label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Whether the field participates in search.
    #[serde(default)]
    pub is_searchable: bool,
    /// Whether the field may be left empty.
    #[serde(default)]
    pub is_optional: bool,
    /// Whether values must be unique within the dataset.
    #[serde(default)]
    pub is_unique: bool,
    /// Whether the value points at a record in another dataset.
    #[serde(default)]
    pub is_relation: bool,
    /// Target dataset for relation fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_dataset: Option<String>,
    /// Target display field for relation fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_field: Option<String>,
    /// Primary display field of the related record (UI hint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    /// Secondary display field of the related record (UI hint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_display_field: Option<String>,
    /// Block deletion of the target while referenced.
    #[serde(default)]
    pub prevent_delete_if_referenced: bool,
    /// Delete referencing records together with the target.
    #[serde(default)]
    pub cascade_delete_if_referenced: bool,
    /// Options for select-style fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FieldDefinition {
    /// Creates a plain field with every flag cleared.
    #[must_use]
    pub fn new(key: FieldKey, field_type: FieldType, display_name: impl Into<String>) -> Self {
        Self {
            key,
            field_type,
            display_name: display_name.into(),
            description: None,
            unit: None,
            is_searchable: false,
            is_optional: false,
            is_unique: false,
            is_relation: false,
            related_dataset: None,
            related_field: None,
            display_field: None,
            secondary_display_field: None,
            prevent_delete_if_referenced: false,
            cascade_delete_if_referenced: false,
            options: Vec::new(),
        }
    }

    /// Marks the field as unique within its dataset.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Marks the field as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Turns the field into a relation pointing at `dataset`.
    #[must_use]
    pub fn relation_to(mut self, dataset: &DatasetId, field: impl Into<String>) -> Self {
        self.is_relation = true;
        self.related_dataset = Some(dataset.to_string());
        self.related_field = Some(field.into());
        self
    }

    /// Applies a delete policy.
    #[must_use]
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.prevent_delete_if_referenced = policy == DeletePolicy::Prevent;
        self.cascade_delete_if_referenced = policy == DeletePolicy::Cascade;
        self
    }

    /// Returns the name used when reporting on this field.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() { self.key.as_str() } else { &self.display_name }
    }

    /// Returns the relation target when this is a relation field.
    #[must_use]
    pub fn relation(&self) -> Option<RelationTarget> {
        if !self.is_relation {
            return None;
        }
        let dataset = self.related_dataset.as_deref().filter(|value| !value.is_empty())?;
        let field = self.related_field.as_deref().filter(|value| !value.is_empty())?;
        let dataset = DatasetId::parse(dataset).ok()?;
        Some(RelationTarget {
            dataset,
            field: field.to_string(),
        })
    }

    /// Returns true when this is a relation field pointing at `dataset`.
    #[must_use]
    pub fn relates_to(&self, dataset: &DatasetId) -> bool {
        self.relation().is_some_and(|target| &target.dataset == dataset)
    }

    /// Returns the effective delete policy.
    ///
    /// Non-relation fields always report [`DeletePolicy::None`].
    #[must_use]
    pub fn delete_policy(&self) -> DeletePolicy {
        if self.relation().is_none() {
            return DeletePolicy::None;
        }
        if self.prevent_delete_if_referenced {
            DeletePolicy::Prevent
        } else if self.cascade_delete_if_referenced {
            DeletePolicy::Cascade
        } else {
            DeletePolicy::None
        }
    }
}

// ============================================================================
// SECTION: Datasets
// ============================================================================

/// Declared dataset: identity plus ordered field definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDefinition {
    /// Stable dataset identifier.
    pub id: DatasetId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Dataset kind.
    #[serde(rename = "type")]
    pub dataset_type: DatasetType,
    /// Ordered field definitions.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl DatasetDefinition {
    /// Validates field combinations.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] for an empty name, repeated keys, conflicting
    /// delete policies, policies on non-relation fields, and incomplete or
    /// malformed relation targets.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyName(self.id.clone()));
        }
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateFieldKey {
                    dataset: self.id.clone(),
                    key: field.key.clone(),
                });
            }
            if field.prevent_delete_if_referenced && field.cascade_delete_if_referenced {
                return Err(SchemaError::ConflictingDeletePolicies {
                    dataset: self.id.clone(),
                    key: field.key.clone(),
                });
            }
            let has_policy =
                field.prevent_delete_if_referenced || field.cascade_delete_if_referenced;
            if field.is_relation {
                let dataset = field.related_dataset.as_deref().unwrap_or_default();
                let target = field.related_field.as_deref().unwrap_or_default();
                if dataset.is_empty() || target.is_empty() {
                    return Err(SchemaError::IncompleteRelation {
                        dataset: self.id.clone(),
                        key: field.key.clone(),
                    });
                }
                DatasetId::parse(dataset).map_err(|source| {
                    SchemaError::InvalidRelatedDataset {
                        dataset: self.id.clone(),
                        key: field.key.clone(),
                        source,
                    }
                })?;
            } else if has_policy {
                return Err(SchemaError::PolicyWithoutRelation {
                    dataset: self.id.clone(),
                    key: field.key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Looks up a field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.key.as_str() == key)
    }

    /// Iterates relation fields with their targets, in declaration order.
    pub fn relation_fields(&self) -> impl Iterator<Item = (&FieldDefinition, RelationTarget)> {
        self.fields.iter().filter_map(|field| field.relation().map(|target| (field, target)))
    }

    /// Iterates fields flagged unique, in declaration order.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|field| field.is_unique)
    }
}

/// Persisted dataset descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Declared definition.
    #[serde(flatten)]
    pub definition: DatasetDefinition,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last write time.
    pub last_modified: Timestamp,
}

impl Dataset {
    /// Returns the dataset identifier.
    #[must_use]
    pub const fn id(&self) -> &DatasetId {
        &self.definition.id
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
