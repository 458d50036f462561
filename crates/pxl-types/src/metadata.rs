//! Metadata keys and their properties
//!
//! A metadata key (e.g. `pod_name`) names a column that is not stored in
//! any table but can be derived at execution time from a key column that is
//! (e.g. `upid`). Resolved metadata columns are materialized under a
//! reserved name prefix so they can never collide with user columns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DataType;

/// Prefix of the columns metadata resolves to
pub const METADATA_COLUMN_PREFIX: &str = "_attr_";

/// Kind of metadata a property describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataType {
    Upid,
    ContainerId,
    ContainerName,
    PodId,
    PodName,
    ServiceId,
    ServiceName,
    Namespace,
    NodeName,
    Hostname,
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upid => "upid",
            Self::ContainerId => "container_id",
            Self::ContainerName => "container_name",
            Self::PodId => "pod_id",
            Self::PodName => "pod_name",
            Self::ServiceId => "service_id",
            Self::ServiceName => "service_name",
            Self::Namespace => "namespace",
            Self::NodeName => "node_name",
            Self::Hostname => "hostname",
        };
        f.write_str(name)
    }
}

/// Expected textual shape of literals compared against a metadata column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataFormat {
    /// Any string
    Plain,
    /// `<namespace>/<name>`
    NamespacePrefixed,
}

impl MetadataFormat {
    pub fn validate(&self, value: &str) -> bool {
        match self {
            Self::Plain => true,
            Self::NamespacePrefixed => match value.split_once('/') {
                Some((ns, name)) => !ns.is_empty() && !name.is_empty() && !name.contains('/'),
                None => false,
            },
        }
    }

    pub fn example(&self) -> &'static str {
        match self {
            Self::Plain => "<value>",
            Self::NamespacePrefixed => "<namespace>/<name>",
        }
    }
}

/// How one metadata column is obtained from an existing key column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConversion {
    /// Column that must exist in the parent relation
    pub key_column: String,
    /// Registry function converting the key column into this metadata
    pub function: String,
}

/// Description of a metadata key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataProperty {
    /// Canonical key name
    pub name: String,
    /// Metadata kind
    pub metadata_type: MetadataType,
    /// Type of the materialized column
    pub column_type: DataType,
    /// Literal shape accepted in comparisons
    pub format: MetadataFormat,
    /// Key columns it can be derived from, in preference order
    pub conversions: Vec<KeyConversion>,
}

impl MetadataProperty {
    pub fn new(name: impl Into<String>, metadata_type: MetadataType, column_type: DataType) -> Self {
        Self {
            name: name.into(),
            metadata_type,
            column_type,
            format: MetadataFormat::Plain,
            conversions: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: MetadataFormat) -> Self {
        self.format = format;
        self
    }

    pub fn converted_from(mut self, key_column: impl Into<String>, function: impl Into<String>) -> Self {
        self.conversions.push(KeyConversion {
            key_column: key_column.into(),
            function: function.into(),
        });
        self
    }

    /// Name of the column this property materializes into
    pub fn column_name(&self) -> String {
        self.prefixed_name(METADATA_COLUMN_PREFIX)
    }

    /// Column name under a custom reserved prefix
    pub fn prefixed_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.name)
    }

    /// Key columns this property can be derived from
    pub fn key_columns(&self) -> impl Iterator<Item = &str> {
        self.conversions.iter().map(|c| c.key_column.as_str())
    }
}

/// Metadata key registry
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    properties: IndexMap<String, MetadataProperty>,
    aliases: IndexMap<String, String>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard Kubernetes metadata keys
    pub fn standard() -> Self {
        let mut reg = Self::new();
        reg.register(MetadataProperty::new("upid", MetadataType::Upid, DataType::Uint128));
        reg.register(
            MetadataProperty::new("container_id", MetadataType::ContainerId, DataType::String)
                .converted_from("upid", "upid_to_container_id"),
        );
        reg.register(
            MetadataProperty::new("container_name", MetadataType::ContainerName, DataType::String)
                .converted_from("upid", "upid_to_container_name"),
        );
        reg.register(
            MetadataProperty::new("pod_id", MetadataType::PodId, DataType::String)
                .converted_from("upid", "upid_to_pod_id"),
        );
        reg.register(
            MetadataProperty::new("pod_name", MetadataType::PodName, DataType::String)
                .with_format(MetadataFormat::NamespacePrefixed)
                .converted_from("upid", "upid_to_pod_name"),
        );
        reg.register(
            MetadataProperty::new("service_id", MetadataType::ServiceId, DataType::String)
                .converted_from("upid", "upid_to_service_id"),
        );
        reg.register(
            MetadataProperty::new("service_name", MetadataType::ServiceName, DataType::String)
                .with_format(MetadataFormat::NamespacePrefixed)
                .converted_from("upid", "upid_to_service_name"),
        );
        reg.register(
            MetadataProperty::new("namespace", MetadataType::Namespace, DataType::String)
                .converted_from("upid", "upid_to_namespace"),
        );
        reg.register(
            MetadataProperty::new("node_name", MetadataType::NodeName, DataType::String)
                .converted_from("upid", "upid_to_node_name"),
        );
        reg.register(
            MetadataProperty::new("hostname", MetadataType::Hostname, DataType::String)
                .converted_from("upid", "upid_to_hostname"),
        );
        reg.alias("pod", "pod_name");
        reg.alias("service", "service_name");
        reg.alias("container", "container_name");
        reg.alias("node", "node_name");
        reg
    }

    /// Register a property under its canonical name
    pub fn register(&mut self, property: MetadataProperty) {
        self.properties.insert(property.name.clone(), property);
    }

    /// Register an alternative key for a canonical name
    pub fn alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Find a property by canonical name or alias
    pub fn lookup(&self, key: &str) -> Option<&MetadataProperty> {
        self.properties.get(key).or_else(|| {
            self.aliases
                .get(key)
                .and_then(|canonical| self.properties.get(canonical))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Canonical key names, in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}
