use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Catalog entry describing a reusable block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub id: String,
    pub name: String,
    pub category: ComponentCategory,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub props: BTreeMap<String, PropDefinition>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ComponentDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ComponentCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: description.into(),
            api_provider: None,
            api_endpoint: None,
            props: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_api(mut self, provider: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.api_provider = Some(provider.into());
        self.api_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, prop: PropDefinition) -> Self {
        self.props.insert(name.into(), prop);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Names of props marked as required.
    pub fn required_props(&self) -> impl Iterator<Item = &str> {
        self.props
            .iter()
            .filter(|(_, p)| p.required)
            .map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Auth,
    Data,
    Payment,
    Notification,
    Layout,
    Form,
}

impl std::str::FromStr for ComponentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "data" => Ok(Self::Data),
            "payment" => Ok(Self::Payment),
            "notification" => Ok(Self::Notification),
            "layout" => Ok(Self::Layout),
            "form" => Ok(Self::Form),
            other => Err(format!("unknown component category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDefinition {
    #[serde(rename = "type")]
    pub kind: PropType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropDefinition {
    pub fn required(kind: PropType, description: impl Into<String>) -> Self {
        Self {
            kind,
            required: true,
            default: None,
            description: Some(description.into()),
        }
    }

    pub fn optional(kind: PropType, description: impl Into<String>) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            description: Some(description.into()),
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Resolves a step's component id to its descriptor.
pub trait ComponentCatalog: Send + Sync {
    fn get(&self, component_id: &str) -> Option<Arc<ComponentDescriptor>>;

    fn contains(&self, component_id: &str) -> bool {
        self.get(component_id).is_some()
    }
}

impl<F> ComponentCatalog for F
where
    F: Fn(&str) -> Option<Arc<ComponentDescriptor>> + Send + Sync,
{
    fn get(&self, component_id: &str) -> Option<Arc<ComponentDescriptor>> {
        self(component_id)
    }
}
