use indexmap::IndexMap;
use serde::Serialize;

use crate::parse::schema::XmsEnum;

/// Metadata carried by every schema node regardless of its kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SchemaMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub read_only: bool,
    pub write_only: bool,
    /// `x-ms-nullable`
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<String>,
}

/// Which composition keyword produced a [`SchemaKind::Composition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompositionKind {
    AllOf,
    AnyOf,
    OneOf,
}

impl CompositionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionKind::AllOf => "allOf",
            CompositionKind::AnyOf => "anyOf",
            CompositionKind::OneOf => "oneOf",
        }
    }
}

/// The shape of a resolved schema. Each variant carries only what that shape
/// needs, so an array always has items and a marker never has properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaKind {
    /// A scalar, or an object without properties.
    Primitive { type_name: String },
    Object {
        properties: IndexMap<String, SchemaNode>,
        required: Vec<String>,
    },
    Array { items: Box<SchemaNode> },
    /// `allOf`/`anyOf`/`oneOf`. `properties` is the merged property bag of all
    /// members followed by the composing schema's own properties.
    Composition {
        composition: CompositionKind,
        members: Vec<String>,
        properties: IndexMap<String, SchemaNode>,
        required: Vec<String>,
    },
    Enum {
        base_type: String,
        values: Vec<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ms_enum: Option<XmsEnum>,
    },
    /// A reference that was not expanded because its target is already on the
    /// current resolution path.
    Reference { name: String },
}

/// One node of a resolved schema tree. Cycles in the source graph are cut by
/// [`SchemaKind::Reference`] markers, so the tree is always finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaNode {
    /// Definition name when this node was reached through a `$ref`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(flatten)]
    pub meta: SchemaMeta,
    #[serde(flatten)]
    pub kind: SchemaKind,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            ref_name: None,
            meta: SchemaMeta::default(),
            kind,
        }
    }

    pub fn primitive(type_name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Primitive {
            type_name: type_name.into(),
        })
    }

    /// An unexpanded reference marker for the named definition.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Reference { name: name.into() })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, SchemaKind::Reference { .. })
    }

    /// Own or merged properties together with the required list that applies
    /// to them.
    pub fn properties(&self) -> Option<(&IndexMap<String, SchemaNode>, &[String])> {
        match &self.kind {
            SchemaKind::Object {
                properties,
                required,
            }
            | SchemaKind::Composition {
                properties,
                required,
                ..
            } => Some((properties, required.as_slice())),
            _ => None,
        }
    }

    pub fn into_properties(self) -> Option<(IndexMap<String, SchemaNode>, Vec<String>)> {
        match self.kind {
            SchemaKind::Object {
                properties,
                required,
            }
            | SchemaKind::Composition {
                properties,
                required,
                ..
            } => Some((properties, required)),
            _ => None,
        }
    }

    pub fn has_properties(&self) -> bool {
        self.properties().is_some_and(|(props, _)| !props.is_empty())
    }

    /// Whether the flattener should give this node its own model section when
    /// it appears as an array item.
    pub fn is_expandable(&self) -> bool {
        self.has_properties() || matches!(self.kind, SchemaKind::Array { .. })
    }

    /// The bare JSON type of the node.
    pub fn base_type(&self) -> &str {
        match &self.kind {
            SchemaKind::Primitive { type_name } => type_name.as_str(),
            SchemaKind::Object { .. } | SchemaKind::Composition { .. } => "object",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Enum { base_type, .. } => base_type.as_str(),
            SchemaKind::Reference { name } => name.as_str(),
        }
    }

    /// The name used when this node appears inside another type, e.g. the
    /// `Pet` in `array<Pet>`.
    pub fn type_name(&self) -> &str {
        match (&self.ref_name, &self.kind) {
            (Some(name), _) | (None, SchemaKind::Reference { name }) => name.as_str(),
            (None, _) => self.base_type(),
        }
    }

    /// Display text for the Type/Format column.
    pub fn type_format(&self) -> String {
        if let SchemaKind::Array { items } = &self.kind {
            return format!("array<{}>", items.type_name());
        }
        let format = self
            .meta
            .format
            .as_deref()
            .map(|f| format!("/{f}"))
            .unwrap_or_default();
        match (&self.ref_name, &self.kind) {
            (Some(name), _) | (None, SchemaKind::Reference { name }) => format!("{name}{format}"),
            (None, SchemaKind::Enum { base_type, .. }) if base_type == "string" => {
                "enum<string>".to_string()
            }
            // `allOf: [$ref X]` wrappers read as the wrapped type.
            (
                None,
                SchemaKind::Composition {
                    members,
                    properties,
                    ..
                },
            ) if members.len() == 1 && properties.is_empty() => format!("{}{format}", members[0]),
            (None, _) => format!("{}{format}", self.base_type()),
        }
    }

    /// Keywords contributed by the node itself, in display order.
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords = Vec::new();
        if self.meta.read_only {
            keywords.push("readOnly".to_string());
        }
        if self.meta.write_only {
            keywords.push("writeOnly".to_string());
        }
        if self.meta.nullable {
            keywords.push("x-ms-nullable".to_string());
        }
        if let SchemaKind::Enum {
            values, ms_enum, ..
        } = &self.kind
        {
            if !values.is_empty() {
                let rendered: Vec<String> = values.iter().map(enum_value_text).collect();
                keywords.push(format!("enum: [{}]", rendered.join(",")));
            }
            if let Some(ms_enum) = ms_enum {
                keywords.push(ms_enum.to_keywords());
            }
        }
        keywords
    }
}

fn enum_value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(props: &[(&str, SchemaNode)], required: &[&str]) -> SchemaNode {
        SchemaNode::new(SchemaKind::Object {
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            required: required.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_type_format_primitive_with_format() {
        let mut node = SchemaNode::primitive("integer");
        node.meta.format = Some("int64".to_string());
        assert_eq!(node.type_format(), "integer/int64");
    }

    #[test]
    fn test_type_format_named_and_array() {
        let mut pet = object(&[("name", SchemaNode::primitive("string"))], &[]);
        pet.ref_name = Some("Pet".to_string());
        assert_eq!(pet.type_format(), "Pet");

        let list = SchemaNode::new(SchemaKind::Array {
            items: Box::new(pet),
        });
        assert_eq!(list.type_format(), "array<Pet>");

        let strings = SchemaNode::new(SchemaKind::Array {
            items: Box::new(SchemaNode::primitive("string")),
        });
        assert_eq!(strings.type_format(), "array<string>");
    }

    #[test]
    fn test_type_format_marker_and_enum() {
        assert_eq!(SchemaNode::reference("Node").type_format(), "Node");
        let status = SchemaNode::new(SchemaKind::Enum {
            base_type: "string".to_string(),
            values: vec!["a".into(), "b".into()],
            ms_enum: None,
        });
        assert_eq!(status.type_format(), "enum<string>");
        assert_eq!(status.keywords(), vec!["enum: [a,b]".to_string()]);
    }

    #[test]
    fn test_keywords_order() {
        let mut node = SchemaNode::new(SchemaKind::Enum {
            base_type: "integer".to_string(),
            values: vec![1.into(), 2.into()],
            ms_enum: Some(XmsEnum {
                name: "Level".to_string(),
                model_as_string: false,
                values: Vec::new(),
            }),
        });
        node.meta.read_only = true;
        node.meta.nullable = true;
        assert_eq!(
            node.keywords(),
            vec![
                "readOnly".to_string(),
                "x-ms-nullable".to_string(),
                "enum: [1,2]".to_string(),
                "x-ms-enum: Level, modelAsString: false".to_string(),
            ]
        );
    }

    #[test]
    fn test_expandable() {
        assert!(!SchemaNode::primitive("string").is_expandable());
        assert!(!SchemaNode::reference("Node").is_expandable());
        assert!(!object(&[], &[]).is_expandable());
        assert!(object(&[("a", SchemaNode::primitive("string"))], &[]).is_expandable());
    }
}
