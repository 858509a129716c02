use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::view::{ApiViewSpec, OperationView, ParameterView, SchemaNode};

/// Kind tag shown next to a navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Namespace,
    Method,
    Class,
    Parameter,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Namespace => "namespace",
            TypeKind::Method => "method",
            TypeKind::Class => "class",
            TypeKind::Parameter => "parameter",
        }
    }
}

/// One node of the explorer tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NavigationItem {
    pub text: String,
    pub navigation_id: String,
    pub child_items: Vec<NavigationItem>,
    pub tags: IndexMap<String, String>,
    pub is_hidden_api: bool,
}

impl NavigationItem {
    pub fn new(text: impl Into<String>, navigation_id: String, kind: TypeKind) -> Self {
        let mut tags = IndexMap::new();
        tags.insert("TypeKind".to_string(), kind.as_str().to_string());
        Self {
            text: text.into(),
            navigation_id,
            child_items: Vec::new(),
            tags,
            is_hidden_api: false,
        }
    }

    pub fn with_children(mut self, children: Vec<NavigationItem>) -> Self {
        self.child_items = children;
        self
    }

    /// This item and all of its descendants, depth-first.
    pub fn walk(&self) -> Vec<&NavigationItem> {
        let mut out = vec![self];
        for child in &self.child_items {
            out.extend(child.walk());
        }
        out
    }
}

/// Segments leading to the current position in the view. Ids are the segments
/// joined with `-`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IteratorPath {
    segments: Vec<String>,
}

impl IteratorPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn current(&self) -> String {
        self.segments.join("-")
    }

    /// The id `segment` would get if pushed now.
    pub fn current_next(&self, segment: &str) -> String {
        if self.segments.is_empty() {
            return segment.to_string();
        }
        format!("{}-{segment}", self.current())
    }
}

pub trait Navigable {
    fn navigation_item(&self, path: &mut IteratorPath) -> NavigationItem;
}

pub const PATHS_SEGMENT: &str = "Paths";
pub const DEFINITIONS_SEGMENT: &str = "Definitions";
pub const PARAMETERS_SEGMENT: &str = "Parameters";
pub const GENERAL_SEGMENT: &str = "General";

/// Text shown for an operation: its id, or the method when it has none.
pub fn operation_label(op: &OperationView) -> String {
    op.operation_id
        .clone()
        .unwrap_or_else(|| op.method.as_str().to_string())
}

/// All operations bound to one path.
pub struct PathGroup<'a> {
    pub path: &'a str,
    pub operations: &'a [OperationView],
}

impl Navigable for PathGroup<'_> {
    fn navigation_item(&self, path: &mut IteratorPath) -> NavigationItem {
        path.push(self.path);
        let children = self
            .operations
            .iter()
            .map(|op| {
                NavigationItem::new(
                    operation_label(op),
                    path.current_next(op.method.as_str()),
                    TypeKind::Method,
                )
            })
            .collect();
        let item = NavigationItem::new(self.path, path.current(), TypeKind::Namespace)
            .with_children(children);
        path.pop();
        item
    }
}

pub struct DefinitionEntry<'a> {
    pub name: &'a str,
    pub schema: &'a SchemaNode,
}

impl Navigable for DefinitionEntry<'_> {
    fn navigation_item(&self, path: &mut IteratorPath) -> NavigationItem {
        NavigationItem::new(self.name, path.current_next(self.name), TypeKind::Class)
    }
}

pub struct ParameterEntry<'a> {
    pub name: &'a str,
    pub parameter: &'a ParameterView,
}

impl Navigable for ParameterEntry<'_> {
    fn navigation_item(&self, path: &mut IteratorPath) -> NavigationItem {
        NavigationItem::new(self.name, path.current_next(self.name), TypeKind::Parameter)
    }
}

/// A view placed under a root segment that is unique within one code file.
pub struct ViewRoot<'a> {
    pub segment: &'a str,
    pub view: &'a ApiViewSpec,
}

/// Root segment per view: the file name, with `~2`, `~3`, ... appended when an
/// earlier view already took it.
pub fn root_segments(views: &[ApiViewSpec]) -> Vec<String> {
    let mut taken = HashSet::new();
    views
        .iter()
        .map(|view| {
            let mut segment = view.file_name.clone();
            let mut n = 1;
            while !taken.insert(segment.clone()) {
                n += 1;
                segment = format!("{}~{n}", view.file_name);
            }
            segment
        })
        .collect()
}

impl Navigable for ViewRoot<'_> {
    fn navigation_item(&self, path: &mut IteratorPath) -> NavigationItem {
        path.push(self.segment);
        let mut children = Vec::new();

        if !self.view.paths.is_empty() {
            path.push(PATHS_SEGMENT);
            let groups = self
                .view
                .paths
                .iter()
                .map(|(p, ops)| {
                    PathGroup {
                        path: p,
                        operations: ops,
                    }
                    .navigation_item(path)
                })
                .collect();
            children.push(
                NavigationItem::new(PATHS_SEGMENT, path.current(), TypeKind::Namespace)
                    .with_children(groups),
            );
            path.pop();
        }

        if !self.view.definitions.is_empty() {
            path.push(DEFINITIONS_SEGMENT);
            let entries = self
                .view
                .definitions
                .iter()
                .map(|(name, schema)| DefinitionEntry { name, schema }.navigation_item(path))
                .collect();
            children.push(
                NavigationItem::new(DEFINITIONS_SEGMENT, path.current(), TypeKind::Namespace)
                    .with_children(entries),
            );
            path.pop();
        }

        if !self.view.global_parameters.is_empty() {
            path.push(PARAMETERS_SEGMENT);
            let entries = self
                .view
                .global_parameters
                .iter()
                .map(|(name, parameter)| ParameterEntry { name, parameter }.navigation_item(path))
                .collect();
            children.push(
                NavigationItem::new(PARAMETERS_SEGMENT, path.current(), TypeKind::Namespace)
                    .with_children(entries),
            );
            path.pop();
        }

        let item = NavigationItem::new(
            self.view.file_name.as_str(),
            path.current(),
            TypeKind::Namespace,
        )
        .with_children(children);
        path.pop();
        item
    }
}

impl Navigable for ApiViewSpec {
    fn navigation_item(&self, path: &mut IteratorPath) -> NavigationItem {
        ViewRoot {
            segment: &self.file_name,
            view: self,
        }
        .navigation_item(path)
    }
}
