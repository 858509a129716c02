use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use crate::output::table::TableRow;
use crate::output::tokens::Token;
use crate::view::{CompositionKind, SchemaKind, SchemaNode};

const INDENT_STEP: usize = 2;

/// Where a flattened schema goes in the code file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SerializeContext {
    pub indent: usize,
    /// Id of the table the rows belong to.
    pub anchor: String,
}

impl SerializeContext {
    pub fn new(anchor: impl Into<String>) -> Self {
        Self {
            indent: 0,
            anchor: anchor.into(),
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// Tokens and table rows produced for one schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flattened {
    pub anchor: String,
    pub tokens: Vec<Token>,
    pub rows: Vec<TableRow>,
}

struct Pending<'a> {
    node: &'a SchemaNode,
    model: String,
    indent: usize,
}

/// Flatten a resolved schema into tokens and rows, breadth-first.
///
/// The root model is emitted first. Nested object properties and expandable
/// array items are queued and emitted as models of their own once the current
/// model is done. Named models are emitted once per call; reference markers are
/// never expanded, so the walk ends on cyclic graphs.
pub fn flatten(node: &SchemaNode, ctx: &SerializeContext) -> Flattened {
    let mut out = Flattened {
        anchor: ctx.anchor.clone(),
        ..Flattened::default()
    };
    let mut queue = VecDeque::new();
    let mut emitted: IndexSet<String> = IndexSet::new();

    queue.push_back(Pending {
        node,
        model: node.type_name().to_string(),
        indent: ctx.indent,
    });

    while let Some(next) = queue.pop_front() {
        if let Some(name) = &next.node.ref_name {
            if !emitted.insert(name.clone()) {
                continue;
            }
        }
        emit_model(&next, &mut out, &mut queue);
    }
    out
}

fn emit_model<'a>(
    pending: &Pending<'a>,
    out: &mut Flattened,
    queue: &mut VecDeque<Pending<'a>>,
) {
    let node: &'a SchemaNode = pending.node;
    let model = pending.model.as_str();
    let indent = pending.indent;

    push_indent(&mut out.tokens, indent);
    out.tokens.push(Token::type_name(model));
    out.tokens.push(Token::newline());

    let header_type = match &node.kind {
        SchemaKind::Array { .. } => node.type_format(),
        _ => node.base_type().to_string(),
    };
    out.rows.push(TableRow::new(
        model,
        "",
        header_type,
        join_keywords(node.keywords()),
        description(node),
    ));

    match &node.kind {
        SchemaKind::Object {
            properties,
            required,
        } => emit_properties(properties, required, model, indent + INDENT_STEP, out, queue),
        SchemaKind::Composition {
            composition,
            members,
            properties,
            required,
        } => {
            push_indent(&mut out.tokens, indent + INDENT_STEP);
            out.tokens.push(Token::keyword(composition.as_str()));
            out.tokens.push(Token::punct(":"));
            out.tokens.push(Token::newline());
            let nested = indent + 2 * INDENT_STEP;
            for member in members {
                push_indent(&mut out.tokens, nested);
                out.tokens.push(Token::type_name(member.as_str()));
                out.tokens.push(Token::newline());
            }
            emit_properties(properties, required, model, nested, out, queue);
        }
        SchemaKind::Array { items } => {
            push_indent(&mut out.tokens, indent + INDENT_STEP);
            emit_array_tokens(items, &mut out.tokens);
            enqueue_items(items, model, indent, queue);
        }
        SchemaKind::Enum { base_type, .. } => {
            push_indent(&mut out.tokens, indent + INDENT_STEP);
            out.tokens.push(Token::keyword("enum"));
            out.tokens.push(Token::punct("<"));
            out.tokens.push(Token::keyword(base_type.as_str()));
            out.tokens.push(Token::punct(">"));
            out.tokens.push(Token::newline());
        }
        SchemaKind::Reference { name } => {
            push_indent(&mut out.tokens, indent + INDENT_STEP);
            emit_marker_tokens(name, &mut out.tokens);
        }
        SchemaKind::Primitive { .. } => {}
    }
}

fn emit_properties<'a>(
    properties: &'a IndexMap<String, SchemaNode>,
    required: &[String],
    model: &str,
    indent: usize,
    out: &mut Flattened,
    queue: &mut VecDeque<Pending<'a>>,
) {
    for (field, prop) in properties {
        let mut keywords = Vec::new();
        if required.contains(field) {
            keywords.push("required".to_string());
        }
        keywords.extend(prop.keywords());

        out.rows.push(TableRow::new(
            model,
            field.as_str(),
            prop.type_format(),
            join_keywords(keywords),
            description(prop),
        ));

        push_indent(&mut out.tokens, indent);
        out.tokens.push(Token::literal(field.as_str()));
        out.tokens.push(Token::punct(":"));

        if prop.has_properties() {
            let nested_model = prop.ref_name.clone().unwrap_or_else(|| field.clone());
            out.tokens.push(Token::type_name(nested_model.as_str()));
            out.tokens.push(Token::newline());
            queue.push_back(Pending {
                node: prop,
                model: nested_model,
                indent,
            });
            continue;
        }

        match &prop.kind {
            SchemaKind::Reference { name } => emit_marker_tokens(name, &mut out.tokens),
            SchemaKind::Array { items } => {
                emit_array_tokens(items, &mut out.tokens);
                enqueue_items(items, field, indent, queue);
            }
            SchemaKind::Composition {
                composition,
                members,
                ..
            } => emit_inline_composition(*composition, members, &mut out.tokens),
            _ => {
                out.tokens.push(Token::keyword(prop.type_format()));
                out.tokens.push(Token::newline());
            }
        }
    }
}

fn emit_array_tokens(items: &SchemaNode, tokens: &mut Vec<Token>) {
    tokens.push(Token::keyword("array"));
    tokens.push(Token::punct("<"));
    tokens.push(Token::type_name(items.type_name()));
    tokens.push(Token::punct(">"));
    tokens.push(Token::newline());
}

/// A composition field without properties of its own: `allOf<A,B>`.
fn emit_inline_composition(
    composition: CompositionKind,
    members: &[String],
    tokens: &mut Vec<Token>,
) {
    tokens.push(Token::keyword(composition.as_str()));
    tokens.push(Token::punct("<"));
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            tokens.push(Token::punct(","));
        }
        tokens.push(Token::type_name(member.as_str()));
    }
    tokens.push(Token::punct(">"));
    tokens.push(Token::newline());
}

fn emit_marker_tokens(name: &str, tokens: &mut Vec<Token>) {
    tokens.push(Token::punct("<"));
    tokens.push(Token::type_name(name));
    tokens.push(Token::punct(">"));
    tokens.push(Token::newline());
}

/// Queue array items that deserve their own model. Markers stop here.
fn enqueue_items<'a>(
    items: &'a SchemaNode,
    fallback_model: &str,
    indent: usize,
    queue: &mut VecDeque<Pending<'a>>,
) {
    if items.is_reference() || !items.is_expandable() {
        return;
    }
    let model = items
        .ref_name
        .clone()
        .unwrap_or_else(|| fallback_model.to_string());
    queue.push_back(Pending {
        node: items,
        model,
        indent,
    });
}

fn push_indent(tokens: &mut Vec<Token>, indent: usize) {
    if indent > 0 {
        tokens.push(Token::indent(indent));
    }
}

/// Deduplicate in order and join with `,`.
fn join_keywords(keywords: Vec<String>) -> String {
    let unique: IndexSet<String> = keywords.into_iter().collect();
    unique.into_iter().collect::<Vec<_>>().join(",")
}

fn description(node: &SchemaNode) -> String {
    node.meta.description.clone().unwrap_or_default()
}
