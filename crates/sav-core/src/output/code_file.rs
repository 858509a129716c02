use indexmap::IndexMap;
use serde::Serialize;

use super::navigation::{
    DEFINITIONS_SEGMENT, GENERAL_SEGMENT, IteratorPath, Navigable, NavigationItem,
    PARAMETERS_SEGMENT, PATHS_SEGMENT, ViewRoot, operation_label, root_segments,
};
use super::table::TableRow;
use super::tokens::{Token, TokenWriter};
use crate::parse::parameter::ParameterLocation;
use crate::transform::flatten::{Flattened, SerializeContext, flatten};
use crate::view::{ApiViewGeneral, ApiViewSpec, OperationView, ParameterView, SchemaNode};

pub const LANGUAGE: &str = "Swagger";

/// The persisted output: one token stream, the schema tables keyed by anchor
/// id, and the navigation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeFile {
    pub name: String,
    pub language: String,
    pub package_name: String,
    pub tokens: Vec<Token>,
    pub tables: IndexMap<String, Vec<TableRow>>,
    pub navigation: Vec<NavigationItem>,
}

impl CodeFile {
    /// Combine the views of several root documents into one code file. Views
    /// sharing a file name get distinct root ids.
    pub fn from_views(package_name: &str, views: &[ApiViewSpec]) -> Self {
        let mut builder = CodeFileBuilder::default();
        let mut navigation = Vec::with_capacity(views.len());
        for (view, segment) in views.iter().zip(root_segments(views)) {
            builder.write_view(view, &segment);
            let root = ViewRoot {
                segment: &segment,
                view,
            };
            navigation.push(root.navigation_item(&mut IteratorPath::new()));
        }
        Self {
            name: package_name.to_string(),
            language: LANGUAGE.to_string(),
            package_name: package_name.to_string(),
            tokens: builder.writer.finish(),
            tables: builder.tables,
            navigation,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Default)]
struct CodeFileBuilder {
    writer: TokenWriter,
    tables: IndexMap<String, Vec<TableRow>>,
}

impl CodeFileBuilder {
    fn write_view(&mut self, view: &ApiViewSpec, root_segment: &str) {
        let mut path = IteratorPath::new();
        path.push(root_segment);
        let root_id = path.current();

        let mut writer = std::mem::take(&mut self.writer);
        writer.section(&view.file_name, &root_id, |w| {
            w.section(GENERAL_SEGMENT, &path.current_next(GENERAL_SEGMENT), |w| {
                write_general(w, &view.general);
            });

            if !view.paths.is_empty() {
                path.push(PATHS_SEGMENT);
                w.section(PATHS_SEGMENT, &path.current(), |w| {
                    for (p, operations) in &view.paths {
                        path.push(p.as_str());
                        w.section(p, &path.current(), |w| {
                            for op in operations {
                                let id = path.current_next(op.method.as_str());
                                w.section(&operation_label(op), &id, |w| {
                                    self.write_operation(w, op, &id);
                                });
                            }
                        });
                        path.pop();
                    }
                });
                path.pop();
            }

            if !view.definitions.is_empty() {
                path.push(DEFINITIONS_SEGMENT);
                w.section(DEFINITIONS_SEGMENT, &path.current(), |w| {
                    for (name, schema) in &view.definitions {
                        let id = path.current_next(name);
                        w.section(name, &id, |w| {
                            self.write_schema(w, schema, SerializeContext::new(id.as_str()));
                        });
                    }
                });
                path.pop();
            }

            if !view.global_parameters.is_empty() {
                path.push(PARAMETERS_SEGMENT);
                w.section(PARAMETERS_SEGMENT, &path.current(), |w| {
                    for (name, parameter) in &view.global_parameters {
                        let id = path.current_next(name);
                        w.section(name, &id, |w| {
                            write_parameter_line(w, parameter, 0);
                            self.tables
                                .insert(id.clone(), vec![parameter_row(name, parameter)]);
                            if let Some(schema) = table_schema(parameter) {
                                let ctx = SerializeContext::new(format!("{id}-schema"));
                                self.write_schema(w, schema, ctx);
                            }
                        });
                    }
                });
                path.pop();
            }
        });
        self.writer = writer;
    }

    fn write_operation(&mut self, w: &mut TokenWriter, op: &OperationView, id: &str) {
        w.push(Token::keyword(op.method.as_str()));
        w.push(Token::literal(format!(" {}", op.path)));
        w.push(Token::newline());

        if let Some(operation_id) = &op.operation_id {
            write_field(w, "operationId", operation_id);
        }
        if let Some(summary) = &op.summary {
            write_field(w, "summary", summary);
        }
        if let Some(description) = &op.description {
            write_field(w, "description", description);
        }
        if !op.tags.is_empty() {
            write_field(w, "tags", &op.tags.join(", "));
        }
        if !op.consumes.is_empty() {
            write_field(w, "consumes", &op.consumes.join(", "));
        }
        if !op.produces.is_empty() {
            write_field(w, "produces", &op.produces.join(", "));
        }
        if op.deprecated {
            w.push(Token::keyword("deprecated"));
            w.push(Token::newline());
        }
        if op.long_running {
            w.push(Token::keyword("x-ms-long-running-operation"));
            w.push(Token::newline());
        }
        if let Some(next_link) = op.pageable.as_ref().and_then(|p| p.next_link_name.as_deref()) {
            write_field(w, "x-ms-pageable", &format!("nextLinkName: {next_link}"));
        }

        for (title, params) in op.parameters.buckets() {
            if params.is_empty() {
                continue;
            }
            w.push(Token::keyword(title));
            w.push(Token::newline());
            let anchor = format!("{id}-{title}");
            let rows = params.iter().map(|p| parameter_row(title, p)).collect();
            self.tables.insert(anchor.clone(), rows);
            for param in params {
                write_parameter_line(w, param, 2);
                if let Some(schema) = table_schema(param) {
                    let ctx = SerializeContext::new(format!("{anchor}-{}", param.name))
                        .with_indent(4);
                    self.write_schema(w, schema, ctx);
                }
            }
        }

        if op.responses.is_empty() {
            return;
        }
        w.push(Token::keyword("Responses"));
        w.push(Token::newline());
        for response in &op.responses {
            w.push(Token::indent(2));
            w.push(Token::keyword(response.status_code.as_str()));
            w.push(Token::punct(":"));
            w.push(Token::literal(format!(" {}", response.description)));
            w.push(Token::newline());
            for (name, header) in &response.headers {
                w.push(Token::indent(4));
                w.push(Token::literal(name.as_str()));
                w.push(Token::punct(":"));
                w.push(Token::keyword(header.type_format()));
                w.push(Token::newline());
            }
            if let Some(schema) = &response.schema {
                let ctx = SerializeContext::new(format!("{id}-Responses-{}", response.status_code))
                    .with_indent(4);
                self.write_schema(w, schema, ctx);
            }
        }
    }

    fn write_schema(&mut self, w: &mut TokenWriter, schema: &SchemaNode, ctx: SerializeContext) {
        let Flattened {
            anchor,
            tokens,
            rows,
        } = flatten(schema, &ctx);
        w.extend(tokens);
        self.tables.insert(anchor, rows);
    }
}

fn write_general(w: &mut TokenWriter, general: &ApiViewGeneral) {
    write_field(w, "swagger", &general.swagger);
    write_field(w, "title", &general.info.title);
    write_field(w, "version", &general.info.version);
    if let Some(description) = &general.info.description {
        write_field(w, "description", description);
    }
    if let Some(host) = &general.host {
        write_field(w, "host", host);
    }
    if let Some(base_path) = &general.base_path {
        write_field(w, "basePath", base_path);
    }
    if !general.schemes.is_empty() {
        write_field(w, "schemes", &general.schemes.join(", "));
    }
    if !general.consumes.is_empty() {
        write_field(w, "consumes", &general.consumes.join(", "));
    }
    if !general.produces.is_empty() {
        write_field(w, "produces", &general.produces.join(", "));
    }
    for requirement in &general.security {
        let names: Vec<&str> = requirement.keys().map(String::as_str).collect();
        write_field(w, "security", &names.join(", "));
    }
    for (name, scheme) in &general.security_definitions {
        let kind = scheme.scheme_type.as_str();
        write_field(w, "securityDefinition", &format!("{name} ({kind})"));
    }
    if let Some(host) = &general.parameterized_host {
        write_field(w, "x-ms-parameterized-host", &host.host_template);
        for param in &host.parameters {
            write_parameter_line(w, param, 2);
        }
    }
    if let Some(link) = &general.swagger_link {
        write_field(w, "swaggerLink", link);
    }
}

fn write_field(w: &mut TokenWriter, key: &str, value: &str) {
    w.push(Token::keyword(key));
    w.push(Token::punct(":"));
    w.push(Token::literal(format!(" {value}")));
    w.push(Token::newline());
}

fn write_parameter_line(w: &mut TokenWriter, param: &ParameterView, indent: usize) {
    if indent > 0 {
        w.push(Token::indent(indent));
    }
    w.push(Token::literal(param.name.as_str()));
    w.push(Token::punct(":"));
    w.push(Token::keyword(param.type_format()));
    if param.required {
        w.push(Token::punct(" "));
        w.push(Token::keyword("required"));
    }
    w.push(Token::newline());
}

/// The schema of a parameter that gets a table of its own: any body schema,
/// or array items with properties.
fn table_schema(param: &ParameterView) -> Option<&SchemaNode> {
    param
        .schema
        .as_ref()
        .filter(|schema| param.location == ParameterLocation::Body || schema.has_properties())
}

fn parameter_row(model: &str, param: &ParameterView) -> TableRow {
    let keywords = if param.required { "required" } else { "" };
    TableRow::new(
        model,
        param.name.as_str(),
        param.type_format(),
        keywords,
        param.description.clone().unwrap_or_default(),
    )
}
