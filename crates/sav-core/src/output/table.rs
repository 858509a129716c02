use serde::Serialize;

type Accessor = fn(&TableRow) -> &str;

/// One flattened row of a schema table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableRow {
    pub model: String,
    pub field: String,
    pub type_format: String,
    pub keywords: String,
    pub description: String,
}

impl TableRow {
    /// Column headers and the accessor for each cell, in display order.
    pub const COLUMNS: [(&'static str, Accessor); 5] = [
        ("Model", model),
        ("Field", field),
        ("Type/Format", type_format),
        ("Keywords", keywords),
        ("Description", description),
    ];

    pub fn new(
        model: impl Into<String>,
        field: impl Into<String>,
        type_format: impl Into<String>,
        keywords: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
            type_format: type_format.into(),
            keywords: keywords.into(),
            description: description.into(),
        }
    }

    pub fn cells(&self) -> [&str; 5] {
        Self::COLUMNS.map(|(_, cell)| cell(self))
    }
}

fn model(row: &TableRow) -> &str {
    row.model.as_str()
}

fn field(row: &TableRow) -> &str {
    row.field.as_str()
}

fn type_format(row: &TableRow) -> &str {
    row.type_format.as_str()
}

fn keywords(row: &TableRow) -> &str {
    row.keywords.as_str()
}

fn description(row: &TableRow) -> &str {
    row.description.as_str()
}

/// Render rows as a pipe-separated text table with a header line.
pub fn render_table(rows: &[TableRow]) -> String {
    let mut out = String::new();
    let header: Vec<&str> = TableRow::COLUMNS.iter().map(|(name, _)| *name).collect();
    out.push_str(&header.join(" | "));
    out.push('\n');
    for row in rows {
        out.push_str(row.cells().join(" | ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_follow_columns() {
        let row = TableRow::new("Pet", "name", "string", "required", "The name");
        assert_eq!(row.cells(), ["Pet", "name", "string", "required", "The name"]);
    }

    #[test]
    fn test_render_table() {
        let rows = vec![
            TableRow::new("Pet", "", "object", "", ""),
            TableRow::new("Pet", "tag", "string", "", ""),
        ];
        insta::assert_snapshot!(render_table(&rows), @r"
        Model | Field | Type/Format | Keywords | Description
        Pet |  | object |  |
        Pet | tag | string |  |
        ");
    }
}
