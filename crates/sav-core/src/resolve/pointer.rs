use crate::error::ResolveError;

/// The document section a `$ref` points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSection {
    Definitions,
    Parameters,
    Responses,
}

impl RefSection {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "definitions" => Some(RefSection::Definitions),
            "parameters" => Some(RefSection::Parameters),
            "responses" => Some(RefSection::Responses),
            _ => None,
        }
    }
}

/// A parsed `$ref` such as `#/definitions/Pet` or
/// `../common/types.json#/parameters/ApiVersion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPointer<'a> {
    /// Relative or absolute file part; `None` for in-document pointers.
    pub file: Option<&'a str>,
    pub section: RefSection,
    /// Unescaped entry name.
    pub name: String,
}

impl<'a> RefPointer<'a> {
    pub fn parse(ref_path: &'a str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidRefFormat(ref_path.to_string());
        let (file, fragment) = ref_path.split_once('#').ok_or_else(invalid)?;
        let (section, name) = fragment
            .strip_prefix('/')
            .and_then(|f| f.split_once('/'))
            .ok_or_else(invalid)?;
        let section = RefSection::from_segment(section).ok_or_else(invalid)?;
        if name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            file: (!file.is_empty()).then_some(file),
            section,
            name: unescape(name),
        })
    }

    /// Ensure the pointer targets the expected section.
    pub fn expect(self, section: RefSection, ref_path: &str) -> Result<Self, ResolveError> {
        if self.section != section {
            return Err(ResolveError::InvalidRefFormat(format!(
                "expected section '{:?}', got '{:?}' in {}",
                section, self.section, ref_path
            )));
        }
        Ok(self)
    }
}

/// The definition name a `$ref` displays as: its last path segment.
pub fn definition_name(ref_path: &str) -> &str {
    ref_path.rsplit('/').next().unwrap_or(ref_path)
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_definition() {
        let p = RefPointer::parse("#/definitions/Pet").unwrap();
        assert_eq!(p.file, None);
        assert_eq!(p.section, RefSection::Definitions);
        assert_eq!(p.name, "Pet");
    }

    #[test]
    fn test_parse_cross_file_parameter() {
        let p = RefPointer::parse("../common/types.json#/parameters/ApiVersionParameter").unwrap();
        assert_eq!(p.file, Some("../common/types.json"));
        assert_eq!(p.section, RefSection::Parameters);
        assert_eq!(p.name, "ApiVersionParameter");
    }

    #[test]
    fn test_parse_escaped_name() {
        let p = RefPointer::parse("#/definitions/a~1b~0c").unwrap();
        assert_eq!(p.name, "a/b~c");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(RefPointer::parse("types.json").is_err());
        assert!(RefPointer::parse("#/components/schemas/Pet").is_err());
        assert!(RefPointer::parse("#/definitions/").is_err());
        assert!(RefPointer::parse("#/definitions/Pet/properties/name").is_err());
    }

    #[test]
    fn test_expect_section() {
        let p = RefPointer::parse("#/parameters/Foo").unwrap();
        assert!(p.clone().expect(RefSection::Parameters, "#/parameters/Foo").is_ok());
        assert!(p.expect(RefSection::Definitions, "#/parameters/Foo").is_err());
    }

    #[test]
    fn test_definition_name() {
        assert_eq!(definition_name("common.json#/definitions/Error"), "Error");
        assert_eq!(definition_name("Error"), "Error");
    }
}
