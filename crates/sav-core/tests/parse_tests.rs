use sav_core::error::ParseError;
use sav_core::parse;
use sav_core::parse::parameter::{ParameterLocation, ParameterOrRef};
use sav_core::parse::response::ResponseOrRef;
use sav_core::parse::schema::SchemaOrRef;
use sav_core::parse::security::SecuritySchemeType;

const PETSTORE: &str = include_str!("fixtures/petstore.json");
const SERVICE: &str = include_str!("fixtures/service.json");
const ALLOF: &str = include_str!("fixtures/allof.json");

#[test]
fn parse_petstore_json() {
    let spec = parse::from_json(PETSTORE).expect("should parse petstore");
    assert_eq!(spec.swagger, "2.0");
    assert_eq!(spec.info.title, "Petstore");
    assert_eq!(spec.base_path.as_deref(), Some("/v1"));
    assert_eq!(spec.paths.len(), 2);
    assert_eq!(spec.definitions.len(), 3);
    assert!(spec.parameters.contains_key("ApiVersion"));
    assert!(spec.security_definitions.contains_key("api_key"));

    let azure = &spec.security_definitions["azure_auth"];
    assert_eq!(azure.scheme_type, SecuritySchemeType::OAuth2);
    assert_eq!(azure.flow.as_deref(), Some("implicit"));
    assert_eq!(azure.scopes.len(), 1);

    let item = spec.paths.get("/pets/{id}").expect("should have /pets/{id}");
    let get = item.get.as_ref().expect("should have GET");
    assert_eq!(get.operation_id.as_deref(), Some("Pets_Get"));
    match &get.parameters[0] {
        ParameterOrRef::Parameter(p) => {
            assert_eq!(p.name, "id");
            assert_eq!(p.location, ParameterLocation::Path);
            assert!(p.required);
        }
        other => panic!("expected inline parameter, got {other:?}"),
    }

    let post = spec.paths["/pets"].post.as_ref().expect("should have POST");
    assert!(matches!(
        post.responses.get("default"),
        Some(ResponseOrRef::Ref { ref_path }) if ref_path == "#/responses/ErrorResponse"
    ));
}

#[test]
fn parse_extensions() {
    let spec = parse::from_json(SERVICE).expect("should parse service");
    let host = spec
        .ms_parameterized_host
        .as_ref()
        .expect("should have x-ms-parameterized-host");
    assert_eq!(host.host_template, "{endpoint}/widgets");
    assert!(!host.use_scheme_prefix);
    assert_eq!(host.parameters.len(), 1);

    let petstore = parse::from_json(PETSTORE).unwrap();
    let list = petstore.paths["/pets"].get.as_ref().unwrap();
    let pageable = list.ms_pageable.as_ref().expect("should be pageable");
    assert_eq!(pageable.next_link_name.as_deref(), Some("nextLink"));

    let error = match &petstore.definitions["Error"] {
        SchemaOrRef::Schema(s) => s,
        _ => panic!("expected inline schema"),
    };
    let status = match &error.properties["status"] {
        SchemaOrRef::Schema(s) => s,
        _ => panic!("expected inline schema"),
    };
    let ms_enum = status.ms_enum.as_ref().expect("should have x-ms-enum");
    assert_eq!(ms_enum.name, "ErrorStatus");
    assert!(ms_enum.model_as_string);
}

#[test]
fn parse_composition() {
    let spec = parse::from_json(ALLOF).expect("should parse allof");
    let pet = match &spec.definitions["Pet"] {
        SchemaOrRef::Schema(s) => s,
        _ => panic!("expected inline schema"),
    };
    assert_eq!(pet.all_of.len(), 1);
    assert_eq!(pet.discriminator_value.as_deref(), Some("pet"));
    assert_eq!(pet.properties.len(), 2);
}

#[test]
fn parse_yaml() {
    let yaml = r#"
swagger: "2.0"
info:
  title: Tiny
  version: "1"
paths:
  /ping:
    get:
      operationId: Ping_Get
      responses:
        "200":
          description: pong
"#;
    let spec = parse::from_yaml(yaml).expect("should parse yaml");
    assert_eq!(spec.info.title, "Tiny");
    assert!(spec.paths["/ping"].get.is_some());
}

#[test]
fn reject_unsupported_version() {
    let err = parse::from_json(r#"{"swagger": "1.2", "info": {"title": "t", "version": "1"}}"#)
        .unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedVersion(v) if v == "1.2"));

    // An OpenAPI 3 document has no `swagger` field at all.
    let err = parse::from_json(r#"{"openapi": "3.0.0", "info": {"title": "t", "version": "1"}}"#)
        .unwrap_err();
    assert!(matches!(err, ParseError::Json(_)));
}

#[test]
fn reject_malformed_json() {
    assert!(parse::from_json("{ not json").is_err());
}
