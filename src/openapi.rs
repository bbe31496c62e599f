//! OpenAPI document for the mounted route groups, built programmatically with utoipa.

use crate::case::to_snake_case;
use crate::model::{FieldDef, FieldKind};
use crate::routes::RouteGroup;
use crate::schema::{DerivedSchema, Purpose};
use std::sync::Arc;
use utoipa::openapi::path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::{
    ArrayBuilder, KnownFormat, Object, ObjectBuilder, Schema, SchemaFormat, SchemaType, Type,
};
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{
    ComponentsBuilder, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder, Ref, RefOr,
    Required, Response, ResponseBuilder,
};

const VALIDATION_ERROR: &str = "ValidationError";
const HTTP_VALIDATION_ERROR: &str = "HTTPValidationError";

fn object(o: Object) -> RefOr<Schema> {
    RefOr::T(Schema::Object(o))
}

fn reference(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn array_of(items: RefOr<Schema>) -> RefOr<Schema> {
    RefOr::T(Schema::Array(ArrayBuilder::new().items(items).build()))
}

fn kind_schema(kind: FieldKind, nullable: bool) -> ObjectBuilder {
    let (ty, format) = match kind {
        FieldKind::Uuid => (Type::String, Some(KnownFormat::Uuid)),
        FieldKind::Text => (Type::String, None),
        FieldKind::Int => (Type::Integer, Some(KnownFormat::Int32)),
        FieldKind::BigInt => (Type::Integer, Some(KnownFormat::Int64)),
        FieldKind::Float => (Type::Number, Some(KnownFormat::Double)),
        FieldKind::Bool => (Type::Boolean, None),
        FieldKind::Timestamp => (Type::String, Some(KnownFormat::DateTime)),
        FieldKind::Json => return ObjectBuilder::new().schema_type(SchemaType::AnyValue),
    };
    let schema_type = if nullable {
        SchemaType::from_iter([ty, Type::Null])
    } else {
        SchemaType::new(ty)
    };
    ObjectBuilder::new()
        .schema_type(schema_type)
        .format(format.map(SchemaFormat::KnownFormat))
}

fn field_schema(f: &FieldDef) -> RefOr<Schema> {
    object(kind_schema(f.kind, f.nullable).title(Some(f.name.clone())).build())
}

/// Component schema of a derived schema. Update fields and nullable fields are optional.
fn component(schema: &DerivedSchema) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new().schema_type(Type::Object).title(Some(schema.name.clone()));
    for f in &schema.fields {
        b = b.property(f.name.as_str(), field_schema(f));
        if schema.purpose != Purpose::Update && !f.nullable {
            b = b.required(f.name.as_str());
        }
    }
    object(b.build())
}

fn validation_components(components: ComponentsBuilder) -> ComponentsBuilder {
    let string = || object(ObjectBuilder::new().schema_type(Type::String).build());
    let entry = ObjectBuilder::new()
        .schema_type(Type::Object)
        .title(Some(VALIDATION_ERROR))
        .property("loc", array_of(string()))
        .property("msg", string())
        .property("type", string())
        .required("loc")
        .required("msg")
        .required("type")
        .build();
    let body = ObjectBuilder::new()
        .schema_type(Type::Object)
        .title(Some(HTTP_VALIDATION_ERROR))
        .property("detail", array_of(reference(VALIDATION_ERROR)))
        .build();
    components
        .schema(VALIDATION_ERROR, object(entry))
        .schema(HTTP_VALIDATION_ERROR, object(body))
}

fn json_response(description: &str, schema: RefOr<Schema>) -> Response {
    ResponseBuilder::new()
        .description(description)
        .content("application/json", ContentBuilder::new().schema(Some(schema)).build())
        .build()
}

fn validation_response() -> Response {
    json_response("Validation Error", reference(HTTP_VALIDATION_ERROR))
}

fn not_found_response(group: &RouteGroup) -> Response {
    ResponseBuilder::new()
        .description(format!("{} not found", group.model.name.to_lowercase()))
        .build()
}

fn request_body(schema: &DerivedSchema) -> utoipa::openapi::request_body::RequestBody {
    RequestBodyBuilder::new()
        .content("application/json", ContentBuilder::new().schema(Some(reference(&schema.name))).build())
        .required(Some(Required::True))
        .build()
}

fn query_param(name: &str, minimum: f64) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .schema(Some(object(
            ObjectBuilder::new()
                .schema_type(Type::Integer)
                .minimum(Some(minimum))
                .build(),
        )))
        .build()
}

fn operation(group: &RouteGroup, id: &str, summary: &str) -> OperationBuilder {
    OperationBuilder::new()
        .tag(group.tag.clone())
        .operation_id(Some(format!(
            "{}_{}_{}",
            id,
            group.model.category,
            to_snake_case(&group.model.name)
        )))
        .summary(Some(summary.to_string()))
}

fn add_group(paths: PathsBuilder, group: &RouteGroup, api_prefix: &str) -> PathsBuilder {
    let read = &group.schemas.read.name;
    let base = format!("{}{}", api_prefix, group.path());
    let pk = group.model.primary_key.as_str();
    let pk_param = || {
        ParameterBuilder::new()
            .name(pk)
            .parameter_in(ParameterIn::Path)
            .required(Required::True)
            .schema(Some(object(kind_schema(group.key_kind(), false).build())))
            .build()
    };

    let collection = PathItemBuilder::new()
        .operation(
            HttpMethod::Get,
            operation(group, "list", "List")
                .parameter(query_param("skip", 0.0))
                .parameter(query_param("limit", 1.0))
                .response("200", json_response("Successful Response", array_of(reference(read))))
                .response("422", validation_response())
                .build(),
        )
        .operation(
            HttpMethod::Post,
            operation(group, "create", "Create")
                .request_body(Some(request_body(&group.schemas.create)))
                .response("200", json_response("Successful Response", reference(read)))
                .response("422", validation_response())
                .build(),
        )
        .operation(
            HttpMethod::Delete,
            operation(group, "delete_all", "Delete All")
                .response("200", json_response("Successful Response", array_of(reference(read))))
                .build(),
        )
        .build();

    let item = PathItemBuilder::new()
        .operation(
            HttpMethod::Get,
            operation(group, "get_one", "Get One")
                .parameter(pk_param())
                .response("200", json_response("Successful Response", reference(read)))
                .response("404", not_found_response(group))
                .response("422", validation_response())
                .build(),
        )
        .operation(
            HttpMethod::Patch,
            operation(group, "update_one", "Update One")
                .parameter(pk_param())
                .request_body(Some(request_body(&group.schemas.update)))
                .response("200", json_response("Successful Response", reference(read)))
                .response("404", not_found_response(group))
                .response("422", validation_response())
                .build(),
        )
        .operation(
            HttpMethod::Delete,
            operation(group, "delete_one", "Delete One")
                .parameter(pk_param())
                .response("200", json_response("Successful Response", reference(read)))
                .response("404", not_found_response(group))
                .response("422", validation_response())
                .build(),
        )
        .build();

    paths
        .path(base.clone(), collection)
        .path(format!("{}/{{{}}}", base, pk), item)
}

/// One component schema per derived schema, one tag per group, six operations per group.
pub fn document(groups: &[Arc<RouteGroup>], api_prefix: &str) -> OpenApi {
    let mut paths = PathsBuilder::new().path(
        "/health",
        PathItemBuilder::new()
            .operation(
                HttpMethod::Get,
                OperationBuilder::new()
                    .operation_id(Some("health"))
                    .summary(Some("Health"))
                    .response("200", ResponseBuilder::new().description("Database reachable").build())
                    .response("500", ResponseBuilder::new().description("Database unreachable").build())
                    .build(),
            )
            .build(),
    );
    let mut components = validation_components(ComponentsBuilder::new());
    let mut tags = Vec::new();
    for group in groups {
        paths = add_group(paths, group, api_prefix);
        for schema in group.schemas.all() {
            components = components.schema(schema.name.clone(), component(schema));
        }
        tags.push(TagBuilder::new().name(group.tag.clone()).build());
    }
    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(env!("CARGO_PKG_NAME"))
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths.build())
        .components(Some(components.build()))
        .tags(Some(tags))
        .build()
}
