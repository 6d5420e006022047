//! OpenAPI 3.1 spec generation from registered procedure metadata.

use serde_json::{Map, Value, json};

use crate::operation;

/// Top-level API info for the OpenAPI spec.
pub struct Info {
    pub title: &'static str,
    pub version: &'static str,
}

/// Build an OpenAPI 3.1 JSON document from collected operation metadata.
pub fn generate(info: &Info, operations: &[operation::Meta]) -> Value {
    let mut paths: Map<String, Value> = Map::new();
    let mut schemas: Map<String, Value> = Map::new();

    for op in operations {
        let mut operation_obj: Map<String, Value> = Map::new();

        // Summary
        if !op.summary.is_empty() {
            operation_obj.insert("summary".into(), Value::String(op.summary.clone()));
        }

        // Tags
        if !op.tag.is_empty() {
            operation_obj.insert("tags".into(), json!([op.tag]));
        }

        // Request body
        if let Some(input_schema) = &op.input_schema {
            let input_json = serde_json::to_value(input_schema).unwrap_or(json!({}));
            let (content_schema, input_defs) = extract_defs(input_json);

            // Merge any $defs into top-level schemas
            for (name, schema) in input_defs {
                schemas.entry(name).or_insert(schema);
            }

            operation_obj.insert(
                "requestBody".into(),
                json!({
                    "required": true,
                    "content": {
                        "application/json": {
                            "schema": rewrite_refs(content_schema)
                        }
                    }
                }),
            );
        }

        // Response
        let output_json = serde_json::to_value(&op.output_schema).unwrap_or(json!({}));
        let (response_schema, output_defs) = extract_defs(output_json);

        for (name, schema) in output_defs {
            schemas.entry(name).or_insert(schema);
        }

        let status_str = op.status.to_string();
        let mut responses: Map<String, Value> = Map::new();
        responses.insert(
            status_str,
            json!({
                "description": "Successful response",
                "content": {
                    "application/json": {
                        "schema": rewrite_refs(response_schema)
                    }
                }
            }),
        );

        // Standard error responses
        responses.insert("400".into(), error_response("Bad request"));
        if op.secured {
            responses.insert("401".into(), error_response("Not signed in"));
            responses.insert("403".into(), error_response("Signed in but not permitted"));
            operation_obj.insert("security".into(), json!([{ "bearerAuth": [] }]));
        }
        responses.insert("500".into(), error_response("Internal server error"));

        operation_obj.insert("responses".into(), Value::Object(responses));

        // Insert into paths grouped by path
        let path_item = paths
            .entry(op.path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = path_item {
            map.insert(op.method.clone(), Value::Object(operation_obj));
        }
    }

    let mut spec = json!({
        "openapi": "3.1.0",
        "info": {
            "title": info.title,
            "version": info.version,
        },
        "paths": paths,
    });

    let mut components: Map<String, Value> = Map::new();
    if !schemas.is_empty() {
        components.insert("schemas".into(), Value::Object(schemas));
    }
    if operations.iter().any(|op| op.secured) {
        components.insert(
            "securitySchemes".into(),
            json!({ "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" } }),
        );
    }
    if !components.is_empty()
        && let Some(obj) = spec.as_object_mut()
    {
        obj.insert("components".into(), Value::Object(components));
    }

    spec
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": {
            "type": "object",
            "properties": { "error": { "type": "string" } }
        } } }
    })
}

/// Extract `$defs` from a schemars-generated schema and return
/// (root schema without $defs, Vec of (name, schema) pairs).
fn extract_defs(mut schema: Value) -> (Value, Vec<(String, Value)>) {
    let mut defs = Vec::new();

    if let Some(obj) = schema.as_object_mut()
        && let Some(Value::Object(defs_map)) = obj.remove("$defs")
    {
        for (name, def_schema) in defs_map {
            defs.push((name, rewrite_refs(def_schema)));
        }
    }

    (rewrite_refs(schema), defs)
}

/// Rewrite `$ref` values from schemars' `#/$defs/Foo` format to OpenAPI's
/// `#/components/schemas/Foo` format.
fn rewrite_refs(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let new_map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| {
                    if k == "$ref" {
                        if let Value::String(ref s) = v
                            && let Some(name) = s.strip_prefix("#/$defs/")
                        {
                            return (k, Value::String(format!("#/components/schemas/{name}")));
                        }
                        (k, v)
                    } else {
                        (k, rewrite_refs(v))
                    }
                })
                .collect();
            Value::Object(new_map)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(rewrite_refs).collect()),
        other => other,
    }
}
