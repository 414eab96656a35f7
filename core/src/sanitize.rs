//! # Reference Sanitizing
//!
//! Generators that cannot follow recursive schemas need the optional parts of
//! a schema that lead back into a reference cut away. This module removes the
//! common cases and reports the references that are left.
//!
//! Only `properties` are descended into; the other rewrites apply to the
//! object being visited. Removing every optional branch in general is not
//! attempted.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Keywords that constrain instances. A subschema carrying any of them is not
/// trivially satisfiable.
const SCHEMA_KEYWORDS: &[&str] = &[
    "$ref",
    "additionalItems",
    "additionalProperties",
    "allOf",
    "anyOf",
    "const",
    "contains",
    "dependencies",
    "dependentRequired",
    "dependentSchemas",
    "else",
    "enum",
    "exclusiveMaximum",
    "exclusiveMinimum",
    "format",
    "if",
    "items",
    "maxItems",
    "maxLength",
    "maxProperties",
    "maximum",
    "minItems",
    "minLength",
    "minProperties",
    "minimum",
    "multipleOf",
    "not",
    "oneOf",
    "pattern",
    "patternProperties",
    "prefixItems",
    "properties",
    "propertyNames",
    "required",
    "then",
    "type",
    "unevaluatedItems",
    "unevaluatedProperties",
    "uniqueItems",
];

const COMBINATORS: [&str; 3] = ["allOf", "oneOf", "anyOf"];

/// Removes optional subschemas that contain references and returns every
/// `$ref` still present afterwards.
///
/// - non-required properties holding a reference are dropped;
/// - properties whose combinator reduces to a single referencing subschema are dropped;
/// - referencing `items` become `maxItems: 0` unless `minItems` demands elements;
/// - referencing `additionalProperties` become `false`;
/// - single-reference combinators are removed from the visited object.
///
/// Boolean schemas are left alone.
pub fn remove_optional_references(schema: &mut Value) -> BTreeSet<String> {
    let mut stack: Vec<&mut Value> = vec![&mut *schema];
    while let Some(current) = stack.pop() {
        let Value::Object(map) = current else {
            continue;
        };
        sanitize_properties(map);
        if map.contains_key("items") {
            sanitize_items(map);
        }
        if map.contains_key("additionalProperties") {
            sanitize_additional_properties(map);
        }
        let combinators = single_reference_combinators(map);
        if !combinators.is_empty() {
            map.retain(|key, _| !combinators.contains(&key.as_str()));
        }
        if let Some(Value::Object(properties)) = map.get_mut("properties") {
            stack.extend(properties.values_mut().filter(|value| value.is_object()));
        }
    }

    let mut remaining = BTreeSet::new();
    collect_references(schema, &mut remaining);
    remaining
}

fn sanitize_properties(map: &mut Map<String, Value>) {
    let required: Vec<String> = match map.get("required") {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        properties.retain(|name, value| match value {
            Value::Object(subschema) => {
                let optional_reference = !required.contains(name) && has_references(subschema);
                !optional_reference && single_reference_combinators(subschema).is_empty()
            }
            _ => true,
        });
    }
}

fn sanitize_items(map: &mut Map<String, Value>) {
    let min_items = map.get("minItems").and_then(Value::as_f64).unwrap_or(0.0);
    if min_items != 0.0 {
        return;
    }
    let references = match map.get("items") {
        Some(Value::Object(items)) => {
            items.contains_key("$ref") || !single_reference_combinators(items).is_empty()
        }
        Some(Value::Array(items)) => any_references(items),
        _ => false,
    };
    if references {
        map.retain(|key, _| key != "items");
        map.insert("maxItems".to_string(), Value::from(0));
    }
}

fn sanitize_additional_properties(map: &mut Map<String, Value>) {
    if let Some(additional) = map.get_mut("additionalProperties") {
        if additional.get("$ref").is_some() {
            *additional = Value::Bool(false);
        }
    }
}

fn has_references(schema: &Map<String, Value>) -> bool {
    if schema.contains_key("$ref") {
        return true;
    }
    match schema.get("items") {
        Some(Value::Object(items)) => items.contains_key("$ref"),
        Some(Value::Array(items)) => any_references(items),
        _ => false,
    }
}

fn any_references(items: &[Value]) -> bool {
    items.iter().any(|item| item.get("$ref").is_some())
}

/// Whether a subschema could be dropped from a list of alternatives.
fn is_optional_schema(schema: &Value) -> bool {
    match schema {
        Value::Bool(_) => true,
        Value::Object(map) => {
            if declared_types(map) == ["object"] {
                let no_required = match map.get("required") {
                    None => true,
                    Some(Value::Array(names)) => names.is_empty(),
                    Some(_) => false,
                };
                let min_properties = map.get("minProperties").and_then(Value::as_f64);
                no_required && min_properties.unwrap_or(0.0) == 0.0
            } else {
                !map.keys().any(|key| SCHEMA_KEYWORDS.contains(&key.as_str()))
            }
        }
        _ => false,
    }
}

fn declared_types(map: &Map<String, Value>) -> Vec<&str> {
    match map.get("type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Combinators whose only non-optional alternative contains a reference, e.g.
/// `{"allOf": [{"$ref": "#/components/schemas/User"}]}`.
fn single_reference_combinators(schema: &Map<String, Value>) -> Vec<&'static str> {
    COMBINATORS
        .iter()
        .copied()
        .filter(|keyword| {
            let Some(Value::Array(alternatives)) = schema.get(*keyword) else {
                return false;
            };
            let mut required = alternatives
                .iter()
                .filter(|alternative| !is_optional_schema(alternative));
            match (required.next(), required.next()) {
                (Some(Value::Object(only)), None) => has_references(only),
                _ => false,
            }
        })
        .collect()
}

fn collect_references(value: &Value, remaining: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                remaining.insert(reference.clone());
            }
            for child in map.values() {
                collect_references(child, remaining);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, remaining);
            }
        }
        _ => {}
    }
}
