//! Integration tests for synthesized schema execution.
//!
//! These tests verify the complete flow: a descriptor registry is turned
//! into a dynamic schema, then real queries, mutations, and subscriptions
//! are executed against it.

use async_graphql::{Name, Value};
use futures_util::StreamExt;
use gqlsynth::{
    RequestContext, RetValue, SchemaSynthesizer, SlotValue, TypeDesc, TypeSet,
};
use indexmap::IndexMap;
use serde_json::json;

// =============================================================================
// Fixture: a small widget catalog
// =============================================================================

fn widget_value(id: &str, name: &str) -> Value {
    let mut object = IndexMap::new();
    object.insert(Name::new("ID"), Value::String(id.to_string()));
    object.insert(Name::new("Name"), Value::String(name.to_string()));
    object.insert(
        Name::new("CreatedAt"),
        Value::String("2024-01-15T10:30:00Z".to_string()),
    );
    object.insert(
        Name::new("Tags"),
        Value::List(vec![Value::String("new".into())]),
    );
    if name == "gizmo" {
        let mut parent = IndexMap::new();
        parent.insert(Name::new("ID"), Value::String("w-0".to_string()));
        parent.insert(Name::new("Name"), Value::String("root".to_string()));
        object.insert(Name::new("Parent"), Value::Object(parent));
    }
    Value::Object(object)
}

fn input_name(slot: &SlotValue) -> Option<String> {
    let Value::Object(object) = slot.as_data()? else {
        return None;
    };
    match object.get("Name") {
        Some(Value::String(name)) => Some(name.clone()),
        _ => None,
    }
}

fn widget_types() -> TypeSet {
    let mut types = TypeSet::new();

    types.object("Widget", |o| {
        o.field("ID", "id,nonNull", TypeDesc::String);
        o.field("Name", "name", TypeDesc::String);
        o.field("CreatedAt", "createdAt", TypeDesc::timestamp());
        o.field("Tags", "tags", TypeDesc::list(TypeDesc::String));
        o.field(
            "Parent",
            "parent",
            TypeDesc::optional(TypeDesc::object("Widget")),
        );
        o.field("Secret", "-", TypeDesc::String);
        o.field("internal", "", TypeDesc::Int);
        // Plain getter: no parameters, no error return.
        o.method("display_name", |m| {
            m.returns(TypeDesc::String).invoke(|slots| {
                let name = slots.first().and_then(SlotValue::as_data).and_then(
                    |widget| match widget {
                        Value::Object(object) => object.get("Name").cloned(),
                        _ => None,
                    },
                );
                match name {
                    Some(Value::String(name)) => {
                        vec![RetValue::Data(Value::String(format!("Widget {name}")))]
                    }
                    _ => vec![RetValue::Data(Value::Null)],
                }
            });
        });
    });

    types.object("WidgetFilter", |o| {
        o.field("Name", "name,nonNull", TypeDesc::String);
        o.field("Limit", "limit", TypeDesc::Int);
    });

    types.object("Query", |o| {
        o.field("Version", "version", TypeDesc::String);
        o.method("get_widget", |m| {
            m.resolver()
                .param(TypeDesc::Context)
                .param(TypeDesc::object("WidgetFilter"))
                .returns(TypeDesc::optional(TypeDesc::object("Widget")))
                .returns(TypeDesc::Error)
                .invoke(|slots| {
                    let Some(name) = slots.iter().find_map(input_name) else {
                        return vec![RetValue::err("filter is required")];
                    };
                    if name == "missing" {
                        return vec![RetValue::err("widget not found: missing")];
                    }
                    if name == "none" {
                        return vec![RetValue::Data(Value::Null), RetValue::ok()];
                    }
                    vec![
                        RetValue::Data(widget_value("w-1", &name)),
                        RetValue::ok(),
                    ]
                });
        });
        o.method("whoami", |m| {
            m.resolver()
                .param(TypeDesc::Context)
                .returns(TypeDesc::String)
                .invoke(|slots| {
                    let user = slots
                        .iter()
                        .find_map(SlotValue::as_context)
                        .and_then(|ctx| ctx.get("user"))
                        .cloned()
                        .unwrap_or(Value::String("anonymous".into()));
                    vec![RetValue::Data(user)]
                });
        });
        o.function("api_version", |m| {
            m.returns(TypeDesc::String)
                .invoke(|_| vec![RetValue::Data(Value::String("1.0".into()))]);
        });
        o.method("where_am_i", |m| {
            m.resolver()
                .param(TypeDesc::Info)
                .returns(TypeDesc::String)
                .invoke(|slots| {
                    let Some(info) = slots.iter().find_map(SlotValue::as_info) else {
                        return vec![RetValue::err("no query info")];
                    };
                    vec![RetValue::Data(Value::String(format!(
                        "{}.{}",
                        info.parent_type, info.field_name
                    )))]
                });
        });
    });

    types.object("Mutation", |o| {
        o.method("create_widget", |m| {
            m.resolver()
                .param(TypeDesc::object("WidgetFilter"))
                .returns(TypeDesc::object("Widget"))
                .returns(TypeDesc::Error)
                .invoke(|slots| {
                    let Some(name) = slots.iter().find_map(input_name) else {
                        return vec![RetValue::err("name is required")];
                    };
                    vec![
                        RetValue::Data(widget_value("w-9", &name)),
                        RetValue::ok(),
                    ]
                });
        });
    });

    types.object("Subscription", |o| {
        o.method("ticker", |m| {
            m.resolver()
                .returns(TypeDesc::Int)
                .invoke(|_| vec![RetValue::Data(Value::Number(1.into()))]);
        });
    });

    types
}

fn build_schema() -> async_graphql::dynamic::Schema {
    SchemaSynthesizer::new(widget_types())
        .query("Query")
        .mutation("Mutation")
        .subscription("Subscription")
        .build()
        .expect("schema should build")
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_widget_query_end_to_end() {
    let schema = build_schema();
    let response = schema
        .execute(r#"{ getWidget(name: "gizmo") { id name tags createdAt } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().expect("should have data");
    assert_eq!(
        data,
        json!({
            "getWidget": {
                "id": "w-1",
                "name": "gizmo",
                "tags": ["new"],
                "createdAt": "2024-01-15T10:30:00Z",
            }
        })
    );
}

#[tokio::test]
async fn test_cyclic_parent_traversal() {
    let schema = build_schema();
    let response = schema
        .execute(r#"{ getWidget(name: "gizmo") { id parent { id name parent { id } } } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["getWidget"]["parent"]["id"], json!("w-0"));
    assert_eq!(data["getWidget"]["parent"]["parent"], json!(null));
}

#[tokio::test]
async fn test_absent_optional_object_field_is_null() {
    let schema = build_schema();
    // "sprocket" widgets carry no parent; the optional object field must
    // render as null, not as an object with null leaves.
    let response = schema
        .execute(r#"{ getWidget(name: "sprocket") { id parent { id } } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(
        data,
        json!({ "getWidget": { "id": "w-1", "parent": null } })
    );
}

#[tokio::test]
async fn test_null_resolver_output_renders_null() {
    let schema = build_schema();
    let response = schema
        .execute(r#"{ getWidget(name: "none") { id name } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "getWidget": null })
    );
}

#[tokio::test]
async fn test_computed_getter_field() {
    let schema = build_schema();
    let response = schema
        .execute(r#"{ getWidget(name: "gizmo") { displayName } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "getWidget": { "displayName": "Widget gizmo" } })
    );
}

#[tokio::test]
async fn test_unbound_function_field() {
    let schema = build_schema();
    let response = schema.execute("{ apiVersion }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "apiVersion": "1.0" })
    );
}

#[tokio::test]
async fn test_excluded_fields_are_absent() {
    let schema = build_schema();
    let sdl = schema.sdl();
    assert!(sdl.contains("id: String!"));
    assert!(!sdl.contains("secret"));
    assert!(!sdl.contains("Secret"));
    assert!(!sdl.contains("internal"));

    // Asking for the hidden field is a validation error.
    let response = schema
        .execute(r#"{ getWidget(name: "gizmo") { secret } }"#)
        .await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_missing_non_null_argument_rejected_before_resolver() {
    let schema = build_schema();
    let response = schema.execute("{ getWidget { id } }").await;
    assert!(!response.errors.is_empty());
    // Validation failed, so nothing resolved.
    assert_eq!(response.data, Value::Null);
}

#[tokio::test]
async fn test_resolver_error_is_per_field() {
    let schema = build_schema();
    let response = schema
        .execute(r#"{ version getWidget(name: "missing") { id } }"#)
        .await;
    assert_eq!(response.errors.len(), 1);
    assert!(
        response.errors[0]
            .message
            .contains("widget not found: missing")
    );
    // The failing field is nullable, so the sibling still resolves.
    let data = response.data.into_json().unwrap();
    assert_eq!(data["getWidget"], json!(null));
}

#[tokio::test]
async fn test_request_context_injection() {
    let schema = build_schema();
    let context = RequestContext::builder()
        .value("user", Value::String("alice".into()))
        .build();
    let request = async_graphql::Request::new("{ whoami }").data(context);
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "whoami": "alice" })
    );
}

#[tokio::test]
async fn test_missing_context_defaults_to_empty() {
    let schema = build_schema();
    let response = schema.execute("{ whoami }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "whoami": "anonymous" })
    );
}

#[tokio::test]
async fn test_query_info_describes_field() {
    let schema = build_schema();
    let response = schema.execute("{ whereAmI }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "whereAmI": "Query.whereAmI" })
    );
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_mutation_round_trip() {
    let schema = build_schema();
    let response = schema
        .execute(r#"mutation { createWidget(name: "sprocket") { id name } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "createWidget": { "id": "w-9", "name": "sprocket" } })
    );
}

// =============================================================================
// Subscriptions
// =============================================================================

#[tokio::test]
async fn test_subscription_yields_resolved_value() {
    let schema = build_schema();
    let mut stream = schema.execute_stream("subscription { ticker }");
    let response = stream.next().await.expect("stream should yield");
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "ticker": 1 })
    );
}

// =============================================================================
// Schema surface
// =============================================================================

#[tokio::test]
async fn test_sdl_surface() {
    let schema = build_schema();
    let sdl = schema.sdl();
    assert!(sdl.contains("scalar DateTime"));
    assert!(sdl.contains("createdAt: DateTime"));
    assert!(sdl.contains("type Widget"));
    assert!(sdl.contains("parent: Widget"));
    // Input object fields flatten into arguments.
    assert!(sdl.contains("name: String!"));
    assert!(sdl.contains("limit: Int"));
    assert!(sdl.contains("type Subscription"));
}
