//! Property tests for the descriptor compiler over wire-decoded graphs.
//!
//! Wire definitions are generated with arbitrary optional-field presence;
//! the compiled descriptor must carry exactly the same keys at every level
//! (minus the fields that are deliberately not projected: `effect`, `out`),
//! and compiling twice must give byte-identical JSON.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use studio_schema::{compile, SchemaNode};

/// Keys of a wire definition that never appear in a descriptor.
const UNPROJECTED: &[&str] = &["effect", "out"];

fn bound() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        (0u64..16).prop_map(|v| json!({"value": v})),
        (0u64..16, "[a-z ]{1,12}").prop_map(|(v, m)| json!({"value": v, "message": m})),
    ]
}

fn check() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0i64..100).prop_map(|v| json!({"kind": "min", "value": v, "inclusive": true})),
        "[a-z]{1,6}".prop_map(|re| json!({"kind": "regex", "regex": re, "message": "bad"})),
        Just(json!({"kind": "email"})),
    ]
}

fn scalar() -> impl Strategy<Value = Value> {
    let names = prop_oneof![
        Just("ZodString"),
        Just("ZodNumber"),
        Just("ZodBoolean"),
        Just("ZodDate"),
        Just("ZodNull"),
        Just("ZodAny"),
    ];
    (
        names,
        proptest::option::of(prop::collection::vec(check(), 0..3)),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(name, checks, coerce)| {
            let mut def = Map::new();
            def.insert("typeName".into(), json!(name));
            if let Some(checks) = checks {
                def.insert("checks".into(), Value::Array(checks));
            }
            if let Some(coerce) = coerce {
                def.insert("coerce".into(), json!(coerce));
            }
            Value::Object(def)
        })
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => scalar(),
        1 => "[a-z]{0,5}".prop_map(|s| json!({"typeName": "ZodLiteral", "value": s})),
        1 => prop::collection::vec("[a-z]{1,5}", 1..4)
            .prop_map(|v| json!({"typeName": "ZodEnum", "values": v})),
    ]
}

fn wire_schema() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            (inner.clone(), bound(), bound(), bound()).prop_map(|(t, e, min, max)| {
                json!({
                    "typeName": "ZodArray",
                    "type": t,
                    "exactLength": e,
                    "minLength": min,
                    "maxLength": max,
                })
            }),
            (
                prop::collection::btree_map("[a-z]{1,6}", inner.clone(), 0..4),
                proptest::option::of(prop_oneof![
                    Just("strip"),
                    Just("strict"),
                    Just("passthrough")
                ]),
                proptest::option::of(inner.clone()),
            )
                .prop_map(|(shape, unknown_keys, catchall)| {
                    let mut def = Map::new();
                    def.insert("typeName".into(), json!("ZodObject"));
                    def.insert("shape".into(), Value::Object(shape.into_iter().collect()));
                    if let Some(policy) = unknown_keys {
                        def.insert("unknownKeys".into(), json!(policy));
                    }
                    if let Some(catchall) = catchall {
                        def.insert("catchall".into(), catchall);
                    }
                    Value::Object(def)
                }),
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|options| json!({"typeName": "ZodUnion", "options": options})),
            (inner.clone(), inner.clone())
                .prop_map(|(l, r)| json!({"typeName": "ZodIntersection", "left": l, "right": r})),
            (prop::collection::vec(inner.clone(), 0..3), proptest::option::of(inner.clone()))
                .prop_map(|(items, rest)| {
                    let mut def = json!({"typeName": "ZodTuple", "items": items});
                    if let Some(rest) = rest {
                        def["rest"] = rest;
                    }
                    def
                }),
            (inner.clone(), inner.clone())
                .prop_map(|(k, v)| json!({"typeName": "ZodRecord", "keyType": k, "valueType": v})),
            (
                prop_oneof![
                    Just("ZodOptional"),
                    Just("ZodNullable"),
                    Just("ZodCatch"),
                    Just("ZodReadonly")
                ],
                inner.clone(),
            )
                .prop_map(|(name, i)| json!({"typeName": name, "innerType": i})),
            inner
                .clone()
                .prop_map(|i| json!({"typeName": "ZodDefault", "innerType": i, "defaultValue": 7})),
            inner.clone().prop_map(|s| {
                json!({"typeName": "ZodEffects", "schema": s, "effect": {"type": "refinement"}})
            }),
            (inner.clone(), inner)
                .prop_map(|(i, o)| json!({"typeName": "ZodPipeline", "in": i, "out": o})),
        ]
    })
}

/// Assert that `descriptor` has the same key set as `wire` at every level.
fn assert_mirrors(wire: &Value, descriptor: &Value) -> Result<(), TestCaseError> {
    match (wire, descriptor) {
        (Value::Object(w), Value::Object(d)) if w.contains_key("typeName") => {
            let mut expected: Vec<&String> = w
                .keys()
                .filter(|k| !UNPROJECTED.contains(&k.as_str()))
                .collect();
            let mut actual: Vec<&String> = d.keys().collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(expected, actual, "key sets differ for {}", w["typeName"]);

            for (key, child) in w {
                if UNPROJECTED.contains(&key.as_str()) {
                    continue;
                }
                match key.as_str() {
                    "shape" => {
                        let (ws, ds) = (child.as_object().unwrap(), d[key].as_object().unwrap());
                        prop_assert_eq!(
                            ws.keys().collect::<Vec<_>>(),
                            ds.keys().collect::<Vec<_>>()
                        );
                        for (field, schema) in ws {
                            assert_mirrors(schema, &ds[field])?;
                        }
                    }
                    "options" | "items" => {
                        let (wl, dl) = (child.as_array().unwrap(), d[key].as_array().unwrap());
                        prop_assert_eq!(wl.len(), dl.len());
                        for (a, b) in wl.iter().zip(dl) {
                            assert_mirrors(a, b)?;
                        }
                    }
                    "type" | "catchall" | "left" | "right" | "rest" | "keyType" | "valueType"
                    | "schema" | "innerType" | "in" => assert_mirrors(child, &d[key])?,
                    _ => {}
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

proptest! {
    #[test]
    fn descriptor_field_presence_mirrors_source(wire in wire_schema()) {
        let node = SchemaNode::from_wire(&wire).unwrap();
        let descriptor = serde_json::to_value(compile(&node)).unwrap();
        assert_mirrors(&wire, &descriptor)?;
    }

    #[test]
    fn compile_is_deterministic(wire in wire_schema()) {
        let node = SchemaNode::from_wire(&wire).unwrap();
        let a = serde_json::to_vec(&compile(&node)).unwrap();
        let b = serde_json::to_vec(&compile(&node)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn scalar_checks_round_trip_verbatim(wire in scalar()) {
        let node = SchemaNode::from_wire(&wire).unwrap();
        let descriptor = serde_json::to_value(compile(&node)).unwrap();
        prop_assert_eq!(&descriptor, &wire);
    }
}
