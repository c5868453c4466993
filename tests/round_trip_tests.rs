// Copyright 2025 Cowboy AI, LLC.

//! Property tests: serialise, write JSON, read back, compare

mod common;

use std::sync::Arc;

use common::*;
use habitat_serialization::{
    deserialize_as, to_json, CustomData, EventLog, FragmentSet, Grid, IntoValue, NoUpgrade, Value,
};
use proptest::prelude::*;

/// Floats with short exact decimal forms
fn quarter() -> impl Strategy<Value = f64> {
    (-40_000i32..40_000).prop_map(|v| f64::from(v) / 4.0)
}

/// Any finite float, signed zeros and subnormals included
fn finite() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::SUBNORMAL
}

fn restraint() -> impl Strategy<Value = Restraint> {
    prop_oneof![Just(Restraint::Free), Just(Restraint::Pinned), Just(Restraint::Fixed)]
}

fn structural_node() -> impl Strategy<Value = StructuralNode> {
    ("[A-Z][0-9]{1,3}", quarter(), quarter(), restraint()).prop_map(|(name, x, z, support)| StructuralNode {
        name,
        position: Point { x, y: 0.0, z },
        support,
        custom_data: CustomData::new(),
    })
}

fn custom_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "\\PC{0,16}".prop_map(Value::String),
    ]
}

fn custom_data() -> impl Strategy<Value = CustomData> {
    prop::collection::vec(("[A-Z][a-z]{1,8}", custom_value()), 0..4)
        .prop_map(|entries| entries.into_iter().collect())
}

fn fragments() -> impl Strategy<Value = FragmentSet> {
    (
        prop::option::of("\\PC{0,12}"),
        prop::option::of(("S[0-9]{3}", quarter())),
    )
        .prop_map(|(label, material)| {
            let mut set = FragmentSet::new();
            if let Some(label) = label {
                set.push(Tag { label }).unwrap();
            }
            if let Some((grade, density)) = material {
                set.push(Material { grade, density }).unwrap();
            }
            set
        })
}

fn bar() -> impl Strategy<Value = Bar> {
    (
        "\\PC{0,24}",
        quarter(),
        prop::option::of(structural_node()),
        prop::option::of(structural_node()),
        prop::collection::vec("[a-z]{1,6}", 0..4),
        fragments(),
        custom_data(),
    )
        .prop_map(|(name, length, start, end, tags, fragments, custom_data)| Bar {
            name,
            length,
            start,
            end,
            tags,
            fragments,
            custom_data,
        })
}

fn section() -> impl Strategy<Value = Section> {
    (1usize..4, 1usize..4)
        .prop_flat_map(|(rows, columns)| {
            (
                "[A-Z]{2}",
                prop::collection::vec(quarter(), rows * columns).prop_map(move |cells| {
                    Grid::new(rows, columns, cells).unwrap()
                }),
            )
        })
        .prop_map(|(name, samples)| Section { name, samples })
}

proptest! {
    #[test]
    fn test_bar_round_trip(original in bar()) {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone(), Arc::new(NoUpgrade));

        let json = to_json(&ctx, &original.clone().into_value()).unwrap();
        let restored: Bar = deserialize_as(&ctx, &json).unwrap();

        prop_assert_eq!(restored, original);
        prop_assert!(log.all_events().is_empty(), "events: {:?}", log.all_events());
    }

    #[test]
    fn test_section_round_trip(original in section()) {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone(), Arc::new(NoUpgrade));

        let json = to_json(&ctx, &original.clone().into_value()).unwrap();
        let restored: Section = deserialize_as(&ctx, &json).unwrap();

        prop_assert_eq!(restored, original);
        prop_assert!(log.all_events().is_empty());
    }

    #[test]
    fn test_finite_floats_survive_bit_for_bit(length in finite(), x in finite(), z in finite()) {
        let ctx = context(Arc::new(EventLog::new()), Arc::new(NoUpgrade));
        let original = Bar {
            length,
            start: Some(StructuralNode {
                position: Point { x, y: 0.0, z },
                ..node("N1", 0.0, Restraint::Free)
            }),
            ..Bar::default()
        };

        let json = to_json(&ctx, &original.clone().into_value()).unwrap();
        let restored: Bar = deserialize_as(&ctx, &json).unwrap();

        prop_assert_eq!(restored.length.to_bits(), length.to_bits(), "json: {}", json);
        let position = restored.start.unwrap().position;
        prop_assert_eq!(position.x.to_bits(), x.to_bits());
        prop_assert_eq!(position.z.to_bits(), z.to_bits());
    }
}

#[test]
fn test_custom_data_with_reserved_keys_round_trips() {
    let log = Arc::new(EventLog::new());
    let ctx = context(log.clone(), Arc::new(NoUpgrade));
    let mut original = Bar {
        name: "b1".to_string(),
        ..Bar::default()
    };
    original.custom_data.insert("_v".to_string(), Value::Int(1));
    original.custom_data.insert("_t".to_string(), Value::String("Structure.Node".to_string()));
    original.custom_data.insert("k".to_string(), Value::Int(2));

    let json = to_json(&ctx, &original.clone().into_value()).unwrap();
    let restored: Bar = deserialize_as(&ctx, &json).unwrap();

    assert_eq!(restored, original);
    assert!(log.all_events().is_empty(), "events: {:?}", log.all_events());
}
