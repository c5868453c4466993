// Copyright 2025 Cowboy AI, LLC.

//! One and two dimensional arrays

use super::Deserializer;
use crate::config::JaggedRowPolicy;
use crate::document::Node;
use crate::errors::SerializationError;
use crate::events::EventLevel;
use crate::registry::SemanticType;
use crate::value::{Grid, Value};

pub(super) fn deserialize_array(
    de: &Deserializer<'_>,
    node: &Node,
    element: &SemanticType,
    previous: Option<Value>,
    version: Option<&str>,
    upgraded: bool,
) -> Value {
    match node.unwrap_collection() {
        Node::Null => Value::Null,
        Node::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| de.deserialize(item, element, None, version, upgraded))
                .collect(),
        ),
        other => {
            let expected = SemanticType::array(element.clone()).to_string();
            de.report(EventLevel::Error, &SerializationError::shape(expected, other.to_string()));
            previous.unwrap_or_default()
        }
    }
}

/// Rows are read as 1-D arrays then packed into a rectangle
pub(super) fn deserialize_grid(
    de: &Deserializer<'_>,
    node: &Node,
    element: &SemanticType,
    previous: Option<Value>,
    version: Option<&str>,
    upgraded: bool,
) -> Value {
    let expected = || SemanticType::grid(element.clone()).to_string();

    let rows = match node.unwrap_collection() {
        Node::Null => return Value::Null,
        Node::Array(rows) => rows,
        other => {
            de.report(EventLevel::Error, &SerializationError::shape(expected(), other.to_string()));
            return previous.unwrap_or_default();
        }
    };

    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| match deserialize_array(de, row, element, None, version, upgraded) {
            Value::Array(cells) => cells,
            _ => Vec::new(),
        })
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if de.context().config().jagged_rows == JaggedRowPolicy::Reject
        && rows.iter().any(|row| row.len() != columns)
    {
        let lengths: Vec<String> = rows.iter().map(|row| row.len().to_string()).collect();
        de.report(
            EventLevel::Error,
            &SerializationError::shape(expected(), format!("rows of length {}", lengths.join(", "))),
        );
        return previous.unwrap_or_default();
    }

    let registry = de.registry();
    Value::Grid(Grid::from_rows_padded(rows, columns, || registry.default_value(element)))
}

#[cfg(test)]
mod tests {
    use crate::config::{JaggedRowPolicy, SerializerConfig};
    use crate::context::SerializationContext;
    use crate::document::Node;
    use crate::events::EventLog;
    use crate::registry::{SemanticType, TypeRegistry};
    use crate::value::Value;
    use std::sync::Arc;

    fn context(policy: JaggedRowPolicy, log: Arc<EventLog>) -> SerializationContext {
        SerializationContext::builder()
            .registry(Arc::new(TypeRegistry::new()))
            .sink(log)
            .config(SerializerConfig::default().with_jagged_rows(policy))
            .build()
            .unwrap()
    }

    fn read(ctx: &SerializationContext, json: &str, target: SemanticType) -> Value {
        let node = Node::from_json_str(json).unwrap();
        ctx.deserializer().deserialize(&node, &target, None, None, false)
    }

    /// ```mermaid
    /// graph LR
    ///     A["[[1,2,3],[4,5]]"] -->|PadToLongest| B["2x3, [1][2] = 0"]
    /// ```
    #[test]
    fn test_jagged_rows_are_padded() {
        let log = Arc::new(EventLog::new());
        let ctx = context(JaggedRowPolicy::PadToLongest, log.clone());

        let Value::Grid(grid) = read(&ctx, "[[1,2,3],[4,5]]", SemanticType::grid(SemanticType::Int)) else {
            panic!("Expected a grid");
        };
        assert_eq!((grid.rows(), grid.columns()), (2, 3));
        assert_eq!(grid.get(1, 1), Some(&Value::Int(5)));
        assert_eq!(grid.get(1, 2), Some(&Value::Int(0)));
        assert!(log.all_events().is_empty());
    }

    #[test]
    fn test_jagged_rows_rejected() {
        let log = Arc::new(EventLog::new());
        let ctx = context(JaggedRowPolicy::Reject, log.clone());

        let value = read(&ctx, "[[1,2,3],[4,5]]", SemanticType::grid(SemanticType::Int));
        assert_eq!(value, Value::Null);
        assert_eq!(log.errors().len(), 1);

        let Value::Grid(grid) = read(&ctx, "[[1,2],[3,4]]", SemanticType::grid(SemanticType::Int)) else {
            panic!("Expected a grid");
        };
        assert_eq!(grid.cells(), &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]);
    }

    #[test]
    fn test_wrapped_and_jagged_arrays() {
        let ctx = context(JaggedRowPolicy::PadToLongest, Arc::new(EventLog::new()));

        assert_eq!(
            read(&ctx, r#"{"_v": [1, 2]}"#, SemanticType::array(SemanticType::Float)),
            Value::Array(vec![Value::Float(1.0), Value::Float(2.0)])
        );
        assert_eq!(
            read(
                &ctx,
                "[[1], [], [2, 3]]",
                SemanticType::array(SemanticType::array(SemanticType::Int))
            ),
            Value::Array(vec![
                Value::Array(vec![Value::Int(1)]),
                Value::Array(vec![]),
                Value::Array(vec![Value::Int(2), Value::Int(3)]),
            ])
        );
    }

    #[test]
    fn test_non_array_keeps_previous() {
        let log = Arc::new(EventLog::new());
        let ctx = context(JaggedRowPolicy::PadToLongest, log.clone());
        let previous = Value::Array(vec![Value::Int(9)]);

        let value = ctx.deserializer().deserialize(
            &Node::from_json_str("12").unwrap(),
            &SemanticType::array(SemanticType::Int),
            Some(previous.clone()),
            None,
            false,
        );
        assert_eq!(value, previous);
        assert_eq!(log.errors().len(), 1);
    }

    #[test]
    fn test_bad_element_does_not_abort_array() {
        let log = Arc::new(EventLog::new());
        let ctx = context(JaggedRowPolicy::PadToLongest, log.clone());

        let value = read(&ctx, r#"[1, "two", 3]"#, SemanticType::array(SemanticType::Int));
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(0), Value::Int(3)]));
        assert_eq!(log.errors().len(), 1);
    }
}
