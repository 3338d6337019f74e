use crate::Value;

/// Non-recursive drop for deep trees.
///
/// Scripts can hand back arbitrarily nested tables; dropping the decoded
/// tree through the default recursive glue could exhaust the stack, so
/// containers are flattened onto a heap-allocated worklist instead.
pub fn safely(value: Value) {
    match value {
        Value::Array(_) | Value::Map(_) => {}
        _ => return,
    }

    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Array(array) => stack.extend(array),
            Value::Map(map) => stack.extend(map.into_iter().map(|(_, child)| child)),
            _ => {}
        }
    }
}
