// server/src/web/responses.rs

//! Success envelopes: `{"message"?, "data": item}` and `{"message"?, "data": {"length", "items"}}`.

use serde::Serialize;
use serde_json::{json, Map, Value};

fn with_message(data: Value, message: Option<&str>) -> Value {
  let mut body = Map::new();
  if let Some(message) = message {
    body.insert("message".to_string(), Value::String(message.to_string()));
  }
  body.insert("data".to_string(), data);
  Value::Object(body)
}

pub fn singleton<T: Serialize>(item: &T, message: Option<&str>) -> Value {
  with_message(json!(item), message)
}

pub fn collection<T: Serialize>(items: &[T], message: Option<&str>) -> Value {
  with_message(json!({ "length": items.len(), "items": items }), message)
}
