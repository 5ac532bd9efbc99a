//! Error record JSON body

use contracts::ErrorReport;
use serde_json::{Map, Value};

/// Encode an error report as a JSON object
///
/// Keys: `message`, `stack`, `details`, then every caller
/// detail with double quotes stripped from its key. Absent values are `""`,
/// never `null`. A detail key that collides with a fixed key overrides its value.
pub fn encode_error(report: &ErrorReport) -> String {
    let mut object = Map::new();
    object.insert("message".into(), text(Some(&report.message)));
    object.insert("stack".into(), text(report.stack.as_deref()));
    object.insert("details".into(), text(report.detail.as_deref()));

    for (key, value) in &report.details {
        object.insert(key.replace('"', ""), text(Some(value)));
    }

    Value::Object(object).to_string()
}

fn text(value: Option<&str>) -> Value {
    Value::String(value.unwrap_or_default().to_string())
}
