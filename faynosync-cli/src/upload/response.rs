use serde_json::{Map, Value};

type Lookup = fn(&Map<String, Value>) -> Option<&str>;

// Known response shapes, most specific first.
const LOOKUPS: [Lookup; 3] = [flat_dotted_key, nested_upload_result, uploaded_id_key];

/// Pull the server-assigned id out of a successful upload response.
///
/// Returns an empty string when the body is not a JSON object or matches
/// none of the known shapes.
pub fn extract_uploaded_id(body: &[u8]) -> String {
    let Ok(Value::Object(root)) = serde_json::from_slice::<Value>(body) else {
        return String::new();
    };

    LOOKUPS
        .iter()
        .find_map(|lookup| lookup(&root))
        .map(|id| id.trim().to_string())
        .unwrap_or_default()
}

fn flat_dotted_key(root: &Map<String, Value>) -> Option<&str> {
    root.get("uploadResult.Uploaded")?.as_str()
}

fn nested_upload_result(root: &Map<String, Value>) -> Option<&str> {
    let nested = root.get("uploadResult")?.as_object()?;
    nested
        .get("Uploaded")
        .and_then(Value::as_str)
        .or_else(|| nested.get("uploaded").and_then(Value::as_str))
}

fn uploaded_id_key(root: &Map<String, Value>) -> Option<&str> {
    root.get("uploaded_id")?.as_str()
}
