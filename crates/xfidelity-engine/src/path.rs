use serde_json::Value;

/// A minimal JSONPath-flavored navigator: dot-separated segments with an
/// optional `[n]` array index suffix per segment, e.g. `dependencies[0].name`.
/// Narrower than full JSONPath (no wildcards, slices, or filters) but
/// covers the "navigate into the resolved fact value" use leaf conditions
/// actually need.
pub fn navigate(value: &Value, path: &str) -> Option<Value> {
    let mut current = value.clone();
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        let (key, index) = split_index(segment);
        if !key.is_empty() {
            current = current.get(key)?.clone();
        }
        if let Some(i) = index {
            current = current.get(i)?.clone();
        }
    }
    Some(current)
}

fn split_index(segment: &str) -> (&str, Option<usize>) {
    if let Some(start) = segment.find('[') {
        if let Some(end) = segment.find(']') {
            let key = &segment[..start];
            let index = segment[start + 1..end].parse::<usize>().ok();
            return (key, index);
        }
    }
    (segment, None)
}
