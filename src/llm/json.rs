//! Locating the JSON object inside a model reply.
//!
//! Models wrap answers in markdown fences or surround them with chatter.
//! Fenced blocks are searched first, then the whole reply; the first `{`
//! from which a complete JSON object can be read wins.

use serde_json::Value;

/// Return the first JSON object embedded in `response`, as written.
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    fenced_blocks(trimmed)
        .find_map(first_object)
        .or_else(|| first_object(trimmed))
}

/// Contents of each ```` ``` ```` fence, minus an info string such as `json`.
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split("```")
        .skip(1)
        .step_by(2)
        .map(|block| match block.split_once('\n') {
            Some((info, rest)) if !info.contains('{') => rest,
            _ => block,
        })
}

fn first_object(text: &str) -> Option<&str> {
    for (start, _) in text.match_indices('{') {
        let candidate = &text[start..];
        let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        if let Some(Ok(Value::Object(_))) = stream.next() {
            return Some(&candidate[..stream.byte_offset()]);
        }
    }
    None
}
