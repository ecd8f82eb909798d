use serde_json::Value;
use tradeprompt_models::{IntentError, OrderIntent};

/// Locate the JSON object in a model reply.
///
/// Candidates are tried in order: the whole reply, the body of the first
/// fenced code block, then the first balanced `{...}` in surrounding prose.
/// The first candidate that parses as a JSON object wins.
pub fn extract_json(reply: &str) -> Result<Value, IntentError> {
    let reply = reply.trim();

    [Some(reply), fenced_block(reply), first_object(reply)]
        .into_iter()
        .flatten()
        .find_map(|candidate| {
            serde_json::from_str::<Value>(candidate)
                .ok()
                .filter(Value::is_object)
        })
        .ok_or_else(|| {
            IntentError::InvalidJson(format!(
                "no JSON object in completion ({} bytes)",
                reply.len()
            ))
        })
}

/// Body of the first ```` ``` ```` block. The language tag line is skipped.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let body = &after_fence[after_fence.find('\n')? + 1..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// The first balanced object starting at the first `{`. Braces inside
/// string literals do not count.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse and validate an order intent from raw completion text.
pub fn parse_order_intent(raw: &str) -> Result<OrderIntent, IntentError> {
    OrderIntent::from_value(&extract_json(raw)?)
}
