//! JSON extraction for model output
//!
//! Models asked for JSON still wrap it in code fences, prepend a sentence,
//! or leave a trailing comma. These helpers recover the value when possible.

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{DigestError, Result};

/// Extract and parse JSON from a raw model response
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    JsonRepairer::new().parse_or_repair(content)
}

/// JSON repair strategies
#[derive(Debug, Default)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Parse JSON, attempting repair if the initial parse fails
    pub fn parse_or_repair(&self, raw: &str) -> Result<Value> {
        let cleaned = self.preprocess(raw);

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Ok(value);
        }

        debug!("Initial JSON parse failed, attempting repair");

        let repaired = self.fix_trailing_commas(&cleaned);
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            warn!("JSON repaired (trailing commas)");
            return Ok(value);
        }

        if let Some(extracted) = self.extract_json_from_mixed(&repaired)
            && let Ok(value) = serde_json::from_str::<Value>(&extracted)
        {
            warn!("JSON extracted from mixed content");
            return Ok(value);
        }

        Err(DigestError::generation(
            "parse",
            format!(
                "model response is not valid JSON. Content preview: {}...",
                cleaned.chars().take(200).collect::<String>()
            ),
        ))
    }

    fn preprocess(&self, raw: &str) -> String {
        let s = raw.trim().trim_start_matches('\u{feff}');
        self.strip_code_fences(s).trim().to_string()
    }

    /// Strip markdown code fences
    fn strip_code_fences(&self, s: &str) -> String {
        let mut result = s.to_string();

        // ```json ... ``` or ``` ... ```
        if result.starts_with("```")
            && let Some(first_newline) = result.find('\n')
        {
            result = result[first_newline + 1..].to_string();
        }

        if result.ends_with("```") {
            result = result[..result.len() - 3].trim_end().to_string();
        }

        result
    }

    /// Fix trailing commas before ] or } (outside strings)
    fn fix_trailing_commas(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                ',' if !in_string => {
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next, Some(']') | Some('}')) {
                        continue;
                    }
                }
                _ => {}
            }
            result.push(ch);
        }

        result
    }

    /// Slice from the first opening brace/bracket to its matching closer
    fn extract_json_from_mixed(&self, s: &str) -> Option<String> {
        let start = s.find(['{', '['])?;
        let open = s[start..].chars().next()?;
        let close = if open == '{' { '}' } else { ']' };

        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape = false;

        for (offset, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                c if c == open && !in_string => depth += 1,
                c if c == close && !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(s[start..start + offset + ch.len_utf8()].to_string());
                    }
                }
                _ => {}
            }
        }

        None
    }
}
