use serde::{Deserialize, Serialize};

/// Parsed `@msg` template: literal text interleaved with `${...}` value
/// references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub source: String,
    pub parts: Vec<TemplatePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplatePart {
    Text(String),
    /// `${length}` reads from the actual value, `${$expected.length}` from
    /// the expected one.
    Value { expected: bool, path: Vec<String> },
}

pub const EXPECTED_ROOT: &str = "$expected";

impl MessageTemplate {
    /// Splits `source` into text and references. Errors carry the offending
    /// fragment.
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut parts = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("${") {
            if start > 0 {
                parts.push(TemplatePart::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| format!("unterminated reference in message `{source}`"))?;
            parts.push(parse_reference(after[..end].trim())?);
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            parts.push(TemplatePart::Text(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    pub fn references(&self) -> impl Iterator<Item = (bool, &[String])> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Value { expected, path } => Some((*expected, path.as_slice())),
            TemplatePart::Text(_) => None,
        })
    }
}

fn parse_reference(body: &str) -> Result<TemplatePart, String> {
    let mut segments: Vec<String> = if body.is_empty() {
        Vec::new()
    } else {
        body.split('.').map(|s| s.trim().to_string()).collect()
    };
    if segments.iter().any(|s| s.is_empty()) {
        return Err(format!("invalid message reference `${{{body}}}`"));
    }

    let expected = segments.first().is_some_and(|s| s == EXPECTED_ROOT);
    if expected {
        segments.remove(0);
    }
    if let Some(bad) = segments.iter().find(|s| s.starts_with('$')) {
        return Err(format!("unknown message reference `{bad}`"));
    }

    Ok(TemplatePart::Value {
        expected,
        path: segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_references() {
        let template =
            MessageTemplate::parse("Expected ${$expected.length} users but got ${length}")
                .unwrap();
        assert_eq!(
            template.parts,
            vec![
                TemplatePart::Text("Expected ".into()),
                TemplatePart::Value {
                    expected: true,
                    path: vec!["length".into()]
                },
                TemplatePart::Text(" users but got ".into()),
                TemplatePart::Value {
                    expected: false,
                    path: vec!["length".into()]
                },
            ]
        );
    }

    #[test]
    fn empty_reference_is_the_value_itself() {
        let template = MessageTemplate::parse("got ${}").unwrap();
        assert_eq!(
            template.parts[1],
            TemplatePart::Value {
                expected: false,
                path: vec![]
            }
        );
    }

    #[test]
    fn rejects_unterminated_and_unknown_references() {
        assert!(MessageTemplate::parse("got ${length").is_err());
        assert!(MessageTemplate::parse("got ${$actual}").is_err());
    }
}
