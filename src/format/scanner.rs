//! Splits a bracket template into `(literal, field)` segments.

use super::TemplateError;

/// A replacement field as written in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawField {
    pub name: String,
    pub conversion: Option<char>,
    pub spec: Option<String>,
    /// Byte offset of the opening brace.
    pub position: usize,
}

/// Literal text followed by an optional field. Only the final segment of a
/// template may lack a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawSegment {
    pub literal: String,
    pub field: Option<RawField>,
}

pub(crate) fn scan(template: &str) -> Result<Vec<RawSegment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }

                let mut body = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(TemplateError::NestedField { position }),
                        _ => body.push(c),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnterminatedField { position });
                }

                let field = parse_field(&body, position)?;
                segments.push(RawSegment {
                    literal: std::mem::take(&mut literal),
                    field: Some(field),
                });
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    literal.push('}');
                    continue;
                }
                return Err(TemplateError::LoneClosingBrace { position });
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(RawSegment {
            literal,
            field: None,
        });
    }

    Ok(segments)
}

/// Split `name[!conversion][:spec]`.
fn parse_field(body: &str, position: usize) -> Result<RawField, TemplateError> {
    let name_end = body.find(['!', ':']).unwrap_or(body.len());
    let name = body[..name_end].to_string();
    let mut rest = &body[name_end..];

    let mut conversion = None;
    if let Some(after) = rest.strip_prefix('!') {
        let mut it = after.chars();
        let c = it
            .next()
            .ok_or(TemplateError::MissingConversion { position })?;
        conversion = Some(c);
        rest = it.as_str();
        if !rest.is_empty() && !rest.starts_with(':') {
            return Err(TemplateError::ExpectedSpecAfterConversion { position });
        }
    }

    let spec = rest
        .strip_prefix(':')
        .filter(|spec| !spec.is_empty())
        .map(str::to_string);

    Ok(RawField {
        name,
        conversion,
        spec,
        position,
    })
}
