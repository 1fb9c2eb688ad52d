//! Parser: recovers a [`TimeValue`] from text shaped like a rendered template.
//!
//! One regex is built per flag: its value group followed by its parse
//! fragments. Flags with the most fixed literal text are matched first, and
//! each match is cut out of the working text before the next flag runs.

use std::cmp::Reverse;
use thiserror::Error;

use crate::format::{CompiledFormat, Flag, FragmentKey, ParseFragment};
use crate::models::{BaseFlag, Defaults, ExtraDefault, Sign, TimeValue};
use crate::render::RenderOptions;
use regex::Regex;

/// Errors that can occur while parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing default: {0}")]
    MissingDefault(String),

    #[error("Flag '{flag}' matched conflicting values: {matches:?}")]
    Ambiguous { flag: String, matches: Vec<String> },

    #[error("Invalid value '{value}' for flag '{flag}'")]
    InvalidNumber { flag: String, value: String },

    #[error("Invalid pattern for flag '{flag}': {source}")]
    Regex {
        flag: String,
        #[source]
        source: regex::Error,
    },
}

/// Pattern for one fragment, and how many fixed characters it contributes.
pub fn fragment_to_pattern(
    fragment: &ParseFragment,
    defaults: &Defaults,
) -> Result<(String, usize), ParseError> {
    let mut pattern = regex::escape(&fragment.pretext);
    let mut fixed = fragment.pretext.chars().count();

    match &fragment.key {
        None => {}
        Some(FragmentKey::Plural(plural)) => {
            pattern.push_str(&format!("(?:{})?", regex::escape(plural.suffix())));
        }
        Some(FragmentKey::Extra(name)) => match defaults.get(name) {
            None => return Err(ParseError::MissingDefault(name.clone())),
            Some(ExtraDefault::Computed(_)) => pattern.push_str(".*?"),
            Some(ExtraDefault::Literal(text)) if fragment.required => {
                fixed += text.chars().count();
                pattern.push_str(&regex::escape(text));
            }
            Some(ExtraDefault::Literal(text)) => {
                pattern.push_str(&format!("(?:{})?", regex::escape(text)));
            }
        },
    }

    Ok((pattern, fixed))
}

/// Compiled regex for a flag, and its fixed literal length.
pub fn flag_pattern(
    flag: &Flag,
    defaults: &Defaults,
    options: &RenderOptions,
) -> Result<(Regex, usize), ParseError> {
    let mut pattern = match flag.base() {
        BaseFlag::Sign => {
            // alternation is leftmost-first, so the longer literal must come first
            let mut signs = [options.plus.as_str(), options.minus.as_str()];
            signs.sort_by_key(|s| Reverse(s.len()));
            format!("({}|{})", regex::escape(signs[0]), regex::escape(signs[1]))
        }
        BaseFlag::Unit(_) => r"(\d+)".to_string(),
    };

    let mut fixed = 0;
    for fragment in flag.fragments() {
        let (piece, len) = fragment_to_pattern(fragment, defaults)?;
        pattern.push_str(&piece);
        fixed += len;
    }

    // rendered output is usually stripped, so trailing spaces are optional
    let pattern = pattern.trim_end();
    tracing::trace!("Pattern for flag '{}': {}", flag.key(), pattern);

    let regex = Regex::new(pattern).map_err(|source| ParseError::Regex {
        flag: flag.key().to_string(),
        source,
    })?;
    Ok((regex, fixed))
}

/// Parse `text` back into a time value using the flags of `compiled`.
pub fn parse(
    compiled: &CompiledFormat,
    text: &str,
    options: &RenderOptions,
    defaults: &Defaults,
) -> Result<TimeValue, ParseError> {
    tracing::debug!("Parsing '{}' with template '{}'", text, compiled.source());

    let mut patterns = compiled
        .flags()
        .iter()
        .map(|flag| flag_pattern(flag, defaults, options).map(|(re, len)| (flag, re, len)))
        .collect::<Result<Vec<_>, _>>()?;
    patterns.sort_by_key(|(_, _, len)| Reverse(*len));

    let mut working = text.to_string();
    let mut value = TimeValue::new();

    for (flag, regex, _) in patterns {
        let (span, captured) = {
            let matches: Vec<_> = regex.captures_iter(&working).collect();
            // empty matches only count when nothing else matched
            let Some(first) = matches
                .iter()
                .find(|captures| !captures[0].is_empty())
                .or_else(|| matches.first())
            else {
                tracing::trace!("Flag '{}' not present", flag.key());
                continue;
            };

            let mut distinct: Vec<String> = Vec::new();
            for captures in &matches {
                let whole = captures[0].to_string();
                if !whole.is_empty() && !distinct.contains(&whole) {
                    distinct.push(whole);
                }
            }
            if distinct.len() > 1 {
                return Err(ParseError::Ambiguous {
                    flag: flag.key().to_string(),
                    matches: distinct,
                });
            }

            let span = first.get(0).map(|m| m.range()).unwrap_or_default();
            let captured = first
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (span, captured)
        };

        match flag.base() {
            BaseFlag::Sign => {
                let sign = if captured == options.minus {
                    Sign::Negative
                } else {
                    Sign::Positive
                };
                value.set_sign(sign);
            }
            BaseFlag::Unit(unit) => {
                let number: i64 = captured.parse().map_err(|_| ParseError::InvalidNumber {
                    flag: flag.key().to_string(),
                    value: captured.clone(),
                })?;
                value.set(unit, Some(number));
            }
        }
        tracing::trace!("Flag '{}' matched '{}'", flag.key(), captured);

        working.replace_range(span, "");
    }

    Ok(value)
}
