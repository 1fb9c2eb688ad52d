//! Renderer: substitutes per-unit values and decorator text into a compiled
//! template.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::format::{CompiledFormat, Flag, Segment};
use crate::models::{BaseFlag, BoxError, ComputeFn, Defaults, ExtraDefault, Sign, TimeValue, Unit};

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Missing default: {0}")]
    MissingDefault(String),

    #[error("Extra '{name}' failed to compute: {source}")]
    ExtraCompute {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Time span out of range: {0}")]
    OutOfRange(String),
}

/// Knobs that control rendering (and, for the sign literals, parsing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Blank out units whose value is zero, with their decorators and text.
    pub remove_empty: bool,

    /// Trim surrounding whitespace from the result.
    pub strip: bool,

    /// Ceiling for every unit value; the excess moves to finer units.
    /// `Some(0)` means no ceiling.
    pub max_value: Option<u64>,

    /// Render a placeholder instead of failing when a computed extra errors.
    pub ignore_extra_errors: bool,

    /// Text for `{z}` when the span is non-negative.
    pub plus: String,

    /// Text for `{z}` when the span is negative.
    pub minus: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            remove_empty: true,
            strip: true,
            max_value: None,
            ignore_extra_errors: false,
            plus: "+".to_string(),
            minus: "-".to_string(),
        }
    }
}

impl RenderOptions {
    pub fn sign_text(&self, sign: Sign) -> &str {
        match sign {
            Sign::Positive => &self.plus,
            Sign::Negative => &self.minus,
        }
    }
}

/// A resolved substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Number(i64),
    Text(String),
    /// Belongs to a removed unit; never padded.
    Empty,
}

struct PendingExtra {
    key: String,
    name: String,
    compute: Arc<ComputeFn>,
}

/// Render `microseconds` through a compiled template.
///
/// Fails with [`RenderError::OutOfRange`] when a single unit value does not
/// fit in an `i64`, which only happens for `i64::MIN` rendered into a
/// microsecond-only template.
pub fn render(
    compiled: &CompiledFormat,
    microseconds: i64,
    options: &RenderOptions,
    defaults: &Defaults,
) -> Result<String, RenderError> {
    tracing::debug!("Rendering '{}' from {} microseconds", compiled.source(), microseconds);

    let sign = Sign::of(microseconds);
    let mut remaining = microseconds.unsigned_abs();
    let mut time_value = TimeValue::new().with_sign(sign);
    let mut values: HashMap<String, Value> = HashMap::new();
    let mut emptied: HashSet<BaseFlag> = HashSet::new();
    let mut pending: Vec<PendingExtra> = Vec::new();

    for unit in Unit::ALL {
        let Some(flag) = compiled.flags().get(BaseFlag::Unit(unit)) else {
            continue;
        };

        let size = unit.microseconds().unsigned_abs();
        let mut value = remaining / size;
        remaining %= size;
        if let Some(max) = options.max_value.filter(|&max| max > 0) {
            if value > max {
                // excess is only kept if a finer unit picks it up
                remaining += (value - max) * size;
                value = max;
            }
        }

        let value = i64::try_from(value)
            .map_err(|_| RenderError::OutOfRange(format!("{} {}", value, unit.name())))?;
        time_value.set(unit, Some(value));
        tracing::trace!("Computed {} = {}", unit, value);

        if value == 0 && options.remove_empty {
            emptied.insert(flag.base());
            for key in flag.keys() {
                values.insert(key, Value::Empty);
            }
            continue;
        }

        values.insert(flag.key().to_string(), Value::Number(value));
        resolve_extras(flag, defaults, &mut values, &mut pending)?;
        for plural in flag.plurals() {
            values.insert(
                flag.plural_key(plural),
                Value::Text(plural.resolve(value).to_string()),
            );
        }
    }

    if let Some(flag) = compiled.flags().get(BaseFlag::Sign) {
        values.insert(
            flag.key().to_string(),
            Value::Text(options.sign_text(sign).to_string()),
        );
        resolve_extras(flag, defaults, &mut values, &mut pending)?;
        for plural in flag.plurals() {
            values.insert(flag.plural_key(plural), Value::Text(String::new()));
        }
    }

    for extra in pending {
        let text = evaluate(&extra.name, extra.compute.as_ref(), &time_value, options)?;
        values.insert(extra.key, Value::Text(text));
    }

    let mut out = String::new();
    for segment in compiled.template().segments() {
        match segment {
            Segment::Literal { text, owner } => {
                if owner.is_some_and(|owner| emptied.contains(&owner)) {
                    continue;
                }
                out.push_str(text);
            }
            Segment::Field(field) => match values.get(field.key()) {
                Some(Value::Number(n)) => out.push_str(&field.format(&n.to_string(), true)),
                Some(Value::Text(text)) => out.push_str(&field.format(text, false)),
                Some(Value::Empty) => {}
                None => {
                    let text = resolve_raw(field.key(), defaults, &time_value, options)?;
                    out.push_str(&field.format(&text, false));
                }
            },
        }
    }

    if options.strip {
        Ok(out.trim().to_string())
    } else {
        Ok(out)
    }
}

/// Literal extras are stored immediately; computed ones wait for the full
/// time value.
fn resolve_extras(
    flag: &Flag,
    defaults: &Defaults,
    values: &mut HashMap<String, Value>,
    pending: &mut Vec<PendingExtra>,
) -> Result<(), RenderError> {
    for extra in flag.extras() {
        let key = flag.extra_key(extra);
        match defaults.get(extra) {
            Some(ExtraDefault::Literal(text)) => {
                values.insert(key, Value::Text(text.clone()));
            }
            Some(ExtraDefault::Computed(compute)) => pending.push(PendingExtra {
                key,
                name: extra.to_string(),
                compute: Arc::clone(compute),
            }),
            None => return Err(RenderError::MissingDefault(extra.to_string())),
        }
    }
    Ok(())
}

/// Keys the compiler passed through untouched come straight from the defaults.
fn resolve_raw(
    key: &str,
    defaults: &Defaults,
    time_value: &TimeValue,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    match defaults.get(key) {
        Some(ExtraDefault::Literal(text)) => Ok(text.clone()),
        Some(ExtraDefault::Computed(compute)) => {
            evaluate(key, compute.as_ref(), time_value, options)
        }
        None => Err(RenderError::MissingDefault(key.to_string())),
    }
}

fn evaluate(
    name: &str,
    compute: &ComputeFn,
    time_value: &TimeValue,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    match compute(time_value) {
        Ok(text) => Ok(text),
        Err(source) if options.ignore_extra_errors => {
            tracing::warn!("Extra '{}' failed to compute: {}", name, source);
            Ok(format!("<computed {}>", name))
        }
        Err(source) => Err(RenderError::ExtraCompute {
            name: name.to_string(),
            source,
        }),
    }
}
