//! Template compiler.
//!
//! Scans a bracket template once, classifies every placeholder, builds the
//! [`FlagTable`] and rewrites the template into its normalized form:
//!
//! - `{w}`: a base unit (or `{z}` for the sign). Opens the flag.
//! - `{p}`, `{eP}`, ...: a plural decorator of the open flag.
//! - `{wL.w}` / `{w.wL}`: a decorator bound to an explicit parent.
//! - `{_raw}`: passed through untouched.
//! - anything else: an extra decorator of the open flag.
//!
//! Decorators are rewritten to parent-mangled keys (`_w__wL`), so compiling
//! a normalized template again yields the same table and text.

mod flags;
mod scanner;
mod spec;

pub use flags::*;
pub use spec::{Align, Conversion, FormatSpec};

use std::fmt;
use thiserror::Error;

use crate::models::{BaseFlag, PluralFlag};
use scanner::{RawField, RawSegment};

/// Prefix marking a key the compiler must not interpret.
pub const RAW_PREFIX: char = '_';

/// Separator between a decorator and its explicit parent.
pub const PARENT_SEPARATOR: char = '.';

/// Errors raised while compiling a template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unterminated field starting at byte {position}")]
    UnterminatedField { position: usize },

    #[error("Single '}}' encountered at byte {position}")]
    LoneClosingBrace { position: usize },

    #[error("Nested fields are not supported (field at byte {position})")]
    NestedField { position: usize },

    #[error("Missing conversion character after '!' (field at byte {position})")]
    MissingConversion { position: usize },

    #[error("Expected ':' after conversion specifier (field at byte {position})")]
    ExpectedSpecAfterConversion { position: usize },

    #[error("Unknown conversion '!{conversion}' for field '{field}'")]
    InvalidConversion { field: String, conversion: char },

    #[error("Unsupported format spec ':{spec}' for field '{field}'")]
    InvalidSpec { field: String, spec: String },

    #[error("Positional fields are not allowed (field at byte {position})")]
    PositionalField { position: usize },

    #[error("Flag '{0}' names a parent but no valid base flag was found")]
    UnknownParent(String),

    #[error("Flag '{0}' names a base flag as its child")]
    BaseFlagAsChild(String),

    #[error(
        "Flag '{0}' used before any base flag; specify a parent or prefix the name with an underscore"
    )]
    NoOpenFlag(String),
}

/// A substitution point in a normalized template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    key: String,
    conversion: Option<Conversion>,
    spec: Option<(String, FormatSpec)>,
}

impl Field {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn conversion(&self) -> Option<Conversion> {
        self.conversion
    }

    pub fn spec(&self) -> Option<&FormatSpec> {
        self.spec.as_ref().map(|(_, spec)| spec)
    }

    /// Apply the conversion, then the format spec.
    pub fn format(&self, text: &str, numeric: bool) -> String {
        let converted = match self.conversion {
            Some(conversion) => conversion.apply(text, numeric),
            None => text.to_string(),
        };
        match self.spec() {
            Some(spec) => spec.apply(&converted, numeric),
            None => converted,
        }
    }
}

/// A piece of a normalized template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, owned by the flag that was open when it appeared.
    Literal {
        text: String,
        owner: Option<BaseFlag>,
    },
    Field(Field),
}

/// A template rewritten so every field is a key the renderer supplies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal { text, .. } => {
                    write!(f, "{}", text.replace('{', "{{").replace('}', "}}"))?
                }
                Segment::Field(field) => {
                    write!(f, "{{{}", field.key)?;
                    if let Some(conversion) = field.conversion {
                        write!(f, "!{}", conversion.as_char())?;
                    }
                    if let Some((raw, _)) = &field.spec {
                        write!(f, ":{}", raw)?;
                    }
                    write!(f, "}}")?;
                }
            }
        }
        Ok(())
    }
}

/// The result of compiling a template. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFormat {
    source: String,
    flags: FlagTable,
    template: Template,
}

impl CompiledFormat {
    /// The template as originally written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &FlagTable {
        &self.flags
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// The normalized template text.
    pub fn normalized(&self) -> String {
        self.template.to_string()
    }
}

/// Compile `template` into a flag table and a normalized template.
pub fn compile(template: &str) -> Result<CompiledFormat, TemplateError> {
    tracing::debug!("Compiling template: '{}'", template);

    let mut compiler = Compiler::default();
    for segment in scanner::scan(template)? {
        compiler.push(segment)?;
    }

    let compiled = CompiledFormat {
        source: template.to_string(),
        flags: compiler.flags,
        template: Template {
            segments: compiler.segments,
        },
    };
    tracing::debug!(
        "Compiled {} flag(s); normalized template: '{}'",
        compiled.flags.len(),
        compiled.template
    );
    Ok(compiled)
}

/// Scan state: which base flag decorators currently attach to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum OpenFlag {
    #[default]
    None,
    Open(BaseFlag),
}

impl OpenFlag {
    fn base(&self) -> Option<BaseFlag> {
        match self {
            OpenFlag::None => None,
            OpenFlag::Open(base) => Some(*base),
        }
    }
}

#[derive(Debug, Default)]
struct Compiler {
    flags: FlagTable,
    segments: Vec<Segment>,
    open: OpenFlag,
}

impl Compiler {
    fn push(&mut self, segment: RawSegment) -> Result<(), TemplateError> {
        let RawSegment { literal, field } = segment;

        if !literal.is_empty() {
            self.segments.push(Segment::Literal {
                text: literal.clone(),
                owner: self.open.base(),
            });
        }

        let Some(raw) = field else {
            // trailing text
            self.push_fragment(&literal, None, true);
            return Ok(());
        };

        let (conversion, spec) = validate_field(&raw)?;
        let name = raw.name.as_str();

        if name.is_empty() {
            return Err(TemplateError::PositionalField {
                position: raw.position,
            });
        }

        let key = if let Some((parent, child)) = split_mangled(name) {
            self.add_parented(&literal, name, parent, child)?
        } else if name.starts_with(RAW_PREFIX) {
            self.push_fragment(&literal, Some(FragmentKey::Extra(name.to_string())), true);
            name.to_string()
        } else if name.contains(PARENT_SEPARATOR) {
            let (parent, child) = resolve_parent(name)?;
            self.add_parented(&literal, name, parent, child)?
        } else if let Some(plural) = PluralFlag::from_symbol(name) {
            self.add_plural(&literal, name, plural)?
        } else if let Some(base) = BaseFlag::from_symbol(name) {
            self.add_base(&literal, base)
        } else {
            self.add_extra(&literal, name)?
        };

        self.segments.push(Segment::Field(Field {
            key,
            conversion,
            spec,
        }));
        Ok(())
    }

    fn push_fragment(&mut self, pretext: &str, key: Option<FragmentKey>, required: bool) {
        if key.is_none() && pretext.is_empty() {
            return;
        }
        let Some(open) = self.open.base() else {
            return;
        };
        if let Some(flag) = self.flags.get_mut(open) {
            flag.push_fragment(ParseFragment {
                pretext: pretext.to_string(),
                key,
                required,
            });
        }
    }

    fn add_base(&mut self, literal: &str, base: BaseFlag) -> String {
        // text before a base field closes out the previous flag
        self.push_fragment(literal, None, true);

        self.flags.get_or_insert(base);
        if let Some(previous) = self.open.base() {
            if previous != base {
                if let Some(flag) = self.flags.get_mut(previous) {
                    flag.lock();
                }
            }
        }
        self.open = OpenFlag::Open(base);
        base.symbol().to_string()
    }

    fn add_plural(
        &mut self,
        literal: &str,
        name: &str,
        plural: PluralFlag,
    ) -> Result<String, TemplateError> {
        let open = self
            .open
            .base()
            .ok_or_else(|| TemplateError::NoOpenFlag(name.to_string()))?;
        self.flags.get_or_insert(open).add_plural(plural);
        self.push_fragment(literal, Some(FragmentKey::Plural(plural)), false);
        Ok(mangled_key(open, name))
    }

    fn add_extra(&mut self, literal: &str, name: &str) -> Result<String, TemplateError> {
        let open = self
            .open
            .base()
            .ok_or_else(|| TemplateError::NoOpenFlag(name.to_string()))?;
        self.flags.get_or_insert(open).add_extra(name);
        self.push_fragment(literal, Some(FragmentKey::Extra(name.to_string())), true);
        Ok(mangled_key(open, name))
    }

    fn add_parented(
        &mut self,
        literal: &str,
        name: &str,
        parent: BaseFlag,
        child: &str,
    ) -> Result<String, TemplateError> {
        if BaseFlag::from_symbol(child).is_some() {
            return Err(TemplateError::BaseFlagAsChild(name.to_string()));
        }

        let plural = PluralFlag::from_symbol(child);
        let flag = self.flags.get_or_insert(parent);
        match plural {
            Some(plural) => flag.add_plural(plural),
            None => flag.add_extra(child),
        }

        // fragments always describe the text around the open flag's value
        if let Some(open) = self.open.base() {
            let key = match plural {
                Some(plural) => FragmentKey::Plural(plural),
                None => FragmentKey::Extra(child.to_string()),
            };
            self.push_fragment(literal, Some(key), plural.is_none() && open == parent);
        }

        Ok(mangled_key(parent, child))
    }
}

/// Pick the parent of a dotted name: whichever side is a base symbol.
fn resolve_parent(name: &str) -> Result<(BaseFlag, &str), TemplateError> {
    let (left, right) = name
        .split_once(PARENT_SEPARATOR)
        .ok_or_else(|| TemplateError::UnknownParent(name.to_string()))?;

    let (parent, child) = if let Some(base) = BaseFlag::from_symbol(left) {
        (base, right)
    } else if let Some(base) = BaseFlag::from_symbol(right) {
        (base, left)
    } else {
        return Err(TemplateError::UnknownParent(name.to_string()));
    };

    if child.is_empty() {
        return Err(TemplateError::UnknownParent(name.to_string()));
    }
    Ok((parent, child))
}

/// A field's checked conversion and format spec (with its source text).
type FieldOptions = (Option<Conversion>, Option<(String, FormatSpec)>);

fn validate_field(raw: &RawField) -> Result<FieldOptions, TemplateError> {
    let conversion = match raw.conversion {
        Some(c) => Some(Conversion::from_char(c).ok_or_else(|| {
            TemplateError::InvalidConversion {
                field: raw.name.clone(),
                conversion: c,
            }
        })?),
        None => None,
    };

    let spec = match &raw.spec {
        Some(text) => {
            let spec = FormatSpec::parse(text).ok_or_else(|| TemplateError::InvalidSpec {
                field: raw.name.clone(),
                spec: text.clone(),
            })?;
            Some((text.clone(), spec))
        }
        None => None,
    };

    Ok((conversion, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use pretty_assertions::assert_eq;

    const SIGN: BaseFlag = BaseFlag::Sign;
    const WEEK: BaseFlag = BaseFlag::Unit(Unit::Week);
    const DAY: BaseFlag = BaseFlag::Unit(Unit::Day);
    const HOUR: BaseFlag = BaseFlag::Unit(Unit::Hour);

    const FULL: &str = "T{z}{wL.w}{p.w}{wR.w}{w}{wL}{p}{wR}{d}{dL}{P}{dR}{h}{hL}{ep}{hR}\
                        {m}{mL}{eP}{mR}{S}{SL}{Ep}{SR}{s}{sL}{EP}{sR}{u}";

    fn fragment(pretext: &str, key: Option<FragmentKey>, required: bool) -> ParseFragment {
        ParseFragment {
            pretext: pretext.to_string(),
            key,
            required,
        }
    }

    fn extra(name: &str) -> Option<FragmentKey> {
        Some(FragmentKey::Extra(name.to_string()))
    }

    #[test]
    fn test_compile_plain_units() {
        let compiled = compile("{w}w {d}d {h}h").unwrap();
        let bases: Vec<_> = compiled.flags().iter().map(Flag::base).collect();

        assert_eq!(bases, vec![WEEK, DAY, HOUR]);
        assert_eq!(compiled.normalized(), "{w}w {d}d {h}h");
    }

    #[test]
    fn test_literal_ownership() {
        let compiled = compile("T{d}d {h}h").unwrap();
        let owners: Vec<_> = compiled
            .template()
            .segments()
            .iter()
            .filter_map(|s| match s {
                Segment::Literal { text, owner } => Some((text.as_str(), *owner)),
                Segment::Field(_) => None,
            })
            .collect();

        assert_eq!(
            owners,
            vec![("T", None), ("d ", Some(DAY)), ("h", Some(HOUR))]
        );
    }

    #[test]
    fn test_literal_fragments() {
        let compiled = compile("{w}w {d}d {h}h").unwrap();
        let flags = compiled.flags();

        assert_eq!(
            flags.get(WEEK).unwrap().fragments(),
            &[fragment("w ", None, true)]
        );
        assert_eq!(
            flags.get(HOUR).unwrap().fragments(),
            &[fragment("h", None, true)]
        );
    }

    #[test]
    fn test_compile_full_template() {
        let compiled = compile(FULL).unwrap();

        assert_eq!(
            compiled.normalized(),
            "T{z}{_w__wL}{_w__p}{_w__wR}{w}{_w__wL}{_w__p}{_w__wR}{d}{_d__dL}{_d__P}{_d__dR}\
             {h}{_h__hL}{_h__ep}{_h__hR}{m}{_m__mL}{_m__eP}{_m__mR}{S}{_S__SL}{_S__Ep}{_S__SR}\
             {s}{_s__sL}{_s__EP}{_s__sR}{u}"
        );

        let symbols: Vec<_> = compiled.flags().iter().map(|f| f.key()).collect();
        assert_eq!(symbols, vec!["z", "w", "d", "h", "m", "S", "s", "u"]);

        let week = compiled.flags().get(WEEK).unwrap();
        assert_eq!(week.plurals().collect::<Vec<_>>(), vec![PluralFlag::Lower]);
        assert_eq!(week.extras().collect::<Vec<_>>(), vec!["wL", "wR"]);
    }

    #[test]
    fn test_dotted_fragments_attach_to_open_flag() {
        let compiled = compile(FULL).unwrap();
        let sign = compiled.flags().get(SIGN).unwrap();

        assert_eq!(
            sign.fragments(),
            &[
                fragment("", extra("wL"), false),
                fragment("", Some(FragmentKey::Plural(PluralFlag::Lower)), false),
                fragment("", extra("wR"), false),
            ]
        );
        assert!(sign.is_locked());

        let week = compiled.flags().get(WEEK).unwrap();
        assert_eq!(
            week.fragments(),
            &[
                fragment("", extra("wL"), true),
                fragment("", Some(FragmentKey::Plural(PluralFlag::Lower)), false),
                fragment("", extra("wR"), true),
            ]
        );
    }

    #[test]
    fn test_dotted_parent_on_either_side() {
        let left = compile("{w.x}{w}").unwrap();
        let right = compile("{x.w}{w}").unwrap();
        assert_eq!(left.normalized(), "{_w__x}{w}");
        assert_eq!(right.normalized(), "{_w__x}{w}");
    }

    #[test]
    fn test_locked_flag_takes_no_more_fragments() {
        let compiled = compile("{h}{hL}{m}{mL}{x.h}").unwrap();
        let hour = compiled.flags().get(HOUR).unwrap();

        assert_eq!(hour.fragments(), &[fragment("", extra("hL"), true)]);
        assert_eq!(hour.extras().collect::<Vec<_>>(), vec!["hL", "x"]);
    }

    #[test]
    fn test_redeclared_base_reuses_flag() {
        let compiled = compile("{d} {h} {d}").unwrap();
        assert_eq!(compiled.flags().len(), 2);
        assert_eq!(compiled.flags().get_index(0).unwrap().base(), DAY);
    }

    #[test]
    fn test_raw_keys_pass_through() {
        let compiled = compile("{_title}: {h:02}h{_h__x!r}").unwrap();
        assert_eq!(compiled.normalized(), "{_title}: {h:02}h{_h__x!r}");
        assert!(compiled.flags().get(HOUR).unwrap().extras().any(|e| e == "x"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = compile(FULL).unwrap();
        let second = compile(&first.normalized()).unwrap();

        assert_eq!(second.normalized(), first.normalized());
        assert_eq!(second.flags(), first.flags());
    }

    #[test]
    fn test_escaped_braces_survive_normalization() {
        let compiled = compile("{{{h}}}").unwrap();
        assert_eq!(compiled.normalized(), "{{{h}}}");
    }

    #[test]
    fn test_decorator_without_open_flag() {
        assert_eq!(
            compile("{p}{w}"),
            Err(TemplateError::NoOpenFlag("p".to_string()))
        );
        assert_eq!(
            compile("{label}{w}"),
            Err(TemplateError::NoOpenFlag("label".to_string()))
        );
    }

    #[test]
    fn test_bad_dotted_names() {
        assert_eq!(
            compile("{a.b}"),
            Err(TemplateError::UnknownParent("a.b".to_string()))
        );
        assert_eq!(
            compile("{w.d}"),
            Err(TemplateError::BaseFlagAsChild("w.d".to_string()))
        );
        assert_eq!(
            compile("{w.}"),
            Err(TemplateError::UnknownParent("w.".to_string()))
        );
    }

    #[test]
    fn test_positional_field_rejected() {
        assert_eq!(
            compile("{h} {}"),
            Err(TemplateError::PositionalField { position: 4 })
        );
    }

    #[test]
    fn test_invalid_conversion_and_spec() {
        assert!(matches!(
            compile("{h!x}"),
            Err(TemplateError::InvalidConversion { conversion: 'x', .. })
        ));
        assert!(matches!(
            compile("{h:.2f}"),
            Err(TemplateError::InvalidSpec { .. })
        ));
    }
}
