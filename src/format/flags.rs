//! Flags discovered while compiling a template.

use std::collections::{BTreeSet, HashMap};

use crate::models::{BaseFlag, PluralFlag};

/// Key under which a decorator of `parent` is substituted, e.g. `_w__wL`.
pub fn mangled_key(parent: BaseFlag, child: &str) -> String {
    format!("_{}__{}", parent.symbol(), child)
}

/// Split a mangled key back into its parent and child, if it is one.
pub fn split_mangled(key: &str) -> Option<(BaseFlag, &str)> {
    let (parent, child) = key.strip_prefix('_')?.split_once("__")?;
    let parent = BaseFlag::from_symbol(parent)?;
    if child.is_empty() || BaseFlag::from_symbol(child).is_some() {
        return None;
    }
    Some((parent, child))
}

/// What follows a fragment's pretext in the text being parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKey {
    Plural(PluralFlag),
    /// An extra decorator or raw key, looked up in the defaults by name.
    Extra(String),
}

/// One piece of the pattern expected after a flag's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFragment {
    pub pretext: String,
    /// `None` for literal text with no decorator after it.
    pub key: Option<FragmentKey>,
    pub required: bool,
}

/// A base flag together with everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    base: BaseFlag,
    plurals: BTreeSet<PluralFlag>,
    extras: BTreeSet<String>,
    fragments: Vec<ParseFragment>,
    locked: bool,
}

impl Flag {
    pub fn new(base: BaseFlag) -> Self {
        tracing::trace!("Creating flag: '{}'", base);
        Self {
            base,
            plurals: BTreeSet::new(),
            extras: BTreeSet::new(),
            fragments: Vec::new(),
            locked: false,
        }
    }

    pub fn base(&self) -> BaseFlag {
        self.base
    }

    /// Substitution key of the value itself.
    pub fn key(&self) -> &'static str {
        self.base.symbol()
    }

    pub fn plurals(&self) -> impl Iterator<Item = PluralFlag> + '_ {
        self.plurals.iter().copied()
    }

    pub fn extras(&self) -> impl Iterator<Item = &str> {
        self.extras.iter().map(String::as_str)
    }

    pub fn fragments(&self) -> &[ParseFragment] {
        &self.fragments
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn plural_key(&self, plural: PluralFlag) -> String {
        mangled_key(self.base, plural.symbol())
    }

    pub fn extra_key(&self, extra: &str) -> String {
        mangled_key(self.base, extra)
    }

    pub(crate) fn add_plural(&mut self, plural: PluralFlag) {
        self.plurals.insert(plural);
    }

    pub(crate) fn add_extra(&mut self, extra: &str) {
        self.extras.insert(extra.to_string());
    }

    /// Ignored once the flag is locked.
    pub(crate) fn push_fragment(&mut self, fragment: ParseFragment) {
        if !self.locked {
            self.fragments.push(fragment);
        }
    }

    pub(crate) fn lock(&mut self) {
        if !self.locked {
            tracing::trace!("Locking parse fragments of flag: '{}'", self.base);
            self.locked = true;
        }
    }

    /// Every key this flag supplies when rendering.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![self.key().to_string()];
        keys.extend(self.plurals().map(|p| self.plural_key(p)));
        keys.extend(self.extras().map(|e| self.extra_key(e)));
        keys
    }
}

/// Flags in first-seen order, with lookup by base flag or by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTable {
    flags: Vec<Flag>,
    index: HashMap<BaseFlag, usize>,
}

impl FlagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, base: BaseFlag) -> Option<&Flag> {
        self.index.get(&base).map(|&i| &self.flags[i])
    }

    pub fn get_index(&self, position: usize) -> Option<&Flag> {
        self.flags.get(position)
    }

    pub fn contains(&self, base: BaseFlag) -> bool {
        self.index.contains_key(&base)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Flag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub(crate) fn get_mut(&mut self, base: BaseFlag) -> Option<&mut Flag> {
        match self.index.get(&base) {
            Some(&i) => self.flags.get_mut(i),
            None => None,
        }
    }

    /// Fetch the flag for `base`, appending a new one if it is not present.
    pub(crate) fn get_or_insert(&mut self, base: BaseFlag) -> &mut Flag {
        let i = match self.index.get(&base) {
            Some(&i) => i,
            None => {
                self.flags.push(Flag::new(base));
                let i = self.flags.len() - 1;
                self.index.insert(base, i);
                i
            }
        };
        &mut self.flags[i]
    }
}

impl<'a> IntoIterator for &'a FlagTable {
    type Item = &'a Flag;
    type IntoIter = std::slice::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;

    const WEEK: BaseFlag = BaseFlag::Unit(Unit::Week);
    const DAY: BaseFlag = BaseFlag::Unit(Unit::Day);

    #[test]
    fn test_mangled_key_round_trip() {
        assert_eq!(mangled_key(WEEK, "wL"), "_w__wL");
        assert_eq!(split_mangled("_w__wL"), Some((WEEK, "wL")));
        assert_eq!(split_mangled("_z__p"), Some((BaseFlag::Sign, "p")));
    }

    #[test]
    fn test_split_mangled_rejects_other_keys() {
        assert_eq!(split_mangled("_raw"), None);
        assert_eq!(split_mangled("_x__a"), None);
        assert_eq!(split_mangled("_w__"), None);
        assert_eq!(split_mangled("_w__d"), None);
        assert_eq!(split_mangled("w__a"), None);
    }

    #[test]
    fn test_table_preserves_insertion_order() {
        let mut table = FlagTable::new();
        table.get_or_insert(DAY);
        table.get_or_insert(WEEK);
        table.get_or_insert(DAY);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get_index(0).unwrap().base(), DAY);
        assert_eq!(table.get_index(1).unwrap().base(), WEEK);
        assert!(table.contains(WEEK));
        assert!(table.get(BaseFlag::Sign).is_none());
    }

    #[test]
    fn test_locked_flag_ignores_fragments() {
        let mut flag = Flag::new(WEEK);
        let fragment = ParseFragment {
            pretext: "w".to_string(),
            key: None,
            required: true,
        };
        flag.push_fragment(fragment.clone());
        flag.lock();
        flag.push_fragment(fragment);

        assert!(flag.is_locked());
        assert_eq!(flag.fragments().len(), 1);
    }

    #[test]
    fn test_flag_keys() {
        let mut flag = Flag::new(DAY);
        flag.add_plural(PluralFlag::Lower);
        flag.add_extra("dL");
        assert_eq!(flag.keys(), vec!["d", "_d__p", "_d__dL"]);
    }
}
