//! Per-call-site template cache.
//!
//! Invariants:
//! - Keyed by the identity (address and length) of the static segment array, so
//!   one call site maps to one entry for the life of the cache.
//! - Entries are never evicted; a failed compile is cached too and returned
//!   again without re-parsing.
//! - Population is a single synchronous check-then-insert.
use crate::error::TemplateError;
use crate::types::Root;
use std::collections::HashMap;
use std::rc::Rc;

/// Static segments of a template literal with a stable identity.
#[derive(Clone, Copy, Debug)]
pub struct Strings(&'static [&'static str]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StringsKey {
    addr: usize,
    len: usize,
}

impl Strings {
    pub const fn new(segments: &'static [&'static str]) -> Self {
        Self(segments)
    }

    /// Gives runtime-built segments a stable identity. The memory is never
    /// reclaimed, matching the never-evicting cache.
    pub fn leak(segments: Vec<String>) -> Self {
        let segments: Vec<&'static str> = segments
            .into_iter()
            .map(|s| &*Box::leak(s.into_boxed_str()))
            .collect();
        Self(Box::leak(segments.into_boxed_slice()))
    }

    pub fn segments(&self) -> &'static [&'static str] {
        self.0
    }

    pub fn hole_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn key(&self) -> StringsKey {
        StringsKey {
            addr: self.0.as_ptr() as usize,
            len: self.0.len(),
        }
    }
}

/// Builds a `Strings` whose identity is fixed per macro call site.
///
/// ```
/// let strings = template::strings!["<p>", "</p>"];
/// assert_eq!(strings.hole_count(), 1);
/// ```
#[macro_export]
macro_rules! strings {
    ($($segment:expr),+ $(,)?) => {{
        static SEGMENTS: &[&str] = &[$($segment),+];
        $crate::Strings::new(SEGMENTS)
    }};
}

/// A compiled template: the AST plus one optional skeleton per container slot.
#[derive(Debug)]
pub struct Template<N> {
    pub root: Root,
    pub skeletons: Vec<Option<N>>,
}

impl<N> Template<N> {
    pub fn skeleton(&self, slot: usize) -> Option<&N> {
        self.skeletons.get(slot).and_then(Option::as_ref)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Literals tokenized and parsed.
    pub parses: usize,
    /// Lookups answered from the cache, successful or not.
    pub hits: usize,
}

pub struct TemplateCache<N> {
    entries: HashMap<StringsKey, Result<Rc<Template<N>>, TemplateError>>,
    stats: CacheStats,
}

impl<N> Default for TemplateCache<N> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<N> TemplateCache<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(
        &mut self,
        strings: Strings,
        compile: impl FnOnce(&[&str]) -> Result<Template<N>, TemplateError>,
    ) -> Result<Rc<Template<N>>, TemplateError> {
        let key = strings.key();
        if let Some(entry) = self.entries.get(&key) {
            self.stats.hits += 1;
            return entry.clone();
        }
        self.stats.parses += 1;
        log::debug!(
            target: "template.cache",
            "compiling template with {} holes (entry {})",
            strings.hole_count(),
            self.entries.len()
        );
        let entry = compile(strings.segments()).map(Rc::new);
        if let Err(err) = &entry {
            log::debug!(target: "template.cache", "caching compile failure: {err}");
        }
        self.entries.insert(key, entry.clone());
        entry
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
