//! Document selection by identifier and category glob
//!
//! A selection narrows the corpus in two independent ways that intersect:
//! - `fileids`: explicit ids, visited in the order given
//! - `categories`: shell-style globs; a document qualifies when any of its
//!   categories matches any pattern
//!
//! Globs follow `fnmatchcase`: `*`, `?`, `[seq]`, `[!seq]`, case-sensitive.
//! Compiled globs are kept in a small LRU so repeated calls with the same
//! patterns skip regex compilation.

use crate::error::{CorpusError, Result};
use crate::index::{BoundaryRecord, IndexSnapshot};
use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Which documents an operation applies to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Explicit document ids; None means every document in scan order
    pub fileids: Option<Vec<String>>,
    /// Category globs; None means no category filtering
    pub categories: Option<Vec<String>>,
}

impl Selection {
    /// Every document
    pub fn all() -> Self {
        Self::default()
    }

    /// A single document
    pub fn fileid(id: impl Into<String>) -> Self {
        Selection {
            fileids: Some(vec![id.into()]),
            categories: None,
        }
    }

    /// Documents by id, in the given order
    pub fn fileids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection {
            fileids: Some(ids.into_iter().map(Into::into).collect()),
            categories: None,
        }
    }

    /// Restrict to documents with a category matching `pattern`
    pub fn with_category(self, pattern: impl Into<String>) -> Self {
        self.with_categories([pattern])
    }

    /// Restrict to documents with a category matching any of `patterns`
    pub fn with_categories<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .get_or_insert_with(Vec::new)
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// No id list and no category filter
    pub fn is_unfiltered(&self) -> bool {
        self.fileids.is_none() && self.categories.is_none()
    }
}

impl From<&str> for Selection {
    fn from(id: &str) -> Self {
        Selection::fileid(id)
    }
}

impl From<String> for Selection {
    fn from(id: String) -> Self {
        Selection::fileid(id)
    }
}

impl From<&[&str]> for Selection {
    fn from(ids: &[&str]) -> Self {
        Selection::fileids(ids.iter().copied())
    }
}

impl From<Vec<String>> for Selection {
    fn from(ids: Vec<String>) -> Self {
        Selection::fileids(ids)
    }
}

/// Translate a shell glob into an anchored regex
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                // A ']' right after '[' or '[!' is a literal member
                let mut j = i;
                if chars.get(j) == Some(&'!') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }

                if j >= chars.len() {
                    out.push_str("\\[");
                    continue;
                }

                out.push('[');
                let mut k = i;
                if chars[k] == '!' {
                    out.push('^');
                    k += 1;
                }
                for &member in &chars[k..j] {
                    if matches!(member, '\\' | '[' | ']' | '&' | '~' | '^') {
                        out.push('\\');
                    }
                    out.push(member);
                }
                out.push(']');
                i = j + 1;
            }
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
    }

    out.push('$');
    out
}

/// Compiles category globs, caching the most recent ones
pub struct GlobMatcher {
    cache: Option<Mutex<LruCache<String, Regex>>>,
}

impl GlobMatcher {
    /// A capacity of zero disables caching
    pub fn new(capacity: usize) -> Self {
        GlobMatcher {
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Compile one glob
    pub fn compile(&self, pattern: &str) -> Result<Regex> {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                if let Some(regex) = cache.get(pattern) {
                    return Ok(regex.clone());
                }
            }
        }

        let regex = Regex::new(&glob_to_regex(pattern)).map_err(|source| CorpusError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.put(pattern.to_string(), regex.clone());
            }
        }
        Ok(regex)
    }

    /// Compile a list of globs
    pub fn compile_all(&self, patterns: &[String]) -> Result<Vec<Regex>> {
        patterns.iter().map(|p| self.compile(p)).collect()
    }

    /// Number of cached globs
    pub fn cached(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|c| c.lock().ok().map(|c| c.len()))
            .unwrap_or(0)
    }
}

/// True if any item matches any of the compiled globs
pub fn some_items_match<S: AsRef<str>>(items: &[S], globs: &[Regex]) -> bool {
    items
        .iter()
        .any(|item| globs.iter().any(|g| g.is_match(item.as_ref())))
}

/// Resolve a selection to records, in id order or scan order
///
/// Unknown ids fail before anything is returned.
pub fn resolve<'s>(
    snapshot: &'s IndexSnapshot,
    selection: &Selection,
    globs: &GlobMatcher,
) -> Result<Vec<&'s BoundaryRecord>> {
    let patterns = match &selection.categories {
        Some(patterns) => Some(globs.compile_all(patterns)?),
        None => None,
    };

    let records: Vec<&BoundaryRecord> = match &selection.fileids {
        Some(ids) => ids
            .iter()
            .map(|id| snapshot.get(id).ok_or_else(|| CorpusError::unknown(id.as_str())))
            .collect::<Result<_>>()?,
        None => snapshot.iter().collect(),
    };

    Ok(match patterns {
        Some(patterns) => records
            .into_iter()
            .filter(|r| some_items_match(&r.categories, &patterns))
            .collect(),
        None => records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn glob(pattern: &str) -> Regex {
        Regex::new(&glob_to_regex(pattern)).unwrap()
    }

    #[test]
    fn test_glob_wildcards() {
        let re = glob("Автор:*");
        assert!(re.is_match("Автор:Яна Сарно"));
        assert!(re.is_match("Автор:"));
        assert!(!re.is_match("Тип:Газета"));
        assert!(!re.is_match("xАвтор:"));

        let re = glob("Тип:Газ?та");
        assert!(re.is_match("Тип:Газета"));
        assert!(!re.is_match("Тип:Газеета"));
    }

    #[test]
    fn test_glob_case_sensitive_and_escaped() {
        assert!(!glob("url:*").is_match("URL:http://x"));
        assert!(glob("a.b+(c)").is_match("a.b+(c)"));
        assert!(!glob("a.b").is_match("axb"));
    }

    #[test]
    fn test_glob_classes() {
        let re = glob("[ab]x");
        assert!(re.is_match("ax"));
        assert!(!re.is_match("cx"));

        let re = glob("[!ab]x");
        assert!(re.is_match("cx"));
        assert!(!re.is_match("ax"));

        let re = glob("[]]x");
        assert!(re.is_match("]x"));

        let re = glob("[a-c]");
        assert!(re.is_match("b"));

        // Unterminated class is literal
        assert!(glob("[ab").is_match("[ab"));
    }

    #[test]
    fn test_matcher_cache() {
        let matcher = GlobMatcher::new(2);
        matcher.compile("a*").unwrap();
        matcher.compile("a*").unwrap();
        matcher.compile("b*").unwrap();
        matcher.compile("c*").unwrap();
        assert_eq!(matcher.cached(), 2);

        let uncached = GlobMatcher::new(0);
        uncached.compile("a*").unwrap();
        assert_eq!(uncached.cached(), 0);
    }

    fn snapshot() -> IndexSnapshot {
        let record = |id: &str, cats: &[&str]| BoundaryRecord {
            document_id: id.to_string(),
            title: format!("title {id}"),
            line_start: 0,
            line_end: 0,
            byte_start: 0,
            byte_end: 0,
            categories: cats.iter().map(|c| c.to_string()).collect(),
        };
        IndexSnapshot::from_records(
            vec![
                record("1", &["Тип:Газета"]),
                record("2", &["Тема:Медиа"]),
                record("3", &["Автор:Яна Сарно", "Культура"]),
                record("4", &["Автор:Валентин Колесников", "Культура"]),
            ],
            SystemTime::UNIX_EPOCH,
        )
    }

    fn ids(records: Vec<&BoundaryRecord>) -> Vec<&str> {
        records.iter().map(|r| r.document_id.as_str()).collect()
    }

    #[test]
    fn test_resolve() {
        let snap = snapshot();
        let globs = GlobMatcher::new(8);

        let all = resolve(&snap, &Selection::all(), &globs).unwrap();
        assert_eq!(ids(all), vec!["1", "2", "3", "4"]);

        let given = resolve(&snap, &Selection::fileids(["4", "2"]), &globs).unwrap();
        assert_eq!(ids(given), vec!["4", "2"]);

        let authors = resolve(&snap, &Selection::all().with_category("Автор:*"), &globs).unwrap();
        assert_eq!(ids(authors), vec!["3", "4"]);

        let both = Selection::fileids(["1", "3"]).with_categories(["Автор:*", "Тип:*"]);
        assert_eq!(ids(resolve(&snap, &both, &globs).unwrap()), vec!["1", "3"]);

        let intersect = Selection::fileids(["1", "2"]).with_category("Культура");
        assert!(resolve(&snap, &intersect, &globs).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_unknown_id() {
        let snap = snapshot();
        let err = resolve(&snap, &Selection::fileids(["1", "99"]), &GlobMatcher::new(8)).unwrap_err();
        assert!(matches!(err, CorpusError::UnknownDocument { document_id } if document_id == "99"));
    }

    #[test]
    fn test_selection_conversions() {
        assert_eq!(Selection::from("2"), Selection::fileid("2"));
        let ids: &[&str] = &["2", "3"];
        assert_eq!(Selection::from(ids).fileids, Some(vec!["2".to_string(), "3".to_string()]));
        assert!(Selection::all().is_unfiltered());
        assert!(!Selection::all().with_category("*").is_unfiltered());
    }
}
