//! Pattern compilation and parameter extraction.
//!
//! # Responsibilities
//! - Translate rule source patterns into anchored regexes
//! - Full-match request paths and capture numbered/named groups
//! - Cache compiled patterns by pattern string
//!
//! # Design Decisions
//! - A pattern containing `(`, `[`, `^` or `$` is taken as a raw regex
//! - Otherwise `{name}` is a path segment parameter and `*` a wildcard
//! - The cache is append-only: a changed pattern is a new key
//! - Cache reads clone an `Arc` and release the shard before matching

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use thiserror::Error;

use crate::rules::ParamSet;

/// Characters escaped when translating a simple pattern.
const ESCAPED: &[char] = &['.', '+', '?', '^', '$', '|', '\\', '[', ']', '(', ')'];

/// Characters that mark a pattern as a raw regex.
const RAW_MARKERS: &[char] = &['(', '[', '^', '$'];

/// Errors raised while compiling a pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled rule pattern.
#[derive(Debug)]
pub struct CompiledPattern {
    source: String,
    expression: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Original pattern string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Anchored regex the pattern was translated to.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether `input` matches end to end.
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// Full-match `input` and collect captures.
    ///
    /// Numbered groups are stored under their 1-based index, named groups
    /// additionally under their name. Groups that did not take part in the
    /// match are left out.
    pub fn match_and_extract(&self, input: &str) -> Option<ParamSet> {
        let caps = self.regex.captures(input)?;
        let mut params = ParamSet::new();

        for index in 1..caps.len() {
            if let Some(m) = caps.get(index) {
                params.insert(index.to_string(), m.as_str());
            }
        }

        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                params.insert(name, m.as_str());
            }
        }

        Some(params)
    }
}

/// Translate a rule pattern into an anchored regex.
pub fn to_regex(pattern: &str) -> String {
    if pattern.contains(RAW_MARKERS) {
        let mut regex = String::with_capacity(pattern.len() + 2);
        if !pattern.starts_with('^') {
            regex.push('^');
        }
        regex.push_str(pattern);
        if !pattern.ends_with('$') {
            regex.push('$');
        }
        return regex;
    }

    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');

    let mut rest = pattern;
    while let Some(c) = rest.chars().next() {
        match c {
            '{' => match rest[1..].find('}') {
                Some(end) if end > 0 => {
                    let name = &rest[1..=end];
                    regex.push_str("(?<");
                    regex.push_str(name);
                    regex.push_str(">[^/]+)");
                    rest = &rest[end + 2..];
                    continue;
                }
                _ => regex.push_str("\\{"),
            },
            '}' => regex.push_str("\\}"),
            '*' => regex.push_str(".*"),
            c if ESCAPED.contains(&c) => {
                regex.push('\\');
                regex.push(c);
            }
            c => regex.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }

    regex.push('$');
    regex
}

/// Compile a rule pattern.
pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    let expression = to_regex(pattern);
    tracing::debug!(pattern = %pattern, regex = %expression, "Compiling rule pattern");

    let regex = compile_full_match(&expression).map_err(|source| PatternError::Invalid {
        pattern: pattern.to_string(),
        source,
    })?;

    Ok(CompiledPattern {
        source: pattern.to_string(),
        expression,
        regex,
    })
}

/// Compile a regex that must match the whole input.
///
/// The expression is wrapped in a non-capturing group so that alternations
/// cannot satisfy the anchors with a partial match; group numbering is
/// unchanged.
pub fn compile_full_match(expression: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", expression))
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Read-through cache of compiled rule and exclude patterns.
///
/// Failed compilations are not cached; they are reported again on every use.
#[derive(Debug, Default)]
pub struct PatternCache {
    rules: DashMap<String, Arc<CompiledPattern>>,
    excludes: DashMap<String, Arc<Regex>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled rule pattern, compiling on first use.
    pub fn rule_pattern(&self, pattern: &str) -> Result<Arc<CompiledPattern>, PatternError> {
        if let Some(compiled) = self.rules.get(pattern).map(|e| Arc::clone(e.value())) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(compiled);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let compiled = Arc::new(compile(pattern)?);
        Ok(Arc::clone(
            self.rules
                .entry(pattern.to_string())
                .or_insert(compiled)
                .value(),
        ))
    }

    /// Compiled exclude regex (full match), compiling on first use.
    pub fn exclude_pattern(&self, expression: &str) -> Result<Arc<Regex>, PatternError> {
        if let Some(regex) = self.excludes.get(expression).map(|e| Arc::clone(e.value())) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(regex);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let regex = compile_full_match(expression).map_err(|source| PatternError::Invalid {
            pattern: expression.to_string(),
            source,
        })?;
        Ok(Arc::clone(
            self.excludes
                .entry(expression.to_string())
                .or_insert(Arc::new(regex))
                .value(),
        ))
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.rules.len() + self.excludes.len(),
        }
    }
}

/// Match `input` against `pattern` without caching.
pub fn match_pattern(input: &str, pattern: &str) -> Result<Option<ParamSet>, PatternError> {
    Ok(compile(pattern)?.match_and_extract(input))
}
