//! Thread-local pattern compilation cache for ast-grep patterns.
//!
//! Pattern rules run once per snapshot, and the engine re-evaluates every
//! snapshot it produces, so the same few patterns are compiled over and over.
//! Cache is capped at 256 entries; when full it is cleared and rebuilt.

use ast_grep_core::matcher::Pattern;
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Key is "<lang_debug>:<pattern_str>" so the same pattern string for
    // different languages never collides.
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled pattern from cache, or compile and cache it.
///
/// Compilation failures are not cached; the error is the rendered ast-grep
/// pattern error.
pub fn get_or_compile_pattern(pattern_str: &str, lang: SupportLang) -> Result<Pattern, String> {
    let cache_key = format!("{lang:?}:{pattern_str}");

    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(p) = cache.get(&cache_key) {
            return Ok(p.clone());
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Pattern::try_new(pattern_str, lang).map_err(|e| e.to_string())?;
        cache.insert(cache_key, compiled.clone());
        Ok(compiled)
    })
}

/// Clear the pattern cache (mainly for testing).
pub fn clear_cache() {
    PATTERN_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Get cache statistics for monitoring.
pub fn cache_size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}
