//! Pattern escaping and roster filter construction.
//!
//! Escaping only prevents quote breakout. Pattern metacharacters (`%`, `_`,
//! backslash) stay live, so a search for `a_b` also matches `axb`.

/// Quote delimiter of the pattern grammar.
pub const PATTERN_QUOTE: char = '"';

/// Case-insensitive pattern-match operator used by roster search.
///
/// The SQLite store maps it to `LIKE`, which folds case for ASCII letters
/// only: `élia` does not match `Élia`.
pub const MATCH_OPERATOR: &str = "ilike";

/// Student display name column.
pub const FIELD_FULL_NAME: &str = "full_name";

/// Student external id (NIS) column.
pub const FIELD_NIS: &str = "nis";

/// Longest search term, in characters, that reaches the store; longer input
/// is cut before escaping.
pub const MAX_SEARCH_TERM_CHARS: usize = 100;

/// Fields OR'd together by roster search, in clause order.
pub const ROSTER_SEARCH_FIELDS: [&str; 2] = [FIELD_FULL_NAME, FIELD_NIS];

/// Doubles every pattern quote in `text`; leaves everything else untouched.
pub fn escape_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == PATTERN_QUOTE {
            escaped.push(PATTERN_QUOTE);
        }
        escaped.push(ch);
    }
    escaped
}

/// Builds the roster search clause for `term`.
///
/// Returns `None` when `term` is blank; callers must then omit the filter
/// entirely instead of matching on an empty pattern. Terms are trimmed and
/// cut to [`MAX_SEARCH_TERM_CHARS`].
///
/// The clause has the shape
/// `or(full_name.ilike."%<term>%",nis.ilike."%<term>%")`.
pub fn build_roster_filter(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let term = match term.char_indices().nth(MAX_SEARCH_TERM_CHARS) {
        Some((cut, _)) => term[..cut].trim_end(),
        None => term,
    };
    let escaped = escape_pattern(term);
    let conditions = ROSTER_SEARCH_FIELDS
        .iter()
        .map(|field| {
            format!("{field}.{MATCH_OPERATOR}.{PATTERN_QUOTE}%{escaped}%{PATTERN_QUOTE}")
        })
        .collect::<Vec<_>>();

    Some(format!("or({})", conditions.join(",")))
}
