//! Literal value normalization.
//!
//! Turns a raw query literal into a value safe to bind as a single
//! parameter of a `LIKE ? ESCAPE '\'` predicate (substring mode) or a
//! plain equality/comparison predicate. The formatter never concatenates
//! into SQL text.

/// Pattern metacharacters that must be escaped inside quoted literals.
const METACHARACTERS: [char; 4] = ['%', '_', '^', '$'];

/// Normalizes a raw literal token into a bind value.
///
/// Quoted literals have their quotes stripped and any unescaped pattern
/// metacharacter protected with a backslash. A leading `^` (or `%`) anchors
/// the match to the start of the value; an unescaped trailing `$` (or `%`)
/// anchors it to the end. In substring mode the unanchored sides are
/// wrapped with the `%` wildcard; in exact/comparison mode no wildcards are
/// added but anchors are still stripped.
pub fn format_value(raw: &str, substring: bool) -> String {
    let (inner, quoted) = strip_quotes(raw);
    let mut value = if quoted {
        escape_metacharacters(inner)
    } else {
        inner.to_string()
    };

    let mut leading_wildcard = substring;
    if value.starts_with(['^', '%']) {
        value.remove(0);
        leading_wildcard = false;
    }

    let mut trailing_wildcard = substring;
    if ends_with_unescaped_anchor(&value) {
        value.pop();
        trailing_wildcard = false;
    }

    if leading_wildcard {
        value.insert(0, '%');
    }
    if trailing_wildcard {
        value.push('%');
    }
    value
}

/// Strips surrounding double quotes, reporting whether the literal was quoted.
fn strip_quotes(raw: &str) -> (&str, bool) {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        (&raw[1..raw.len() - 1], true)
    } else {
        (raw, false)
    }
}

/// Escapes unescaped pattern metacharacters.
///
/// A metacharacter preceded by an odd run of backslashes is already escaped
/// and left alone; an even run (including none) gets one backslash inserted.
fn escape_metacharacters(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut backslashes = 0usize;
    for c in value.chars() {
        if c == '\\' {
            backslashes += 1;
            out.push(c);
            continue;
        }
        if METACHARACTERS.contains(&c) && backslashes % 2 == 0 {
            out.push('\\');
        }
        out.push(c);
        backslashes = 0;
    }
    out
}

/// True when the value ends with a `$` or `%` that is not itself escaped.
fn ends_with_unescaped_anchor(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    match chars.last() {
        Some('$') | Some('%') => {}
        _ => return false,
    }
    let backslashes = chars[..chars.len() - 1]
        .iter()
        .rev()
        .take_while(|&&c| c == '\\')
        .count();
    backslashes % 2 == 0
}
