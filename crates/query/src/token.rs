//! Query tokenizer.
//!
//! A hand-written character scanner that splits a raw (already lowercased)
//! query string into typed tokens, honoring double-quoted spans and
//! backslash escapes. Two clean-up passes run before scanning so the
//! compiler never sees a query that starts or ends on a dangling boolean
//! connective.

/// Matching-mode and negation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    /// `%=` - force substring matching.
    Substring,
    /// `==` - exact equality.
    Exact,
    /// `!=` - exact inequality.
    NotEqual,
    /// `>` - strict greater-than comparison.
    Greater,
    /// `>=` - inclusive greater-than comparison.
    GreaterEq,
    /// `<` - strict less-than comparison.
    Less,
    /// `<=` - inclusive less-than comparison.
    LessEq,
    /// `!` - negate the next literal.
    Negate,
}

/// A logical token of the query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `@name` field selector.
    Field(String),
    /// Matching-mode operator.
    Op(MatchOp),
    /// `&` connective.
    And,
    /// `|` connective.
    Or,
    /// `(`.
    GroupOpen,
    /// `)`.
    GroupClose,
    /// Bare word or quoted span (quotes preserved).
    Literal(String),
}

/// Runs the clean-up passes on a raw query string.
///
/// Pass one strips any leading run of `&`, `|`, or spaces and any trailing
/// run of spaces and unescaped `&`/`|`. Pass two collapses a run of
/// connectives down to its last member when the run directly precedes a
/// field selector or group token. Cleaning is idempotent.
pub fn clean(query: &str) -> String {
    collapse_connective_runs(&strip_dangling(query))
}

fn strip_dangling(query: &str) -> String {
    let chars: Vec<char> = query.chars().collect();
    let mut start = 0;
    while start < chars.len() && matches!(chars[start], '&' | '|' | ' ') {
        start += 1;
    }
    let mut end = chars.len();
    while end > start {
        let c = chars[end - 1];
        if c == ' ' {
            end -= 1;
        } else if matches!(c, '&' | '|') && (end < 2 || chars[end - 2] != '\\') {
            end -= 1;
        } else {
            break;
        }
    }
    chars[start..end].iter().collect()
}

fn collapse_connective_runs(query: &str) -> String {
    let chars: Vec<char> = query.chars().collect();
    let mut out = String::with_capacity(query.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if matches!(c, '&' | '|') {
            // Walk the whole run of connectives separated by spaces.
            let mut last = i;
            let mut j = i + 1;
            loop {
                let mut k = j;
                while k < chars.len() && chars[k] == ' ' {
                    k += 1;
                }
                if k < chars.len() && matches!(chars[k], '&' | '|') {
                    last = k;
                    j = k + 1;
                } else {
                    break;
                }
            }
            let mut after = j;
            while after < chars.len() && chars[after] == ' ' {
                after += 1;
            }
            let followed_by_selector =
                after < chars.len() && matches!(chars[after], '@' | '(' | ')');
            if last > i && followed_by_selector {
                // Keep only the closing member of the run.
                out.push(chars[last]);
                i = last + 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Tokenizes a raw query string after cleaning it.
///
/// Splits on quoted spans, the single-character tokens `( ) & |`, the
/// operators `== != %= >= <= > < !`, and whitespace. A backslash glues the
/// following character into the current word. Repeated connectives and
/// repeated identical literals are dropped, and adjacent `()` pairs
/// collapse to nothing; group tokens are otherwise never de-duplicated so
/// nesting survives.
pub fn tokenize(query: &str) -> Vec<Token> {
    let cleaned = clean(query);
    let chars: Vec<char> = cleaned.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut word = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '"' => {
                flush_word(&mut tokens, &mut word);
                let (literal, consumed) = scan_quoted(&chars, i);
                push_token(&mut tokens, Token::Literal(literal));
                i += consumed;
            }
            _ if c.is_whitespace() => {
                flush_word(&mut tokens, &mut word);
                i += 1;
            }
            '(' => {
                flush_word(&mut tokens, &mut word);
                push_token(&mut tokens, Token::GroupOpen);
                i += 1;
            }
            ')' => {
                flush_word(&mut tokens, &mut word);
                push_token(&mut tokens, Token::GroupClose);
                i += 1;
            }
            '&' => {
                flush_word(&mut tokens, &mut word);
                push_token(&mut tokens, Token::And);
                i += 1;
            }
            '|' => {
                flush_word(&mut tokens, &mut word);
                push_token(&mut tokens, Token::Or);
                i += 1;
            }
            '%' if next == Some('=') => {
                flush_word(&mut tokens, &mut word);
                push_token(&mut tokens, Token::Op(MatchOp::Substring));
                i += 2;
            }
            '=' if next == Some('=') => {
                flush_word(&mut tokens, &mut word);
                push_token(&mut tokens, Token::Op(MatchOp::Exact));
                i += 2;
            }
            '!' => {
                flush_word(&mut tokens, &mut word);
                if next == Some('=') {
                    push_token(&mut tokens, Token::Op(MatchOp::NotEqual));
                    i += 2;
                } else {
                    push_token(&mut tokens, Token::Op(MatchOp::Negate));
                    i += 1;
                }
            }
            '>' => {
                flush_word(&mut tokens, &mut word);
                if next == Some('=') {
                    push_token(&mut tokens, Token::Op(MatchOp::GreaterEq));
                    i += 2;
                } else {
                    push_token(&mut tokens, Token::Op(MatchOp::Greater));
                    i += 1;
                }
            }
            '<' => {
                flush_word(&mut tokens, &mut word);
                if next == Some('=') {
                    push_token(&mut tokens, Token::Op(MatchOp::LessEq));
                    i += 2;
                } else {
                    push_token(&mut tokens, Token::Op(MatchOp::Less));
                    i += 1;
                }
            }
            '\\' => {
                word.push('\\');
                if let Some(escaped) = next {
                    word.push(escaped);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => {
                word.push(c);
                i += 1;
            }
        }
    }
    flush_word(&mut tokens, &mut word);
    tokens
}

/// Scans a quoted span starting at `start`, returning the token text
/// (quotes included) and the number of characters consumed. An unterminated
/// span runs to the end of the input.
fn scan_quoted(chars: &[char], start: usize) -> (String, usize) {
    let mut literal = String::from('"');
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                literal.push('\\');
                literal.push(chars[i + 1]);
                i += 2;
            }
            '"' => {
                literal.push('"');
                i += 1;
                return (literal, i - start);
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    (literal, i - start)
}

fn flush_word(tokens: &mut Vec<Token>, word: &mut String) {
    if word.is_empty() {
        return;
    }
    let token = classify_word(word);
    word.clear();
    push_token(tokens, token);
}

/// A bare word `@name` where `name` is one or more word characters is a
/// field selector; anything else is a literal.
fn classify_word(word: &str) -> Token {
    if let Some(name) = word.strip_prefix('@') {
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Token::Field(name.to_string());
        }
    }
    Token::Literal(word.to_string())
}

fn push_token(tokens: &mut Vec<Token>, token: Token) {
    match (&token, tokens.last()) {
        (Token::And, Some(Token::And)) | (Token::Or, Some(Token::Or)) => return,
        (Token::Literal(a), Some(Token::Literal(b))) if a == b => return,
        // Empty groups vanish; popping here collapses nested `(())` too.
        (Token::GroupClose, Some(Token::GroupOpen)) => {
            tokens.pop();
            return;
        }
        _ => {}
    }
    tokens.push(token);
}
