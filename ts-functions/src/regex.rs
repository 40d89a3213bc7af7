use oxrdf::Literal;
use regex::{Regex, RegexBuilder};
use std::sync::mpsc;
use ts_common::limits::{MAX_REGEX_PATTERN_BYTES, REGEX_TIMEOUT};
use ts_common::{ThinError, ThinResult};
use ts_model::Term;

fn lexical_string(term: &Term) -> ThinResult<&str> {
    match term {
        Term::Literal(lit) if lit.datatype() == oxrdf::vocab::xsd::STRING || lit.language().is_some() => {
            Ok(lit.value())
        }
        _ => Err(ThinError::Expected),
    }
}

/// Rejects patterns with an adjacent-quantifier-on-quantifier shape such
/// as `(a+)+` or `(a*)*`, the classic exponential-backtracking trigger for
/// a backtracking regex engine. This is a heuristic, not a proof of
/// linear-time evaluation - it exists alongside the hard wall-clock
/// timeout in [`run_with_timeout`], not instead of it.
fn has_nested_quantifier(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut depth_end_positions = Vec::new();
    let mut stack = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => stack.push(i),
            ')' => {
                if stack.pop().is_some() {
                    depth_end_positions.push(i);
                }
            }
            _ => {}
        }
    }
    for end in depth_end_positions {
        if let Some(&next) = chars.get(end + 1) {
            if next == '+' || next == '*' {
                // Walk backwards from `end` to find this group's contents;
                // if the group itself ends in a quantified atom, it is a
                // nested-quantifier shape.
                if end >= 1 && matches!(chars[end - 1], '+' | '*') {
                    return true;
                }
            }
        }
    }
    false
}

fn compile_pattern(pattern: &str, flags: Option<&str>) -> ThinResult<Regex> {
    if pattern.len() > MAX_REGEX_PATTERN_BYTES {
        return ThinError::expected();
    }
    if has_nested_quantifier(pattern) {
        return ThinError::expected();
    }
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.unwrap_or_default().chars() {
        match flag {
            's' => {
                builder.dot_matches_new_line(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            'i' => {
                builder.case_insensitive(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            _ => return ThinError::expected(),
        }
    }
    builder.build().map_err(|_| ThinError::Expected)
}

/// Runs `f` on a dedicated thread and aborts (as far as the caller is
/// concerned - the worker thread itself is detached, not killed, since
/// `regex` has no cooperative cancellation point) if it does not finish
/// within [`REGEX_TIMEOUT`].
fn run_with_timeout<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> ThinResult<T> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(REGEX_TIMEOUT).map_err(|_| ThinError::Expected)
}

pub fn regex_match(text: &Term, pattern: &Term, flags: Option<&Term>) -> ThinResult<bool> {
    let text = lexical_string(text)?.to_owned();
    let pattern = lexical_string(pattern)?.to_owned();
    let flags = flags.map(lexical_string).transpose()?.map(str::to_owned);
    let regex = compile_pattern(&pattern, flags.as_deref())?;
    run_with_timeout(move || regex.is_match(&text))
}

pub fn replace(
    text: &Term,
    pattern: &Term,
    replacement: &Term,
    flags: Option<&Term>,
) -> ThinResult<Term> {
    let text_str = lexical_string(text)?.to_owned();
    let pattern = lexical_string(pattern)?.to_owned();
    let replacement = lexical_string(replacement)?.to_owned();
    let flags = flags.map(lexical_string).transpose()?.map(str::to_owned);
    let regex = compile_pattern(&pattern, flags.as_deref())?;
    let result = run_with_timeout(move || regex.replace_all(&text_str, replacement.as_str()).into_owned())?;
    Ok(Term::Literal(Literal::new_simple_literal(result)))
}
