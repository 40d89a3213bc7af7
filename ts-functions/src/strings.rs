use oxrdf::Literal;
use ts_common::{ThinError, ThinResult};
use ts_model::Term;

/// Extracts a literal's lexical form along with its language tag, so
/// string functions can decide whether to preserve it on the result (per
/// SPARQL's "language tag propagates through string functions of a single
/// argument" rule).
fn lexical(term: &Term) -> ThinResult<(&str, Option<&str>)> {
    match term {
        Term::Literal(lit) if lit.datatype() == oxrdf::vocab::xsd::STRING || lit.language().is_some() => {
            Ok((lit.value(), lit.language()))
        }
        _ => Err(ThinError::Expected),
    }
}

fn make_like(value: String, lang: Option<&str>) -> Term {
    match lang {
        Some(tag) => Term::Literal(
            Literal::new_language_tagged_literal_unchecked(value, tag.to_owned()),
        ),
        None => Term::Literal(Literal::new_simple_literal(value)),
    }
}

pub fn str_len(term: &Term) -> ThinResult<Term> {
    let (s, _) = lexical(term)?;
    let len: i64 = s.chars().count().try_into().map_err(|_| ThinError::Expected)?;
    Ok(Term::Literal(Literal::new_typed_literal(
        len.to_string(),
        oxrdf::vocab::xsd::INTEGER,
    )))
}

/// 1-based, inclusive-from; `length` omitted means "to the end".
pub fn substr(term: &Term, start: f64, length: Option<f64>) -> ThinResult<Term> {
    let (s, lang) = lexical(term)?;
    let chars: Vec<char> = s.chars().collect();
    let start_idx = (start.round() - 1.0).max(0.0) as usize;
    let end_idx = match length {
        Some(len) => {
            let raw_end = start.round() - 1.0 + len.round();
            (raw_end.max(0.0) as usize).min(chars.len())
        }
        None => chars.len(),
    };
    let end_idx = end_idx.max(start_idx);
    let slice: String = chars
        .get(start_idx.min(chars.len())..end_idx.min(chars.len()))
        .unwrap_or(&[])
        .iter()
        .collect();
    Ok(make_like(slice, lang))
}

pub fn ucase(term: &Term) -> ThinResult<Term> {
    let (s, lang) = lexical(term)?;
    Ok(make_like(s.to_uppercase(), lang))
}

pub fn lcase(term: &Term) -> ThinResult<Term> {
    let (s, lang) = lexical(term)?;
    Ok(make_like(s.to_lowercase(), lang))
}

pub fn str_starts(term: &Term, prefix: &Term) -> ThinResult<bool> {
    let (s, _) = lexical(term)?;
    let (p, _) = lexical(prefix)?;
    Ok(s.starts_with(p))
}

pub fn str_ends(term: &Term, suffix: &Term) -> ThinResult<bool> {
    let (s, _) = lexical(term)?;
    let (p, _) = lexical(suffix)?;
    Ok(s.ends_with(p))
}

pub fn contains(term: &Term, needle: &Term) -> ThinResult<bool> {
    let (s, _) = lexical(term)?;
    let (n, _) = lexical(needle)?;
    Ok(s.contains(n))
}

pub fn str_before(term: &Term, sep: &Term) -> ThinResult<Term> {
    let (s, lang) = lexical(term)?;
    let (sep, _) = lexical(sep)?;
    match s.find(sep) {
        Some(idx) => Ok(make_like(s[..idx].to_owned(), lang)),
        None => Ok(Term::Literal(Literal::new_simple_literal(""))),
    }
}

pub fn str_after(term: &Term, sep: &Term) -> ThinResult<Term> {
    let (s, lang) = lexical(term)?;
    let (sep, _) = lexical(sep)?;
    match s.find(sep) {
        Some(idx) => Ok(make_like(s[idx + sep.len()..].to_owned(), lang)),
        None => Ok(Term::Literal(Literal::new_simple_literal(""))),
    }
}

pub fn encode_for_uri(term: &Term) -> ThinResult<Term> {
    let (s, _) = lexical(term)?;
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    Ok(Term::Literal(Literal::new_simple_literal(out)))
}

pub fn concat(terms: &[Term]) -> ThinResult<Term> {
    let mut out = String::new();
    let mut common_lang: Option<Option<&str>> = None;
    for term in terms {
        let (s, lang) = lexical(term)?;
        out.push_str(s);
        common_lang = match common_lang {
            None => Some(lang),
            Some(existing) if existing == lang => Some(existing),
            Some(_) => Some(None),
        };
    }
    Ok(make_like(out, common_lang.flatten()))
}

/// `LANGMATCHES(tag, range)`: `range` of `*` matches any non-empty tag; a
/// range ending before a `-` boundary matches that prefix, per BCP 47/RFC
/// 4647 basic filtering.
pub fn lang_matches(tag: &Term, range: &Term) -> ThinResult<bool> {
    let (tag, _) = lexical(tag)?;
    let (range, _) = lexical(range)?;
    if range == "*" {
        return Ok(!tag.is_empty());
    }
    if tag.eq_ignore_ascii_case(range) {
        return Ok(true);
    }
    let prefix = format!("{range}-");
    Ok(tag.len() > prefix.len() && tag[..prefix.len()].eq_ignore_ascii_case(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Term {
        Term::Literal(Literal::new_simple_literal(s))
    }

    #[test]
    fn strlen_counts_chars_not_bytes() {
        assert_eq!(str_len(&plain("héllo")).unwrap(), {
            Term::Literal(Literal::new_typed_literal("5", oxrdf::vocab::xsd::INTEGER))
        });
    }

    #[test]
    fn substr_is_one_based() {
        let result = substr(&plain("hello"), 2.0, Some(3.0)).unwrap();
        assert_eq!(result, plain("ell"));
    }

    #[test]
    fn substr_without_length_goes_to_end() {
        let result = substr(&plain("hello"), 3.0, None).unwrap();
        assert_eq!(result, plain("llo"));
    }

    #[test]
    fn str_before_and_after_split_on_separator() {
        assert_eq!(str_before(&plain("a/b"), &plain("/")).unwrap(), plain("a"));
        assert_eq!(str_after(&plain("a/b"), &plain("/")).unwrap(), plain("b"));
    }

    #[test]
    fn str_before_without_match_returns_empty_string() {
        assert_eq!(str_before(&plain("abc"), &plain("/")).unwrap(), plain(""));
    }

    #[test]
    fn langmatches_wildcard_matches_any_nonempty_tag() {
        let tag = Term::Literal(Literal::new_language_tagged_literal_unchecked("hello", "en-US"));
        assert!(lang_matches(&tag, &plain("*")).unwrap());
    }

    #[test]
    fn langmatches_respects_subtag_boundary() {
        let tag = Term::Literal(Literal::new_language_tagged_literal_unchecked("hello", "en-US"));
        assert!(lang_matches(&tag, &plain("en")).unwrap());
        let tag2 = Term::Literal(Literal::new_language_tagged_literal_unchecked("hello", "eng"));
        assert!(!lang_matches(&tag2, &plain("en")).unwrap());
    }

    #[test]
    fn concat_drops_language_tag_on_mismatch() {
        let a = Term::Literal(Literal::new_language_tagged_literal_unchecked("a", "en"));
        let b = Term::Literal(Literal::new_language_tagged_literal_unchecked("b", "fr"));
        let result = concat(&[a, b]).unwrap();
        assert_eq!(result, plain("ab"));
    }
}
