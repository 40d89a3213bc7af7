//! Inline term id encoding.
//!
//! A term id is a tagged 64-bit integer. The top two bits select the kind;
//! the remaining 62 bits carry the payload. For numeric/temporal kinds the
//! payload is a signed 62-bit quantity with its sign bit flipped, which is
//! the standard trick for making two's-complement values order correctly
//! under plain unsigned integer comparison - exactly the property the
//! specification requires ("inline comparison must preserve ordering
//! within a kind tag").

use oxrdf::vocab::xsd;
use oxrdf::{Literal, Term};

const TAG_SHIFT: u32 = 62;
const TAG_MASK: u64 = 0b11 << TAG_SHIFT;
const PAYLOAD_MASK: u64 = !TAG_MASK;
const SIGN_BIT: i64 = 1 << 61;
const PAYLOAD_MIN: i64 = -(1 << 61);
const PAYLOAD_MAX: i64 = (1 << 61) - 1;

/// Fixed-point scale used to inline-encode `xsd:decimal` values: six
/// decimal digits of fractional precision. Decimals needing more precision
/// (or magnitude beyond the 62-bit payload) fall back to the dictionary.
pub const DECIMAL_SCALE: i64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    Dict,
    Int,
    Decimal,
    DateTime,
}

const TAG_DICT: u64 = 0b00 << TAG_SHIFT;
const TAG_INT: u64 = 0b01 << TAG_SHIFT;
const TAG_DECIMAL: u64 = 0b10 << TAG_SHIFT;
const TAG_DATETIME: u64 = 0b11 << TAG_SHIFT;

/// Returns the kind tag carried by `id`.
pub fn term_kind(id: u64) -> TermKind {
    match id & TAG_MASK {
        TAG_DICT => TermKind::Dict,
        TAG_INT => TermKind::Int,
        TAG_DECIMAL => TermKind::Decimal,
        TAG_DATETIME => TermKind::DateTime,
        _ => unreachable!("only two tag bits are defined"),
    }
}

/// True if `id` carries its value inline rather than referencing the
/// dictionary.
pub fn inline_encoded(id: u64) -> bool {
    term_kind(id) != TermKind::Dict
}

fn pack(tag: u64, value: i64) -> Option<u64> {
    if !(PAYLOAD_MIN..=PAYLOAD_MAX).contains(&value) {
        return None;
    }
    let flipped = (value ^ SIGN_BIT) as u64 & PAYLOAD_MASK;
    Some(tag | flipped)
}

fn unpack(tag: u64, id: u64) -> Option<i64> {
    if id & TAG_MASK != tag {
        return None;
    }
    let payload = (id & PAYLOAD_MASK) as i64;
    Some(payload ^ SIGN_BIT)
}

/// Encodes an `xsd:integer` value inline. Returns `None` ("not_inline") if
/// `value` is outside the representable range; callers must then fall back
/// to the dictionary.
pub fn encode_integer(value: i64) -> Option<u64> {
    pack(TAG_INT, value)
}

pub fn decode_integer(id: u64) -> Option<i64> {
    unpack(TAG_INT, id)
}

/// Encodes an `xsd:decimal` value inline at [`DECIMAL_SCALE`] precision.
/// Returns `None` if the scaled value overflows the payload or `value`
/// cannot be represented at this scale without loss (more than six
/// fractional digits).
pub fn encode_decimal(value: f64) -> Option<u64> {
    let scaled = value * DECIMAL_SCALE as f64;
    if scaled.fract().abs() > f64::EPSILON {
        return None;
    }
    pack(TAG_DECIMAL, scaled as i64)
}

/// Decodes an inline decimal id back to its `(scaled_value, scale)` pair.
pub fn decode_decimal(id: u64) -> Option<(i64, i64)> {
    unpack(TAG_DECIMAL, id).map(|v| (v, DECIMAL_SCALE))
}

/// Encodes a second-precision `xsd:dateTime` (seconds since the Unix
/// epoch) inline. Sub-second precision is not inline-representable and
/// must go through the dictionary.
pub fn encode_datetime(epoch_seconds: i64) -> Option<u64> {
    pack(TAG_DATETIME, epoch_seconds)
}

pub fn decode_datetime(id: u64) -> Option<i64> {
    unpack(TAG_DATETIME, id)
}

/// Attempts to inline-encode an arbitrary RDF term. Only `xsd:integer`,
/// `xsd:decimal` and second-precision `xsd:dateTime` typed literals are
/// ever inline; everything else (including out-of-range values of those
/// types) requires the dictionary.
pub fn try_inline_encode(term: &Term) -> Option<u64> {
    let Term::Literal(literal) = term else {
        return None;
    };
    if literal.language().is_some() {
        return None;
    }
    match literal.datatype() {
        dt if dt == xsd::INTEGER => literal.value().parse::<i64>().ok().and_then(encode_integer),
        dt if dt == xsd::DECIMAL => {
            literal.value().parse::<f64>().ok().and_then(encode_decimal)
        }
        dt if dt == xsd::DATE_TIME => parse_second_precision_epoch(literal.value())
            .and_then(encode_datetime),
        _ => None,
    }
}

/// Decodes an inline id back into its typed literal term. Returns `None`
/// for dictionary ids; those must be resolved through the dictionary.
pub fn decode_term(id: u64) -> Option<Term> {
    match term_kind(id) {
        TermKind::Dict => None,
        TermKind::Int => {
            decode_integer(id).map(|v| Term::Literal(Literal::new_typed_literal(
                v.to_string(),
                xsd::INTEGER,
            )))
        }
        TermKind::Decimal => decode_decimal(id).map(|(scaled, scale)| {
            Term::Literal(Literal::new_typed_literal(
                format_scaled_decimal(scaled, scale),
                xsd::DECIMAL,
            ))
        }),
        TermKind::DateTime => decode_datetime(id).map(|secs| {
            Term::Literal(Literal::new_typed_literal(
                format_epoch_seconds(secs),
                xsd::DATE_TIME,
            ))
        }),
    }
}

fn format_scaled_decimal(scaled: i64, scale: i64) -> String {
    let sign = if scaled < 0 { "-" } else { "" };
    let magnitude = scaled.unsigned_abs();
    let scale = scale as u64;
    let whole = magnitude / scale;
    let frac = magnitude % scale;
    if frac == 0 {
        format!("{sign}{whole}.0")
    } else {
        format!("{sign}{whole}.{frac:06}").trim_end_matches('0').to_string()
    }
}

/// Parses an `xsd:dateTime` lexical form into epoch seconds, rejecting
/// anything with sub-second precision or a timezone offset that is not
/// whole-second (both are dictionary-only).
fn parse_second_precision_epoch(lexical: &str) -> Option<i64> {
    if lexical.contains('.') {
        return None;
    }
    let (date_part, time_part) = lexical.split_once('T')?;
    let mut date_iter = date_part.splitn(3, '-');
    let year: i64 = date_iter.next()?.parse().ok()?;
    let month: i64 = date_iter.next()?.parse().ok()?;
    let day: i64 = date_iter.next()?.parse().ok()?;

    let time_part = time_part.trim_end_matches('Z');
    let mut time_iter = time_part.splitn(3, ':');
    let hour: i64 = time_iter.next()?.parse().ok()?;
    let minute: i64 = time_iter.next()?.parse().ok()?;
    let second: i64 = time_iter.next()?.parse().ok()?;

    Some(days_from_civil(year, month, day) * 86_400 + hour * 3_600 + minute * 60 + second)
}

fn format_epoch_seconds(epoch_seconds: i64) -> String {
    let days = epoch_seconds.div_euclid(86_400);
    let secs_of_day = epoch_seconds.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let hour = secs_of_day / 3_600;
    let minute = (secs_of_day % 3_600) / 60;
    let second = secs_of_day % 60;
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Howard Hinnant's days-from-civil algorithm (proleptic Gregorian, days
/// since 1970-01-01).
fn days_from_civil(y: i64, m: i64, d: i64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, i64, i64) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trips() {
        for v in [0_i64, 1, -1, 42, -42, PAYLOAD_MAX, PAYLOAD_MIN] {
            let id = encode_integer(v).expect("in range");
            assert_eq!(decode_integer(id), Some(v));
            assert_eq!(term_kind(id), TermKind::Int);
        }
    }

    #[test]
    fn integer_ordering_is_preserved() {
        let a = encode_integer(-5).unwrap();
        let b = encode_integer(0).unwrap();
        let c = encode_integer(5).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn out_of_range_integer_is_not_inline() {
        assert_eq!(encode_integer(PAYLOAD_MAX + 1), None);
        assert_eq!(encode_integer(PAYLOAD_MIN - 1), None);
    }

    #[test]
    fn decimal_round_trips_within_precision() {
        let id = encode_decimal(3.5).unwrap();
        let (scaled, scale) = decode_decimal(id).unwrap();
        assert_eq!(scaled as f64 / scale as f64, 3.5);
    }

    #[test]
    fn datetime_round_trips() {
        let lexical = "2024-01-02T03:04:05Z";
        let epoch = parse_second_precision_epoch(lexical).unwrap();
        let id = encode_datetime(epoch).unwrap();
        assert_eq!(decode_datetime(id), Some(epoch));
        assert_eq!(format_epoch_seconds(epoch), lexical);
    }

    #[test]
    fn fractional_seconds_datetime_is_not_inline() {
        let term = Term::Literal(Literal::new_typed_literal(
            "2024-01-02T03:04:05.5Z",
            xsd::DATE_TIME,
        ));
        assert_eq!(try_inline_encode(&term), None);
    }

    #[test]
    fn dict_ids_never_collide_with_inline_tags() {
        assert_eq!(term_kind(0), TermKind::Dict);
        assert_eq!(term_kind(12345), TermKind::Dict);
    }
}
