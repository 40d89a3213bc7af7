use crate::decimal::Decimal;
use oxrdf::vocab::xsd;
use oxrdf::Literal;
use ts_common::{ThinError, ThinResult};
use ts_model::Term;

/// The components of an `xsd:dateTime` lexical form, parsed independently
/// of the dictionary's second-precision inline encoding (this evaluator
/// needs fractional seconds and the raw timezone offset, neither of which
/// the inline path carries).
struct ParsedDateTime {
    year: i64,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: Decimal,
    /// Offset from UTC in minutes; `None` if the lexical form carried no
    /// timezone.
    tz_offset_minutes: Option<i32>,
}

fn parse_date_time(lexical: &str) -> ThinResult<ParsedDateTime> {
    let (date_part, rest) = lexical.split_once('T').ok_or(ThinError::Expected)?;
    let mut date_iter = date_part.splitn(3, '-');
    let year: i64 = date_iter.next().ok_or(ThinError::Expected)?.parse()?;
    let month: u32 = date_iter.next().ok_or(ThinError::Expected)?.parse()?;
    let day: u32 = date_iter.next().ok_or(ThinError::Expected)?.parse()?;

    let (time_part, tz_offset_minutes) = split_timezone(rest)?;
    let mut time_iter = time_part.splitn(3, ':');
    let hour: u32 = time_iter.next().ok_or(ThinError::Expected)?.parse()?;
    let minute: u32 = time_iter.next().ok_or(ThinError::Expected)?.parse()?;
    let second: Decimal = time_iter
        .next()
        .ok_or(ThinError::Expected)?
        .parse()
        .map_err(|_| ThinError::Expected)?;

    Ok(ParsedDateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
        tz_offset_minutes,
    })
}

fn split_timezone(time_part: &str) -> ThinResult<(&str, Option<i32>)> {
    if let Some(stripped) = time_part.strip_suffix('Z') {
        return Ok((stripped, Some(0)));
    }
    // A `+HH:MM` or `-HH:MM` suffix, distinguished from the lexical form's
    // leading/only `-` characters in the date part by scanning from the end.
    if time_part.len() >= 6 {
        let (body, suffix) = time_part.split_at(time_part.len() - 6);
        if let Some(sign_char) = suffix.chars().next() {
            if (sign_char == '+' || sign_char == '-') && suffix.as_bytes()[3] == b':' {
                let sign = if sign_char == '-' { -1 } else { 1 };
                let hh: i32 = suffix[1..3].parse()?;
                let mm: i32 = suffix[4..6].parse()?;
                return Ok((body, Some(sign * (hh * 60 + mm))));
            }
        }
    }
    Ok((time_part, None))
}

fn numeric_literal(value: i64) -> Term {
    Term::Literal(Literal::new_typed_literal(value.to_string(), xsd::INTEGER))
}

fn as_literal(term: &Term) -> ThinResult<&str> {
    match term {
        Term::Literal(lit) if lit.datatype() == xsd::DATE_TIME => Ok(lit.value()),
        _ => Err(ThinError::Expected),
    }
}

pub fn year(term: &Term) -> ThinResult<Term> {
    Ok(numeric_literal(parse_date_time(as_literal(term)?)?.year))
}

pub fn month(term: &Term) -> ThinResult<Term> {
    Ok(numeric_literal(parse_date_time(as_literal(term)?)?.month as i64))
}

pub fn day(term: &Term) -> ThinResult<Term> {
    Ok(numeric_literal(parse_date_time(as_literal(term)?)?.day as i64))
}

pub fn hours(term: &Term) -> ThinResult<Term> {
    Ok(numeric_literal(parse_date_time(as_literal(term)?)?.hour as i64))
}

pub fn minutes(term: &Term) -> ThinResult<Term> {
    Ok(numeric_literal(parse_date_time(as_literal(term)?)?.minute as i64))
}

pub fn seconds(term: &Term) -> ThinResult<Term> {
    let parsed = parse_date_time(as_literal(term)?)?;
    Ok(Term::Literal(Literal::new_typed_literal(
        parsed.second.to_string(),
        xsd::DECIMAL,
    )))
}

/// `TIMEZONE(term)`: the zone as an `xsd:dayTimeDuration`. Errors if the
/// lexical form carries no timezone.
pub fn timezone(term: &Term) -> ThinResult<Term> {
    let parsed = parse_date_time(as_literal(term)?)?;
    let minutes = parsed.tz_offset_minutes.ok_or(ThinError::Expected)?;
    let sign = if minutes < 0 { "-" } else { "" };
    let abs_minutes = minutes.unsigned_abs();
    let lexical = format!("{sign}PT{}H{}M", abs_minutes / 60, abs_minutes % 60);
    Ok(Term::Literal(Literal::new_typed_literal(
        lexical,
        xsd::DAY_TIME_DURATION,
    )))
}

/// `NOW()`: the current instant as an `xsd:dateTime` in UTC. Every call
/// within one query should reuse the same value (a stable "now" for the
/// duration of the evaluation); the executor is responsible for caching
/// it rather than this function evaluating it freshly per call.
pub fn now() -> ThinResult<Term> {
    let epoch_seconds = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|_| ThinError::Expected)?
        .as_secs() as i64;
    let days = epoch_seconds.div_euclid(86_400);
    let secs_of_day = epoch_seconds.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let hour = secs_of_day / 3_600;
    let minute = (secs_of_day % 3_600) / 60;
    let second = secs_of_day % 60;
    let lexical = format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z");
    Ok(Term::Literal(Literal::new_typed_literal(lexical, xsd::DATE_TIME)))
}

/// Howard Hinnant's civil-from-days algorithm (proleptic Gregorian, days
/// since 1970-01-01). Duplicated from `ts-dictionary`'s inline encoder
/// rather than shared, since that module's version is private and scoped
/// to second-precision inline term encoding.
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

/// `TZ(term)`: the zone as a plain string (`""` when absent).
pub fn tz(term: &Term) -> ThinResult<Term> {
    let parsed = parse_date_time(as_literal(term)?)?;
    let s = match parsed.tz_offset_minutes {
        None => String::new(),
        Some(0) => "Z".to_owned(),
        Some(minutes) => {
            let sign = if minutes < 0 { "-" } else { "+" };
            let abs_minutes = minutes.unsigned_abs();
            format!("{sign}{:02}:{:02}", abs_minutes / 60, abs_minutes % 60)
        }
    };
    Ok(Term::Literal(Literal::new_simple_literal(s)))
}
