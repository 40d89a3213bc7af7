use crate::decimal::Decimal;
use oxrdf::vocab::xsd;
use oxrdf::Literal;
use ts_common::{ThinError, ThinResult};
use ts_model::Term;

/// The numeric type ladder `integer ≺ decimal ≺ float ≺ double` used to
/// promote operands of arithmetic and numeric comparison to a common type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumericValue {
    Integer(i64),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
}

impl NumericValue {
    /// Parses a literal's numeric value from its datatype and lexical form,
    /// returning `None` for non-numeric datatypes.
    pub fn parse(lit: &Literal) -> Option<NumericValue> {
        let datatype = lit.datatype();
        if datatype == xsd::INTEGER
            || datatype == xsd::INT
            || datatype == xsd::LONG
            || datatype == xsd::SHORT
            || datatype == xsd::BYTE
            || datatype == xsd::NON_NEGATIVE_INTEGER
            || datatype == xsd::POSITIVE_INTEGER
            || datatype == xsd::NON_POSITIVE_INTEGER
            || datatype == xsd::NEGATIVE_INTEGER
            || datatype == xsd::UNSIGNED_LONG
            || datatype == xsd::UNSIGNED_INT
        {
            lit.value().parse().ok().map(NumericValue::Integer)
        } else if datatype == xsd::DECIMAL {
            lit.value().parse().ok().map(NumericValue::Decimal)
        } else if datatype == xsd::FLOAT {
            lit.value().parse().ok().map(NumericValue::Float)
        } else if datatype == xsd::DOUBLE {
            lit.value().parse().ok().map(NumericValue::Double)
        } else {
            None
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            NumericValue::Integer(i) => i == 0,
            NumericValue::Decimal(d) => d.is_zero(),
            NumericValue::Float(f) => f == 0.0,
            NumericValue::Double(d) => d == 0.0,
        }
    }

    fn rank(self) -> u8 {
        match self {
            NumericValue::Integer(_) => 0,
            NumericValue::Decimal(_) => 1,
            NumericValue::Float(_) => 2,
            NumericValue::Double(_) => 3,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            NumericValue::Integer(i) => i as f64,
            NumericValue::Decimal(d) => d.to_f64(),
            NumericValue::Float(f) => f as f64,
            NumericValue::Double(d) => d,
        }
    }

    pub fn to_decimal(self) -> Option<Decimal> {
        match self {
            NumericValue::Integer(i) => Some(Decimal::from_i64(i)),
            NumericValue::Decimal(d) => Some(d),
            NumericValue::Float(f) => Decimal::from_f64(f as f64),
            NumericValue::Double(d) => Decimal::from_f64(d),
        }
    }

    /// Promotes `self` and `other` to the higher of their two ranks.
    fn promote(self, other: NumericValue) -> (NumericValue, NumericValue) {
        let target = self.rank().max(other.rank());
        (self.cast_to_rank(target), other.cast_to_rank(target))
    }

    fn cast_to_rank(self, rank: u8) -> NumericValue {
        match rank {
            0 => self,
            1 => NumericValue::Decimal(self.to_decimal().unwrap_or(Decimal::ZERO)),
            2 => NumericValue::Float(self.to_f64() as f32),
            _ => NumericValue::Double(self.to_f64()),
        }
    }

    pub fn to_term(self) -> Term {
        match self {
            NumericValue::Integer(i) => {
                Term::Literal(Literal::new_typed_literal(i.to_string(), xsd::INTEGER))
            }
            NumericValue::Decimal(d) => {
                Term::Literal(Literal::new_typed_literal(d.to_string(), xsd::DECIMAL))
            }
            NumericValue::Float(f) => {
                Term::Literal(Literal::new_typed_literal(f.to_string(), xsd::FLOAT))
            }
            NumericValue::Double(d) => {
                Term::Literal(Literal::new_typed_literal(d.to_string(), xsd::DOUBLE))
            }
        }
    }
}

fn numeric_of(term: &Term) -> ThinResult<NumericValue> {
    match term {
        Term::Literal(lit) => NumericValue::parse(lit).ok_or(ThinError::Expected),
        _ => Err(ThinError::Expected),
    }
}

pub fn add(a: &Term, b: &Term) -> ThinResult<Term> {
    let (a, b) = numeric_of(a)?.promote(numeric_of(b)?);
    apply(
        a,
        b,
        |x, y| x.checked_add(y),
        |x, y| x.checked_add(y),
        |x, y| x + y,
        |x, y| x + y,
    )
}

pub fn subtract(a: &Term, b: &Term) -> ThinResult<Term> {
    let (a, b) = numeric_of(a)?.promote(numeric_of(b)?);
    apply(
        a,
        b,
        |x, y| x.checked_sub(y),
        |x, y| x.checked_sub(y),
        |x, y| x - y,
        |x, y| x - y,
    )
}

pub fn multiply(a: &Term, b: &Term) -> ThinResult<Term> {
    let (a, b) = numeric_of(a)?.promote(numeric_of(b)?);
    apply(
        a,
        b,
        |x, y| x.checked_mul(y),
        |x, y| x.checked_mul(y),
        |x, y| x * y,
        |x, y| x * y,
    )
}

/// Division always promotes integer operands to decimal first, per the
/// evaluator's semantics section.
pub fn divide(a: &Term, b: &Term) -> ThinResult<Term> {
    let a = numeric_of(a)?;
    let b = numeric_of(b)?;
    let (a, b) = match (a, b) {
        (NumericValue::Integer(a), NumericValue::Integer(b)) => (
            NumericValue::Decimal(Decimal::from_i64(a)),
            NumericValue::Decimal(Decimal::from_i64(b)),
        ),
        (a, b) => a.promote(b),
    };
    match (a, b) {
        (NumericValue::Decimal(a), NumericValue::Decimal(b)) => a
            .checked_div(b)
            .map(|r| NumericValue::Decimal(r).to_term())
            .ok_or(ThinError::Expected),
        (NumericValue::Float(a), NumericValue::Float(b)) => {
            if b == 0.0 {
                ThinError::expected()
            } else {
                Ok(NumericValue::Float(a / b).to_term())
            }
        }
        (NumericValue::Double(a), NumericValue::Double(b)) => {
            if b == 0.0 {
                ThinError::expected()
            } else {
                Ok(NumericValue::Double(a / b).to_term())
            }
        }
        _ => ThinError::expected(),
    }
}

pub fn negate(a: &Term) -> ThinResult<Term> {
    let a = numeric_of(a)?;
    Ok(match a {
        NumericValue::Integer(i) => NumericValue::Integer(-i),
        NumericValue::Decimal(d) => NumericValue::Decimal(d.neg()),
        NumericValue::Float(f) => NumericValue::Float(-f),
        NumericValue::Double(d) => NumericValue::Double(-d),
    }
    .to_term())
}

fn apply(
    a: NumericValue,
    b: NumericValue,
    on_integer: impl Fn(i64, i64) -> Option<i64>,
    on_decimal: impl Fn(Decimal, Decimal) -> Option<Decimal>,
    on_float: impl Fn(f32, f32) -> f32,
    on_double: impl Fn(f64, f64) -> f64,
) -> ThinResult<Term> {
    match (a, b) {
        (NumericValue::Integer(a), NumericValue::Integer(b)) => on_integer(a, b)
            .map(|r| NumericValue::Integer(r).to_term())
            .ok_or(ThinError::Expected),
        (NumericValue::Decimal(a), NumericValue::Decimal(b)) => on_decimal(a, b)
            .map(|r| NumericValue::Decimal(r).to_term())
            .ok_or(ThinError::Expected),
        (NumericValue::Float(a), NumericValue::Float(b)) => {
            Ok(NumericValue::Float(on_float(a, b)).to_term())
        }
        (NumericValue::Double(a), NumericValue::Double(b)) => {
            Ok(NumericValue::Double(on_double(a, b)).to_term())
        }
        _ => ThinError::expected(),
    }
}

pub fn abs(a: &Term) -> ThinResult<Term> {
    let a = numeric_of(a)?;
    Ok(match a {
        NumericValue::Integer(i) => NumericValue::Integer(i.abs()),
        NumericValue::Decimal(d) => NumericValue::Decimal(d.abs()),
        NumericValue::Float(f) => NumericValue::Float(f.abs()),
        NumericValue::Double(d) => NumericValue::Double(d.abs()),
    }
    .to_term())
}

pub fn round(a: &Term) -> ThinResult<Term> {
    let a = numeric_of(a)?;
    Ok(match a {
        NumericValue::Integer(i) => NumericValue::Integer(i),
        NumericValue::Decimal(d) => NumericValue::Decimal(d.round()),
        NumericValue::Float(f) => NumericValue::Float(f.round()),
        NumericValue::Double(d) => NumericValue::Double(d.round()),
    }
    .to_term())
}

pub fn ceil(a: &Term) -> ThinResult<Term> {
    let a = numeric_of(a)?;
    Ok(match a {
        NumericValue::Integer(i) => NumericValue::Integer(i),
        NumericValue::Decimal(d) => NumericValue::Decimal(d.ceil()),
        NumericValue::Float(f) => NumericValue::Float(f.ceil()),
        NumericValue::Double(d) => NumericValue::Double(d.ceil()),
    }
    .to_term())
}

pub fn floor(a: &Term) -> ThinResult<Term> {
    let a = numeric_of(a)?;
    Ok(match a {
        NumericValue::Integer(i) => NumericValue::Integer(i),
        NumericValue::Decimal(d) => NumericValue::Decimal(d.floor()),
        NumericValue::Float(f) => NumericValue::Float(f.floor()),
        NumericValue::Double(d) => NumericValue::Double(d.floor()),
    }
    .to_term())
}

/// `RAND()` - a fresh xsd:double in `[0, 1)` on every call.
pub fn rand() -> Term {
    let value: f64 = rand::random::<f64>();
    NumericValue::Double(value).to_term()
}

pub fn is_numeric(term: &Term) -> bool {
    matches!(term, Term::Literal(lit) if NumericValue::parse(lit).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Term {
        Term::Literal(Literal::new_typed_literal(v.to_string(), xsd::INTEGER))
    }

    fn dbl(v: f64) -> Term {
        Term::Literal(Literal::new_typed_literal(v.to_string(), xsd::DOUBLE))
    }

    #[test]
    fn integer_addition_stays_integer() {
        let sum = add(&int(2), &int(3)).unwrap();
        assert_eq!(sum, int(5));
    }

    #[test]
    fn division_promotes_integers_to_decimal() {
        let result = divide(&int(1), &int(2)).unwrap();
        match result {
            Term::Literal(lit) => assert_eq!(lit.datatype(), xsd::DECIMAL),
            _ => panic!("expected literal"),
        }
    }

    #[test]
    fn division_by_zero_double_is_error() {
        assert!(divide(&dbl(1.0), &dbl(0.0)).is_err());
    }

    #[test]
    fn mixed_integer_and_double_promotes_to_double() {
        let result = add(&int(1), &dbl(1.5)).unwrap();
        match result {
            Term::Literal(lit) => {
                assert_eq!(lit.datatype(), xsd::DOUBLE);
                assert_eq!(lit.value(), "2.5");
            }
            _ => panic!("expected literal"),
        }
    }

    #[test]
    fn abs_of_negative_integer() {
        assert_eq!(abs(&int(-4)).unwrap(), int(4));
    }
}
