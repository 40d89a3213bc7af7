use md5::{Digest, Md5};
use oxrdf::Literal;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use ts_common::{ThinError, ThinResult};
use ts_model::Term;

fn simple_lexical(term: &Term) -> ThinResult<&str> {
    match term {
        Term::Literal(lit) if lit.datatype() == oxrdf::vocab::xsd::STRING => Ok(lit.value()),
        _ => Err(ThinError::Expected),
    }
}

fn hex_literal(bytes: impl AsRef<[u8]>) -> Term {
    Term::Literal(Literal::new_simple_literal(hex::encode(bytes)))
}

pub fn md5(term: &Term) -> ThinResult<Term> {
    let s = simple_lexical(term)?;
    Ok(hex_literal(Md5::digest(s.as_bytes())))
}

pub fn sha1(term: &Term) -> ThinResult<Term> {
    let s = simple_lexical(term)?;
    Ok(hex_literal(Sha1::digest(s.as_bytes())))
}

pub fn sha256(term: &Term) -> ThinResult<Term> {
    let s = simple_lexical(term)?;
    Ok(hex_literal(Sha256::digest(s.as_bytes())))
}

pub fn sha384(term: &Term) -> ThinResult<Term> {
    let s = simple_lexical(term)?;
    Ok(hex_literal(Sha384::digest(s.as_bytes())))
}

pub fn sha512(term: &Term) -> ThinResult<Term> {
    let s = simple_lexical(term)?;
    Ok(hex_literal(Sha512::digest(s.as_bytes())))
}
