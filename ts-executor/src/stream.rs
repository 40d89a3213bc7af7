use ts_model::{Binding, Variable};

use crate::cancellation::Cancellation;
use crate::error::ExecutionError;

/// A lazy, pull-based sequence of solutions, grounded on the shape of a
/// streaming result wrapper: a fixed variable list plus an inner sequence
/// that is only ever advanced one item at a time. Unlike an async result
/// stream over record batches, this crate's executor is synchronous and
/// row-at-a-time throughout, so the inner sequence is a plain `Iterator`.
pub struct BindingStream<'ctx> {
    variables: Vec<Variable>,
    inner: Box<dyn Iterator<Item = Binding> + 'ctx>,
}

impl<'ctx> BindingStream<'ctx> {
    pub fn new(variables: Vec<Variable>, inner: impl Iterator<Item = Binding> + 'ctx) -> Self {
        Self {
            variables,
            inner: Box::new(inner),
        }
    }

    pub fn empty(variables: Vec<Variable>) -> Self {
        Self::new(variables, std::iter::empty())
    }

    /// The single unit solution, for the pattern-less `Bgp([])` leaf.
    pub fn unit() -> Self {
        Self::new(Vec::new(), std::iter::once(Binding::empty()))
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn into_inner(self) -> Box<dyn Iterator<Item = Binding> + 'ctx> {
        self.inner
    }
}

impl<'ctx> Iterator for BindingStream<'ctx> {
    type Item = Binding;

    fn next(&mut self) -> Option<Binding> {
        self.inner.next()
    }
}

/// Pulls every remaining solution from `stream`, checking `cancellation`
/// between every pull. On cancellation or timeout, whatever was collected
/// so far is discarded and the error is returned instead - the same
/// "streams stop producing, partial results discarded" contract applies
/// whether the stop signal was an external cancellation or an elapsed
/// deadline.
pub fn drain(stream: BindingStream<'_>, cancellation: &Cancellation) -> Result<Vec<Binding>, ExecutionError> {
    let mut out = Vec::new();
    for binding in stream {
        cancellation.check()?;
        out.push(binding);
    }
    Ok(out)
}

/// As [`drain`], but stops early once `limit` solutions have been
/// collected - used by `ASK` (limit 1) and by callers that only need a
/// bounded prefix without paying for the rest of the pipeline.
pub fn drain_at_most(
    stream: BindingStream<'_>,
    limit: usize,
    cancellation: &Cancellation,
) -> Result<Vec<Binding>, ExecutionError> {
    let mut out = Vec::with_capacity(limit.min(1024));
    for binding in stream {
        if out.len() >= limit {
            break;
        }
        cancellation.check()?;
        out.push(binding);
    }
    Ok(out)
}

/// As [`drain`], but fails with [`ExecutionError::TooManyMatches`] instead
/// of silently truncating once more than `cap` solutions have been pulled -
/// used by the `WHERE` clause of `DELETE`/`INSERT WHERE` updates, which
/// must reject an oversized match set rather than silently operate on a
/// prefix of it.
pub fn drain_capped(
    stream: BindingStream<'_>,
    cap: usize,
    cancellation: &Cancellation,
) -> Result<Vec<Binding>, ExecutionError> {
    let mut out = Vec::new();
    for binding in stream {
        cancellation.check()?;
        if out.len() >= cap {
            return Err(ExecutionError::TooManyMatches(cap));
        }
        out.push(binding);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_stream_yields_exactly_one_empty_binding() {
        let stream = BindingStream::unit();
        let out = drain(stream, &Cancellation::none()).unwrap();
        assert_eq!(out, vec![Binding::empty()]);
    }

    #[test]
    fn drain_at_most_stops_early() {
        let vars = Vec::new();
        let stream = BindingStream::new(vars, std::iter::repeat(Binding::empty()).take(100));
        let out = drain_at_most(stream, 3, &Cancellation::none()).unwrap();
        assert_eq!(out.len(), 3);
    }
}
