use crate::{terms_equal, Term, Variable};

/// An ordered mapping from variable to bound RDF term, representing one
/// SPARQL solution. Insertion order is preserved so that `ORDER BY`/
/// `SELECT` projection can report variables in a stable, query-relative
/// order; lookups are linear, which is appropriate given solutions
/// typically bind a handful of variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding {
    entries: Vec<(Variable, Term)>,
}

impl Binding {
    /// The empty ("unit") solution.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.entries
            .iter()
            .find(|(v, _)| v == var)
            .map(|(_, t)| t)
    }

    pub fn is_bound(&self, var: &Variable) -> bool {
        self.get(var).is_some()
    }

    /// Binds `var` to `term`, overwriting any previous binding.
    pub fn insert(&mut self, var: Variable, term: Term) {
        if let Some(slot) = self.entries.iter_mut().find(|(v, _)| *v == var) {
            slot.1 = term;
        } else {
            self.entries.push((var, term));
        }
    }

    pub fn with(mut self, var: Variable, term: Term) -> Self {
        self.insert(var, term);
        self
    }

    pub fn remove(&mut self, var: &Variable) {
        self.entries.retain(|(v, _)| v != var);
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter().map(|(v, _)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.entries.iter().map(|(v, t)| (v, t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two bindings are compatible iff they agree, by RDF equality, on
    /// every variable bound in both.
    pub fn is_compatible(&self, other: &Binding) -> bool {
        self.entries.iter().all(|(v, t)| match other.get(v) {
            Some(other_t) => terms_equal(t, other_t),
            None => true,
        })
    }

    /// Merges two compatible bindings. Caller must have checked
    /// [`Binding::is_compatible`] first; this does not re-check.
    pub fn merge(&self, other: &Binding) -> Binding {
        let mut merged = self.clone();
        for (v, t) in &other.entries {
            if !merged.is_bound(v) {
                merged.insert(v.clone(), t.clone());
            }
        }
        merged
    }

    /// Restricts this binding to the given variables; variables that are
    /// not bound are simply absent from the result.
    pub fn project(&self, vars: &[Variable]) -> Binding {
        let mut result = Binding::empty();
        for v in vars {
            if let Some(t) = self.get(v) {
                result.insert(v.clone(), t.clone());
            }
        }
        result
    }
}

impl FromIterator<(Variable, Term)> for Binding {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        let mut binding = Binding::empty();
        for (v, t) in iter {
            binding.insert(v, t);
        }
        binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    fn var(name: &str) -> Variable {
        Variable::new(name).unwrap()
    }

    fn lit(value: &str) -> Term {
        Term::Literal(Literal::new_simple_literal(value))
    }

    #[test]
    fn compatible_bindings_merge() {
        let a = Binding::empty().with(var("s"), lit("alice"));
        let b = Binding::empty().with(var("n"), lit("Alice"));
        assert!(a.is_compatible(&b));
        let merged = a.merge(&b);
        assert_eq!(merged.get(&var("s")), Some(&lit("alice")));
        assert_eq!(merged.get(&var("n")), Some(&lit("Alice")));
    }

    #[test]
    fn conflicting_bindings_are_incompatible() {
        let a = Binding::empty().with(var("s"), lit("alice"));
        let b = Binding::empty().with(var("s"), lit("bob"));
        assert!(!a.is_compatible(&b));
    }

    #[test]
    fn project_drops_unbound_variables() {
        let a = Binding::empty().with(var("s"), lit("alice"));
        let projected = a.project(&[var("s"), var("missing")]);
        assert_eq!(projected.len(), 1);
        assert!(projected.is_bound(&var("s")));
    }

    #[test]
    fn language_tags_compare_case_insensitively() {
        let a = Term::NamedNode(NamedNode::new("http://example.com/a").unwrap());
        let b = Term::NamedNode(NamedNode::new("http://example.com/a").unwrap());
        assert!(terms_equal(&a, &b));

        let en = Term::Literal(Literal::new_language_tagged_literal_unchecked("x", "en"));
        let en_upper = Term::Literal(Literal::new_language_tagged_literal_unchecked("x", "EN"));
        assert!(terms_equal(&en, &en_upper));
    }
}
