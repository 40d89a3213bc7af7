/// The three covering indices every triple is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Index {
    Spo,
    Pos,
    Osp,
}

impl Index {
    /// Picks the index whose leading key positions are most bound, per the
    /// specification's "most selective covering index" requirement: a
    /// pattern with the subject bound (possibly with others) scans SPO; a
    /// pattern with only the predicate bound (or predicate+object) scans
    /// POS; a pattern with only the object bound scans OSP; an unbound
    /// pattern defaults to SPO (a full scan, any index would do).
    pub fn select(pattern: &BoundPattern) -> Self {
        match (
            pattern.subject.is_some(),
            pattern.predicate.is_some(),
            pattern.object.is_some(),
        ) {
            (true, _, _) => Index::Spo,
            (false, true, _) => Index::Pos,
            (false, false, true) => Index::Osp,
            (false, false, false) => Index::Spo,
        }
    }

    /// Reorders `(s, p, o)` into this index's key order.
    pub fn key_order(self, s: u64, p: u64, o: u64) -> (u64, u64, u64) {
        match self {
            Index::Spo => (s, p, o),
            Index::Pos => (p, o, s),
            Index::Osp => (o, s, p),
        }
    }

    /// Inverse of [`Index::key_order`]: recovers `(s, p, o)` from a key in
    /// this index's order.
    pub fn from_key_order(self, key: (u64, u64, u64)) -> (u64, u64, u64) {
        match self {
            Index::Spo => key,
            Index::Pos => (key.2, key.0, key.1),
            Index::Osp => (key.1, key.2, key.0),
        }
    }
}

/// A triple pattern after bound variables have been substituted and
/// constants encoded: each position is either a concrete id or unbound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundPattern {
    pub subject: Option<u64>,
    pub predicate: Option<u64>,
    pub object: Option<u64>,
}

impl BoundPattern {
    pub fn new(subject: Option<u64>, predicate: Option<u64>, object: Option<u64>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    pub fn bound_count(&self) -> usize {
        [self.subject, self.predicate, self.object]
            .iter()
            .filter(|p| p.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_spo_when_subject_bound() {
        let pattern = BoundPattern::new(Some(1), None, None);
        assert_eq!(Index::select(&pattern), Index::Spo);
    }

    #[test]
    fn selects_pos_when_only_predicate_bound() {
        let pattern = BoundPattern::new(None, Some(1), None);
        assert_eq!(Index::select(&pattern), Index::Pos);
    }

    #[test]
    fn selects_osp_when_only_object_bound() {
        let pattern = BoundPattern::new(None, None, Some(1));
        assert_eq!(Index::select(&pattern), Index::Osp);
    }

    #[test]
    fn key_order_round_trips() {
        for index in [Index::Spo, Index::Pos, Index::Osp] {
            let key = index.key_order(1, 2, 3);
            assert_eq!(index.from_key_order(key), (1, 2, 3));
        }
    }
}
