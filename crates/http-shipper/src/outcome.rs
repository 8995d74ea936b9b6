//! Three-valued delivery outcome with a total severity order.
//!
//! Every HTTP delivery attempt classifies into one of `Ok`, `Retry`
//! or `Error`. A batch verdict is the maximum severity observed over
//! all attempts: once a batch has seen a `Retry` it can never report
//! `Ok`, and once it has seen an `Error` it can never report `Retry`.

/// Result of one delivery attempt, or of a whole batch.
///
/// The derived `Ord` encodes the severity order `Ok < Retry < Error`,
/// so folding a batch verdict is a plain `max` reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    /// Delivered and accepted by the collector.
    Ok,
    /// Not delivered, but a later attempt may succeed (transport
    /// failure, 5xx, any status outside the accepted/unrecoverable
    /// windows).
    Retry,
    /// Rejected for good (4xx) or the batch itself is unusable.
    Error,
}

impl Outcome {
    /// Folds another per-record outcome into a running batch verdict.
    ///
    /// Severity never decreases: `Ok` never overwrites `Retry` or
    /// `Error`, and `Error` wins over everything.
    #[must_use]
    pub fn merge(self, other: Outcome) -> Outcome {
        self.max(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn severity_order() {
        assert!(Outcome::Ok < Outcome::Retry);
        assert!(Outcome::Retry < Outcome::Error);
    }

    #[test]
    fn merge_table() {
        use Outcome::{Error, Ok, Retry};
        let cases = [
            (Ok, Ok, Ok),
            (Ok, Retry, Retry),
            (Ok, Error, Error),
            (Retry, Ok, Retry),
            (Retry, Retry, Retry),
            (Retry, Error, Error),
            (Error, Ok, Error),
            (Error, Retry, Error),
            (Error, Error, Error),
        ];
        for (a, b, want) in cases {
            assert_eq!(a.merge(b), want, "{a:?} merge {b:?}");
        }
    }

    fn arb_outcome() -> impl Strategy<Value = Outcome> {
        prop_oneof![
            Just(Outcome::Ok),
            Just(Outcome::Retry),
            Just(Outcome::Error),
        ]
    }

    proptest! {
        /// The running verdict is non-decreasing and ends at the
        /// maximum severity of the sequence.
        #[test]
        fn fold_is_monotonic_max(seq in proptest::collection::vec(arb_outcome(), 1..32)) {
            let mut verdict = Outcome::Ok;
            for o in &seq {
                let next = verdict.merge(*o);
                prop_assert!(next >= verdict);
                verdict = next;
            }
            let max = seq.iter().copied().max().unwrap_or(Outcome::Ok);
            prop_assert_eq!(verdict, max);
        }
    }
}
