use doctest_scanner::{Annotation, Status};

/// Decide how an annotation changes given a fresh evaluation result.
///
/// Pure function; the whole lifecycle hangs off this table:
///
/// | existing        | fresh vs stored | new annotation        | status    |
/// |-----------------|-----------------|-----------------------|-----------|
/// | None            | —               | Single(fresh)         | Fresh     |
/// | Single(v)       | v == fresh      | Single(v)             | Unchanged |
/// | Single(v)       | v != fresh      | WasNow(v, fresh)      | Regressed |
/// | WasNow(was,now) | now == fresh    | unchanged             | Regressed |
/// | WasNow(was,now) | now != fresh    | WasNow(was, fresh)    | Regressed |
///
/// `was` is a fixed baseline: no input makes this function rewrite it. `now`
/// always tracks the latest run, so repeated regressions keep the newest
/// evidence without losing the baseline.
pub fn reconcile(existing: &Annotation, fresh: &str) -> (Annotation, Status) {
    match existing {
        Annotation::None => (Annotation::Single(fresh.to_string()), Status::Fresh),
        Annotation::Single(value) if value == fresh => (existing.clone(), Status::Unchanged),
        Annotation::Single(value) => (
            Annotation::WasNow {
                was: value.clone(),
                now: fresh.to_string(),
            },
            Status::Regressed,
        ),
        Annotation::WasNow { was, now } => {
            let annotation = if now == fresh {
                existing.clone()
            } else {
                Annotation::WasNow {
                    was: was.clone(),
                    now: fresh.to_string(),
                }
            };
            // A recorded regression stays flagged until the baseline is
            // resolved by hand, even when the result is stable again.
            (annotation, Status::Regressed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn was_now(was: &str, now: &str) -> Annotation {
        Annotation::WasNow {
            was: was.into(),
            now: now.into(),
        }
    }

    #[test]
    fn fresh_directive_records_single() {
        let (annotation, status) = reconcile(&Annotation::None, "5");
        assert_eq!(annotation, Annotation::Single("5".into()));
        assert_eq!(status, Status::Fresh);
    }

    #[test]
    fn matching_single_is_unchanged() {
        let (annotation, status) = reconcile(&Annotation::Single("5".into()), "5");
        assert_eq!(annotation, Annotation::Single("5".into()));
        assert_eq!(status, Status::Unchanged);
    }

    #[test]
    fn differing_single_becomes_regression_pair() {
        let (annotation, status) = reconcile(&Annotation::Single("5".into()), "6");
        assert_eq!(annotation, was_now("5", "6"));
        assert_eq!(status, Status::Regressed);
    }

    #[test]
    fn stable_regression_stays_flagged() {
        let (annotation, status) = reconcile(&was_now("5", "6"), "6");
        assert_eq!(annotation, was_now("5", "6"));
        assert_eq!(status, Status::Regressed);
    }

    #[test]
    fn new_result_updates_now_but_never_was() {
        let (annotation, status) = reconcile(&was_now("5", "6"), "7");
        assert_eq!(annotation, was_now("5", "7"));
        assert_eq!(status, Status::Regressed);
    }

    #[test]
    fn regression_returning_to_baseline_keeps_the_pair() {
        // Only an explicit accept action may reset the baseline; an automated
        // run returning to the old value still leaves the pair in place.
        let (annotation, status) = reconcile(&was_now("5", "6"), "5");
        assert_eq!(annotation, was_now("5", "5"));
        assert_eq!(status, Status::Regressed);
    }
}
