//! Tiered proximity expression builder.
//!
//! For every ordered pair of query terms the builder emits structural
//! expressions whose strength depends on how far apart the terms sit in the
//! query. Each expression is wrapped so that it also binds a nearby link
//! mention; the service reports those bindings back as `LINK` summary
//! elements.
//!
//! | Pair distance | Base forms                                   | Wraps |
//! |---------------|----------------------------------------------|-------|
//! | 1             | seq(a,b), seq(b,a), within-close, within-wide | 2     |
//! | 2             | within-close, within-wide                    | 2     |
//! | > 2           | within-wide                                  | 1     |
//!
//! A single-term query gets the two wraps around the bare term.

use tracing::debug;

use crate::config::LinkQueryConfig;
use crate::model::Term;
use super::{Boundary, FeatureSet, ProximityExpr, SelectionFeature, Tier, WeightedExpr};

/// Build the link-capturing features for `terms`.
///
/// Returns an empty `FeatureSet` (no selection gate either) for zero terms.
pub fn build_link_query(terms: &[Term], config: &LinkQueryConfig) -> FeatureSet {
    let mut features = FeatureSet::default();
    if terms.is_empty() {
        return features;
    }

    let forms = Forms::new(config);
    match terms {
        [term] => forms.single(term, &mut features.summaries),
        _ => {
            for i in 0..terms.len() {
                for k in 0..terms.len() {
                    if i != k {
                        forms.pair(terms, i, k, &mut features.summaries);
                    }
                }
            }
        }
    }

    features.matches = terms.to_vec();
    features.selection = Some(SelectionFeature::contains(terms));

    debug!(
        terms = terms.len(),
        expressions = features.summaries.len(),
        "built link query features"
    );
    features
}

/// Expression factory bound to one configuration.
struct Forms<'c> {
    config: &'c LinkQueryConfig,
    boundary: Boundary,
}

impl<'c> Forms<'c> {
    fn new(config: &'c LinkQueryConfig) -> Self {
        Self { config, boundary: config.boundary }
    }

    fn link(&self) -> ProximityExpr {
        ProximityExpr::capture(&self.config.link_term_type, &self.config.capture_variable)
    }

    fn sequence(&self, range: i32, a: &Term, b: &Term) -> ProximityExpr {
        ProximityExpr::sequence(range, self.boundary, vec![
            ProximityExpr::term(a.clone()),
            ProximityExpr::term(b.clone()),
        ])
    }

    fn within(&self, range: i32, a: &Term, b: &Term) -> ProximityExpr {
        ProximityExpr::within(range, self.boundary, vec![
            ProximityExpr::term(a.clone()),
            ProximityExpr::term(b.clone()),
        ])
    }

    /// Emit `base` twice: link mention before it, and after it.
    fn wrap_both(&self, tier: Tier, weight: f64, base: ProximityExpr, out: &mut Vec<WeightedExpr>) {
        let range = self.config.ranges.capture;
        out.push(WeightedExpr {
            tier,
            weight,
            expr: ProximityExpr::chain(range, self.boundary, vec![self.link(), base.clone()]),
        });
        out.push(WeightedExpr {
            tier,
            weight,
            expr: ProximityExpr::sequence(-range, self.boundary, vec![base, self.link()]),
        });
    }

    fn pair(&self, terms: &[Term], i: usize, k: usize, out: &mut Vec<WeightedExpr>) {
        // k < i is covered by the backward forms of (k, i)
        let Some(gap) = k.checked_sub(i) else {
            return;
        };
        let (a, b) = (&terms[i], &terms[k]);
        let ranges = self.config.ranges;
        let weights = &self.config.weights;

        match gap {
            1 => {
                let bases = [
                    self.sequence(ranges.sequence, a, b),
                    self.sequence(ranges.sequence, b, a),
                    self.within(ranges.close, a, b),
                    self.within(ranges.wide, a, b),
                ];
                for (base, weight) in bases.into_iter().zip(weights.adjacent) {
                    self.wrap_both(Tier::Adjacent, weight, base, out);
                }
            }
            2 => {
                let bases = [self.within(ranges.close, a, b), self.within(ranges.wide, a, b)];
                for (base, weight) in bases.into_iter().zip(weights.near) {
                    self.wrap_both(Tier::Near, weight, base, out);
                }
            }
            _ => {
                let base = self.within(ranges.wide, a, b);
                out.push(WeightedExpr {
                    tier: Tier::Far,
                    weight: weights.far,
                    expr: ProximityExpr::in_range(ranges.capture, self.boundary, vec![self.link(), base]),
                });
            }
        }
    }

    fn single(&self, term: &Term, out: &mut Vec<WeightedExpr>) {
        self.wrap_both(
            Tier::Single,
            self.config.weights.single,
            ProximityExpr::term(term.clone()),
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(values: &[&str]) -> Vec<Term> {
        values.iter().map(|v| Term::word(*v)).collect()
    }

    fn build(values: &[&str]) -> FeatureSet {
        build_link_query(&words(values), &LinkQueryConfig::default())
    }

    #[test]
    fn test_empty_query_has_no_features() {
        let features = build(&[]);
        assert!(features.is_empty());
        assert!(features.selection.is_none());
    }

    #[test]
    fn test_single_term() {
        let features = build(&["nile"]);
        assert_eq!(features.summaries.len(), 2);
        assert_eq!(features.count_tier(Tier::Single), 2);

        let chain = &features.summaries[0].expr;
        assert_eq!(chain.operator(), "chain_struct");
        assert_eq!(chain.structure().unwrap().range, 50);
        assert!(chain.children()[0].captures());

        let seq = &features.summaries[1].expr;
        assert_eq!(seq.operator(), "sequence_struct");
        assert_eq!(seq.structure().unwrap().range, -50);
        assert!(seq.children()[1].captures());

        assert!(features.summaries.iter().all(|e| e.weight == 1.0));
        assert_eq!(features.selection.unwrap().terms.len(), 1);
    }

    #[test]
    fn test_adjacent_pair_weights() {
        let features = build(&["river", "delta"]);
        assert_eq!(features.summaries.len(), 8);
        let weights: Vec<f64> = features.summaries.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![3.0, 3.0, 2.0, 2.0, 2.0, 2.0, 1.5, 1.5]);

        // second base form is the backward sequence
        let backward = &features.summaries[2].expr.children()[1];
        assert_eq!(backward.terms(), vec![&Term::word("delta"), &Term::word("river")]);
    }

    #[test]
    fn test_three_terms_tiers() {
        let features = build(&["a", "b", "c"]);
        assert_eq!(features.count_tier(Tier::Adjacent), 16);
        assert_eq!(features.count_tier(Tier::Near), 4);
        assert_eq!(features.count_tier(Tier::Far), 0);

        let near: Vec<f64> = features
            .summaries
            .iter()
            .filter(|e| e.tier == Tier::Near)
            .map(|e| e.weight)
            .collect();
        assert_eq!(near, vec![1.6, 1.6, 1.2, 1.2]);
    }

    #[test]
    fn test_far_pair_is_wrapped_once() {
        let features = build(&["a", "b", "c", "d"]);
        assert_eq!(features.count_tier(Tier::Far), 1);
        let far = features.summaries.iter().find(|e| e.tier == Tier::Far).unwrap();
        assert_eq!(far.weight, 1.1);
        assert_eq!(far.expr.operator(), "inrange_struct");
        assert_eq!(far.expr.terms(), vec![&Term::word("a"), &Term::word("d")]);
    }

    #[test]
    fn test_every_expression_captures_within_sentence() {
        let features = build(&["a", "b", "c", "d", "e"]);
        for e in &features.summaries {
            assert!(e.expr.captures());
            assert_eq!(e.expr.structure().unwrap().boundary, Boundary::Sentence);
        }
        assert_eq!(features.matches.len(), 5);
    }

    #[test]
    fn test_is_deterministic() {
        assert_eq!(build(&["x", "y", "z"]), build(&["x", "y", "z"]));
    }
}
