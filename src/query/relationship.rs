//! Relationship classification between two individuals (C9), by nearest
//! common ancestor depth.
//!
//! Per spec.md §9's open question on mixed blood/marriage relationships,
//! this reports the *first* edge-type match found: a direct [`EdgeKind::Spouse`]
//! wins over blood classification, since a married couple who also happen to
//! share a blood ancestor (a cousin marriage) is far more usefully reported
//! as "spouse" than "third cousins". [`super::path`] classifies the
//! mixed-edge-type case differently, by path composition, since it answers
//! a different question (how are these two connected at all, not what is
//! their primary relationship).

use crate::graph::Graph;

use super::traverse::{ancestors, spouses_of};

/// The classified relationship from the first individual's perspective to
/// the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relationship {
    Same,
    Spouse,
    Parent,
    Child,
    Sibling,
    Grandparent,
    Grandchild,
    /// N generations above, for N > 2.
    Ancestor { generations: u32 },
    /// N generations below, for N > 2.
    Descendant { generations: u32 },
    AuntOrUncle,
    NieceOrNephew,
    /// `degree` 1 = first cousin, 2 = second cousin, ...; `removed` is the
    /// generational offset.
    Cousin { degree: u32, removed: u32 },
    Unrelated,
}

/// Classifies the relationship of `b` to `a`.
#[must_use]
pub fn classify(graph: &Graph, a: u32, b: u32) -> Relationship {
    if a == b {
        return Relationship::Same;
    }
    if spouses_of(graph, a).contains(&b) {
        return Relationship::Spouse;
    }

    let ancestors_a = ancestors(graph, a, None);
    let ancestors_b = ancestors(graph, b, None);

    if let Some(&(_, depth_b)) = ancestors_a.iter().find(|&&(id, _)| id == b) {
        return match depth_b {
            1 => Relationship::Parent,
            2 => Relationship::Grandparent,
            n => Relationship::Ancestor { generations: n },
        };
    }
    if let Some(&(_, depth_a)) = ancestors_b.iter().find(|&&(id, _)| id == a) {
        return match depth_a {
            1 => Relationship::Child,
            2 => Relationship::Grandchild,
            n => Relationship::Descendant { generations: n },
        };
    }

    let mut best: Option<(u32, u32)> = None; // (depth_a, depth_b) of closest common ancestor
    for &(id, depth_a) in &ancestors_a {
        if let Some(&(_, depth_b)) = ancestors_b.iter().find(|&&(other, _)| other == id) {
            let better = match best {
                None => true,
                Some((ba, bb)) => depth_a + depth_b < ba + bb,
            };
            if better {
                best = Some((depth_a, depth_b));
            }
        }
    }

    let Some((depth_a, depth_b)) = best else {
        return Relationship::Unrelated;
    };

    match (depth_a, depth_b) {
        (1, 1) => Relationship::Sibling,
        (1, d) if d >= 2 => Relationship::NieceOrNephew,
        (d, 1) if d >= 2 => Relationship::AuntOrUncle,
        (da, db) => Relationship::Cousin {
            degree: da.min(db) - 1,
            removed: da.abs_diff(db),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_graph, GraphBuilderOptions};
    use crate::record::parse_serial;

    fn cousins_graph() -> Graph {
        let text = "0 @G@ INDI\n1 NAME Grand\n1 FAMS @FG@\n\
0 @GS@ INDI\n1 NAME GrandSpouse\n1 FAMS @FG@\n\
0 @P1@ INDI\n1 NAME ParentOne\n1 FAMC @FG@\n1 FAMS @F1@\n\
0 @P2@ INDI\n1 NAME ParentTwo\n1 FAMC @FG@\n1 FAMS @F2@\n\
0 @C1@ INDI\n1 NAME CousinOne\n1 FAMC @F1@\n\
0 @C2@ INDI\n1 NAME CousinTwo\n1 FAMC @F2@\n\
0 @FG@ FAM\n1 HUSB @G@\n1 WIFE @GS@\n1 CHIL @P1@\n1 CHIL @P2@\n\
0 @F1@ FAM\n1 HUSB @P1@\n1 CHIL @C1@\n\
0 @F2@ FAM\n1 HUSB @P2@\n1 CHIL @C2@\n";
        let (tree, _) = parse_serial(text).unwrap();
        build_graph(&tree, &GraphBuilderOptions::new()).0
    }

    #[test]
    fn first_cousins_are_classified_correctly() {
        let graph = cousins_graph();
        let c1 = graph.id_for_xref("@C1@").unwrap();
        let c2 = graph.id_for_xref("@C2@").unwrap();
        assert_eq!(
            classify(&graph, c1, c2),
            Relationship::Cousin { degree: 1, removed: 0 }
        );
    }

    #[test]
    fn siblings_are_classified_correctly() {
        let graph = cousins_graph();
        let p1 = graph.id_for_xref("@P1@").unwrap();
        let p2 = graph.id_for_xref("@P2@").unwrap();
        assert_eq!(classify(&graph, p1, p2), Relationship::Sibling);
    }

    #[test]
    fn grandparent_is_classified_correctly() {
        let graph = cousins_graph();
        let c1 = graph.id_for_xref("@C1@").unwrap();
        let g = graph.id_for_xref("@G@").unwrap();
        assert_eq!(classify(&graph, c1, g), Relationship::Grandparent);
    }

    #[test]
    fn spouses_take_priority_over_blood_classification() {
        let graph = cousins_graph();
        let g = graph.id_for_xref("@G@").unwrap();
        let gs = graph.id_for_xref("@GS@").unwrap();
        assert_eq!(classify(&graph, g, gs), Relationship::Spouse);
    }
}
