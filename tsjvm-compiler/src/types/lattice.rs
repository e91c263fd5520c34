//! Numeric widening lattice
//!
//! The widening relation is a fixed directed graph over the numeric
//! primitives (`byte -> short -> int -> long -> float -> double` and
//! `char -> int`). Promotion of two kinds is their least upper bound in
//! that graph. Both the graph and the promotion table are built once and
//! shared read-only by every compilation.

use crate::types::kind::PrimitiveKind;
use lazy_static::lazy_static;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;

/// "`from` widens to `to` without data loss for arithmetic purposes"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromotionEdge {
    pub from: PrimitiveKind,
    pub to: PrimitiveKind,
}

const EDGES: [PromotionEdge; 6] = [
    PromotionEdge {
        from: PrimitiveKind::Byte,
        to: PrimitiveKind::Short,
    },
    PromotionEdge {
        from: PrimitiveKind::Short,
        to: PrimitiveKind::Int,
    },
    PromotionEdge {
        from: PrimitiveKind::Char,
        to: PrimitiveKind::Int,
    },
    PromotionEdge {
        from: PrimitiveKind::Int,
        to: PrimitiveKind::Long,
    },
    PromotionEdge {
        from: PrimitiveKind::Long,
        to: PrimitiveKind::Float,
    },
    PromotionEdge {
        from: PrimitiveKind::Float,
        to: PrimitiveKind::Double,
    },
];

lazy_static! {
    static ref WIDENING_GRAPH: DiGraphMap<PrimitiveKind, ()> = build_widening_graph();
    static ref PROMOTION_TABLE: HashMap<(PrimitiveKind, PrimitiveKind), PrimitiveKind> =
        build_promotion_table();
}

fn build_widening_graph() -> DiGraphMap<PrimitiveKind, ()> {
    let mut graph = DiGraphMap::new();
    for kind in PrimitiveKind::NUMERIC {
        graph.add_node(kind);
    }
    for edge in promotion_edges() {
        graph.add_edge(edge.from, edge.to, ());
    }
    graph
}

fn build_promotion_table() -> HashMap<(PrimitiveKind, PrimitiveKind), PrimitiveKind> {
    let mut table = HashMap::new();
    for a in PrimitiveKind::NUMERIC {
        for b in PrimitiveKind::NUMERIC {
            let upper_bounds: Vec<PrimitiveKind> = PrimitiveKind::NUMERIC
                .into_iter()
                .filter(|candidate| widens_to(a, *candidate) && widens_to(b, *candidate))
                .collect();
            let least = upper_bounds
                .iter()
                .copied()
                .find(|candidate| upper_bounds.iter().all(|other| widens_to(*candidate, *other)));
            if let Some(least) = least {
                table.insert((a, b), least);
            }
        }
    }
    log::trace!("built promotion table with {} entries", table.len());
    table
}

/// The fixed set of direct widening edges
pub fn promotion_edges() -> &'static [PromotionEdge] {
    &EDGES
}

/// Reflexive-transitive widening check
pub fn widens_to(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == to {
        return from.is_numeric();
    }
    if !from.is_numeric() || !to.is_numeric() {
        return false;
    }
    has_path_connecting(&*WIDENING_GRAPH, from, to, None)
}

/// Least upper bound of two numeric kinds (`promote(A, A) == A`)
pub fn promote(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    PROMOTION_TABLE.get(&(a, b)).copied()
}

/// Binary numeric promotion: the least upper bound, but never narrower
/// than `int`
pub fn binary_numeric_promotion(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    promote(a, b).and_then(|kind| promote(kind, PrimitiveKind::Int))
}

/// Unary numeric promotion: `byte`/`short`/`char` become `int`
pub fn unary_numeric_promotion(kind: PrimitiveKind) -> Option<PrimitiveKind> {
    binary_numeric_promotion(kind, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_promotion_is_commutative() {
        for a in PrimitiveKind::NUMERIC {
            for b in PrimitiveKind::NUMERIC {
                assert_eq!(promote(a, b), promote(b, a), "promote({a}, {b})");
            }
        }
    }

    #[test]
    fn test_promotion_is_idempotent() {
        for a in PrimitiveKind::NUMERIC {
            assert_eq!(promote(a, a), Some(a));
        }
    }

    #[test]
    fn test_char_and_short_meet_at_int() {
        assert_eq!(
            promote(PrimitiveKind::Char, PrimitiveKind::Short),
            Some(PrimitiveKind::Int)
        );
        assert_eq!(
            promote(PrimitiveKind::Byte, PrimitiveKind::Short),
            Some(PrimitiveKind::Short)
        );
    }

    #[test]
    fn test_binary_promotion_floors_at_int() {
        assert_eq!(
            binary_numeric_promotion(PrimitiveKind::Byte, PrimitiveKind::Byte),
            Some(PrimitiveKind::Int)
        );
        assert_eq!(
            binary_numeric_promotion(PrimitiveKind::Char, PrimitiveKind::Float),
            Some(PrimitiveKind::Float)
        );
        assert_eq!(
            binary_numeric_promotion(PrimitiveKind::Long, PrimitiveKind::Int),
            Some(PrimitiveKind::Long)
        );
        assert_eq!(
            binary_numeric_promotion(PrimitiveKind::Float, PrimitiveKind::Long),
            Some(PrimitiveKind::Float)
        );
    }

    #[test]
    fn test_boolean_has_no_promotion() {
        assert_eq!(promote(PrimitiveKind::Boolean, PrimitiveKind::Int), None);
        assert!(!widens_to(PrimitiveKind::Boolean, PrimitiveKind::Boolean));
    }

    #[test]
    fn test_every_edge_is_its_own_promotion() {
        assert_eq!(promotion_edges().len(), 6);
        for edge in promotion_edges() {
            assert!(widens_to(edge.from, edge.to));
            assert!(!widens_to(edge.to, edge.from));
            assert_eq!(promote(edge.from, edge.to), Some(edge.to));
        }
    }

    #[test]
    fn test_widening_is_one_directional() {
        assert!(widens_to(PrimitiveKind::Byte, PrimitiveKind::Double));
        assert!(widens_to(PrimitiveKind::Char, PrimitiveKind::Long));
        assert!(!widens_to(PrimitiveKind::Char, PrimitiveKind::Short));
        assert!(!widens_to(PrimitiveKind::Short, PrimitiveKind::Char));
        assert!(!widens_to(PrimitiveKind::Double, PrimitiveKind::Float));
    }
}
