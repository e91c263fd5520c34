//! Type system for the compiler core

pub mod kind;
pub mod lattice;
pub mod resolve;

pub use kind::{reference_names, PrimitiveKind, RecordConstraint, StackKind, TypeKind};
pub use lattice::{
    binary_numeric_promotion, promote, promotion_edges, unary_numeric_promotion, widens_to,
    PromotionEdge,
};
pub use resolve::resolve_annotation;
