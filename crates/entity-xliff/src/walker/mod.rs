//! The entity/field tree walker.
//!
//! Both halves treat an entity's properties as a tree whose nodes are
//! adapter-handled values, entity references and lists of either.
//! [`extract`] flattens a source graph into a [`LabeledTree`](crate::LabeledTree);
//! [`merge`] walks a translated tree in lock-step with the target graph,
//! creating and rewiring referenced targets as it goes and queueing every
//! touched entity for a depth-ordered save.
//!
//! Both walks keep the identities of the entities on the current path and
//! stop at the configured reference depth, so cyclic data terminates.

pub mod extract;
pub mod merge;
