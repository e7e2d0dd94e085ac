//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Boxes and pieces inside a packing hierarchy are entities: two pieces with
/// the same quantity are still different rows, and edits address them by id.
pub trait Entity {
    /// Identifier, unique within the owning container.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
