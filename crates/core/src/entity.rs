//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Records persisted as lists (products, sale lines) are looked up by this id,
/// never by their position in the list.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// First id shared by two entities in `items`, in list order.
pub fn first_duplicate_id<E: Entity>(items: &[E]) -> Option<&E::Id> {
    let mut seen = std::collections::HashSet::new();
    items.iter().map(E::id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(u32);

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.0
        }
    }

    #[test]
    fn reports_the_first_repeated_id() {
        let rows = [Row(1), Row(2), Row(1), Row(2)];
        assert_eq!(first_duplicate_id(&rows), Some(&1));
    }

    #[test]
    fn unique_lists_have_no_duplicate() {
        assert_eq!(first_duplicate_id(&[Row(1), Row(2)]), None);
        assert_eq!(first_duplicate_id::<Row>(&[]), None);
    }
}
