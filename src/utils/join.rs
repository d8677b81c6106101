use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::model::profile::Profile;

/// A left row paired with the right row sharing its key, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Joined<L, R> {
    pub row: L,
    pub related: Option<R>,
}

/// Left join of two separately fetched collections.
///
/// Every left row appears exactly once, in input order. When several right
/// rows share a key the first one wins.
pub fn join_by_key<L, R, K, FL, FR>(
    left: Vec<L>,
    right: &[R],
    left_key: FL,
    right_key: FR,
) -> Vec<Joined<L, R>>
where
    K: Eq + Hash,
    R: Clone,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let mut index: HashMap<K, &R> = HashMap::with_capacity(right.len());
    for r in right {
        index.entry(right_key(r)).or_insert(r);
    }

    left.into_iter()
        .map(|row| {
            let related = index.get(&left_key(&row)).map(|r| (*r).clone());
            Joined { row, related }
        })
        .collect()
}

impl<L> Joined<L, Profile> {
    pub fn first_name_or(&self, default: &str) -> String {
        self.related
            .as_ref()
            .map(|p| p.first_name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn last_name_or(&self, default: &str) -> String {
        self.related
            .as_ref()
            .map(|p| p.last_name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn display_name(&self) -> String {
        self.related
            .as_ref()
            .map(Profile::full_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn staff_id(&self) -> String {
        self.related
            .as_ref()
            .map(|p| p.staff_id.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn department(&self) -> String {
        self.related
            .as_ref()
            .map(|p| p.department.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn profile(id: u64, first: &str) -> Profile {
        Profile {
            id,
            staff_id: format!("ICP/2024/{id:03}"),
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            department: "Computer Science".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn keeps_every_left_row_in_order() {
        let left = vec![(1u64, "a"), (2, "b"), (1, "c")];
        let right = vec![profile(1, "John")];
        let joined = join_by_key(left, &right, |l| l.0, |p| p.id);

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].row.1, "a");
        assert_eq!(joined[1].row.1, "b");
        assert_eq!(joined[2].row.1, "c");
        assert!(joined[0].related.is_some());
        assert!(joined[1].related.is_none());
        assert_eq!(joined[2].related.as_ref().map(|p| p.id), Some(1));
    }

    #[test]
    fn first_duplicate_on_the_right_wins() {
        let right = vec![profile(7, "First"), profile(7, "Second")];
        let joined = join_by_key(vec![7u64], &right, |l| *l, |p| p.id);
        assert_eq!(joined[0].first_name_or("Unknown"), "First");
    }

    #[test]
    fn missing_profile_falls_back_to_defaults() {
        let profiles: Vec<Profile> = Vec::new();
        let joined = join_by_key(vec![9u64], &profiles, |l| *l, |p| p.id);
        let row = &joined[0];
        assert_eq!(row.display_name(), "Unknown");
        assert_eq!(row.staff_id(), "N/A");
        assert_eq!(row.department(), "N/A");
        assert_eq!(row.first_name_or("Unknown"), "Unknown");
        assert_eq!(row.last_name_or("Admin"), "Admin");
    }

    #[test]
    fn present_profile_is_used() {
        let right = vec![profile(3, "Ada")];
        let joined = join_by_key(vec![3u64], &right, |l| *l, |p| p.id);
        assert_eq!(joined[0].display_name(), "Ada Doe");
        assert_eq!(joined[0].staff_id(), "ICP/2024/003");
    }
}
