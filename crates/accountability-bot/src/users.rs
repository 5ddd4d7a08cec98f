//! The fixed pair of users.

use tracker_store::{completed_in, DayEntry, UserId};

/// One of the two participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub partner_id: UserId,
    /// Checklist, in display order.
    pub tasks: Vec<String>,
    pub is_admin: bool,
}

impl User {
    /// Whether `task` is on this user's checklist.
    pub fn has_task(&self, task: &str) -> bool {
        self.tasks.iter().any(|t| t == task)
    }

    /// Tasks done in `entry`, ignoring names no longer on the checklist.
    pub fn completed(&self, entry: Option<&DayEntry>) -> usize {
        completed_in(entry, &self.tasks)
    }

    /// Whether every task is done in `entry`.
    pub fn all_done(&self, entry: Option<&DayEntry>) -> bool {
        !self.tasks.is_empty() && self.completed(entry) == self.tasks.len()
    }
}

/// Immutable registry of the two users, built once at startup.
#[derive(Debug, Clone)]
pub struct UserRegistry {
    users: [User; 2],
}

impl UserRegistry {
    /// Pair two users as each other's partner. The first one is the admin.
    pub fn pair(
        first: (UserId, String, Vec<String>),
        second: (UserId, String, Vec<String>),
    ) -> Self {
        let (first_id, first_name, first_tasks) = first;
        let (second_id, second_name, second_tasks) = second;
        Self {
            users: [
                User {
                    id: first_id,
                    name: first_name,
                    partner_id: second_id,
                    tasks: first_tasks,
                    is_admin: true,
                },
                User {
                    id: second_id,
                    name: second_name,
                    partner_id: first_id,
                    tasks: second_tasks,
                    is_admin: false,
                },
            ],
        }
    }

    /// Look up a user; `None` means unauthorized.
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Both users, admin first.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> UserRegistry {
        UserRegistry::pair(
            (1, "Ann".into(), vec!["Run".into(), "Read".into()]),
            (2, "Ben".into(), vec!["Maths".into()]),
        )
    }

    #[test]
    fn test_partners_point_at_each_other() {
        let registry = registry();
        assert_eq!(registry.get(1).unwrap().partner_id, 2);
        assert_eq!(registry.get(2).unwrap().partner_id, 1);
        assert!(registry.get(1).unwrap().is_admin);
        assert!(!registry.get(2).unwrap().is_admin);
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_all_done() {
        let registry = registry();
        let ann = registry.get(1).unwrap();
        let mut entry = DayEntry::new();
        entry.insert("Run".into(), true);
        assert!(!ann.all_done(Some(&entry)));
        entry.insert("Read".into(), true);
        assert!(ann.all_done(Some(&entry)));
        assert!(!ann.all_done(None));
    }
}
