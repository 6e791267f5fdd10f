use std::collections::HashMap;

use async_trait::async_trait;

/// Group membership lookups, owned by the user management layer
#[async_trait]
pub trait GroupMembership: Send + Sync + std::fmt::Debug {
    async fn groups_of(&self, user: &str) -> Vec<String>;
}

/// Fixed group -> members table
#[derive(Debug, Clone, Default)]
pub struct StaticGroups {
    members: HashMap<String, Vec<String>>,
}

impl StaticGroups {
    pub fn new(members: HashMap<String, Vec<String>>) -> Self {
        Self { members }
    }

    pub fn with_group(mut self, group: &str, users: &[&str]) -> Self {
        self.members.insert(
            group.to_string(),
            users.iter().map(|u| u.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl GroupMembership for StaticGroups {
    async fn groups_of(&self, user: &str) -> Vec<String> {
        let mut groups: Vec<String> = self
            .members
            .iter()
            .filter(|(_, users)| users.iter().any(|u| u == user))
            .map(|(group, _)| group.clone())
            .collect();
        groups.sort();
        groups
    }
}
