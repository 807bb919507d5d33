use serde::{Deserialize, Serialize};

/// A named set of users that share expenses with each other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl Group {
    /// Creates a group, dropping repeated member ids while keeping first-seen order.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        member_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut members: Vec<String> = Vec::new();
        for member in member_ids {
            let member = member.into();
            if !members.contains(&member) {
                members.push(member);
            }
        }
        Self {
            id: id.into(),
            name: name.into(),
            member_ids: members,
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|member| member == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_members_collapse() {
        let group = Group::new("GRP1", "Trip", ["USR1", "USR2", "USR1"]);
        assert_eq!(group.member_ids, vec!["USR1", "USR2"]);
        assert!(group.has_member("USR2"));
        assert!(!group.has_member("USR3"));
    }

    #[test]
    fn serializes_member_ids_in_camel_case() {
        let group = Group::new("GRP1", "Trip", ["USR1"]);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["memberIds"], serde_json::json!(["USR1"]));
    }
}
