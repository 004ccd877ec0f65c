// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resolved identity and the authorization predicates built on it.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use super::claims::BearerToken;
use super::userinfo::UserInfo;

/// Shape of the groups claim in a userinfo document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupsClaim {
    Absent,
    Single(String),
    Many(Vec<String>),
}

impl GroupsClaim {
    /// Read the claim out of a userinfo document.
    ///
    /// Values of any other JSON type count as absent; non-string list
    /// members are dropped.
    pub fn from_userinfo(userinfo: &UserInfo, claim: &str) -> Self {
        match userinfo.extra.get(claim) {
            Some(Value::String(group)) => GroupsClaim::Single(group.clone()),
            Some(Value::Array(groups)) => GroupsClaim::Many(
                groups
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => GroupsClaim::Absent,
        }
    }

    pub fn into_set(self) -> BTreeSet<String> {
        match self {
            GroupsClaim::Absent => BTreeSet::new(),
            GroupsClaim::Single(group) => BTreeSet::from([group]),
            GroupsClaim::Many(groups) => groups.into_iter().collect(),
        }
    }
}

/// An authenticated caller with a resolved userinfo profile.
///
/// Built once per request by the userinfo guard.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    token: BearerToken,
    userinfo: UserInfo,
    groups: BTreeSet<String>,
    landing_groups: Arc<[String]>,
}

impl AuthorizedUser {
    pub fn new(
        token: BearerToken,
        userinfo: UserInfo,
        groups_claim: &str,
        landing_groups: Arc<[String]>,
    ) -> Self {
        let groups = GroupsClaim::from_userinfo(&userinfo, groups_claim).into_set();
        Self {
            token,
            userinfo,
            groups,
            landing_groups,
        }
    }

    /// The email address, only when the provider marked it verified.
    pub fn email(&self) -> Option<&str> {
        match self.userinfo.email_verified {
            Some(true) => self.userinfo.email.as_deref(),
            _ => None,
        }
    }

    /// True when every required group is held; an empty requirement is
    /// always satisfied.
    pub fn is_in_groups<I, S>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        required
            .into_iter()
            .all(|group| self.groups.contains(group.as_ref()))
    }

    pub fn can_land_changes(&self) -> bool {
        self.is_in_groups(self.landing_groups.iter())
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn subject(&self) -> Option<&str> {
        self.userinfo.sub.as_deref()
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    pub fn userinfo(&self) -> &UserInfo {
        &self.userinfo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::{userinfo_standard, userinfo_with, userinfo_without, GROUPS_CLAIM};
    use serde_json::json;

    fn user(document: Value) -> AuthorizedUser {
        let userinfo: UserInfo = serde_json::from_value(document).unwrap();
        AuthorizedUser::new(
            BearerToken::parse("Bearer token").unwrap(),
            userinfo,
            GROUPS_CLAIM,
            Arc::from(vec!["active_scm_level_3".to_string()]),
        )
    }

    fn no_groups() -> AuthorizedUser {
        user(userinfo_without(GROUPS_CLAIM))
    }

    fn single_group() -> AuthorizedUser {
        user(userinfo_with(GROUPS_CLAIM, json!(["all_scm_level_1"])))
    }

    fn string_group() -> AuthorizedUser {
        user(userinfo_with(GROUPS_CLAIM, json!("all_scm_level_1")))
    }

    #[test]
    fn empty_requirement_is_always_satisfied() {
        let none: [&str; 0] = [];
        assert!(user(userinfo_standard()).is_in_groups(none));
        assert!(no_groups().is_in_groups(none));
        assert!(string_group().is_in_groups(none));
    }

    #[test]
    fn list_claim_requires_every_group() {
        let standard = user(userinfo_standard());
        assert!(!standard.is_in_groups(["bogus"]));
        assert!(!standard.is_in_groups(["active_scm_level_1", "bogus"]));
        assert!(standard.is_in_groups(["active_scm_level_1"]));
        assert!(standard.is_in_groups(["active_scm_level_1", "all_scm_level_1"]));
    }

    #[test]
    fn absent_claim_grants_nothing() {
        let user = no_groups();
        assert!(!user.is_in_groups(["active_scm_level_1"]));
        assert!(!user.is_in_groups(["active_scm_level_1", "bogus"]));
        assert!(user.groups().is_empty());
    }

    #[test]
    fn single_member_list_claim() {
        let user = single_group();
        assert!(user.is_in_groups(["all_scm_level_1"]));
        assert!(!user.is_in_groups(["active_scm_level_1"]));
        assert!(!user.is_in_groups(["active_scm_level_1", "all_scm_level_1"]));
    }

    #[test]
    fn string_claim_is_a_single_group() {
        let user = string_group();
        assert!(user.is_in_groups(["all_scm_level_1"]));
        assert!(!user.is_in_groups(["active_scm_level_1"]));
        assert!(!user.is_in_groups(["active_scm_level_1", "all_scm_level_1"]));
    }

    #[test]
    fn unexpected_claim_shape_is_absent() {
        let user = user(userinfo_with(GROUPS_CLAIM, json!(42)));
        assert!(!user.is_in_groups(["all_scm_level_1"]));

        let info: UserInfo =
            serde_json::from_value(userinfo_with(GROUPS_CLAIM, json!(["a", 1, null]))).unwrap();
        assert_eq!(
            GroupsClaim::from_userinfo(&info, GROUPS_CLAIM),
            GroupsClaim::Many(vec!["a".to_string()])
        );
    }

    #[test]
    fn email_requires_verification() {
        assert_eq!(user(userinfo_standard()).email(), Some("tuser@example.com"));

        let missing = user(userinfo_without("email"));
        let unverified = user(userinfo_with("email_verified", json!(false)));
        let unknown = user(userinfo_without("email_verified"));
        assert_eq!(missing.email(), None);
        assert_eq!(missing.email(), unverified.email());
        assert_eq!(unknown.email(), None);
    }

    #[test]
    fn can_land_changes_uses_configured_groups() {
        assert!(user(userinfo_standard()).can_land_changes());
        assert!(!single_group().can_land_changes());
        assert!(!no_groups().can_land_changes());
    }

    #[test]
    fn exposes_identity() {
        let user = user(userinfo_standard());
        assert_eq!(user.subject(), Some("ad|Example-LDAP|testuser"));
        assert_eq!(user.token().as_str(), "token");
        assert_eq!(user.userinfo().name.as_deref(), Some("Test User"));
    }
}
