//! Role membership reconciliation for organizations and spaces.
//!
//! A declared member is either a user GUID or a username. Members are
//! converged one grant at a time: every missing grant is added before any
//! surplus grant is revoked, so a caller managing its own role keeps its
//! authority until the replacement exists.

use cfdriver_client::{RoleMember, RoleParent, Session};
use cfdriver_core::is_guid;
use tracing::info;

use crate::error::Result;

/// Organization-level role granting plain membership.
pub const ORG_MEMBERSHIP_ROLE: &str = "users";

/// Whether a declared entry designates the given server member.
pub fn matches(entry: &str, member: &RoleMember) -> bool {
    entry == member.guid
        || member
            .username
            .as_deref()
            .is_some_and(|u| u.to_lowercase() == entry.to_lowercase())
}

/// Result of diffing declared entries against server members.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RoleDiff<'a> {
    pub add: Vec<&'a str>,
    pub remove: Vec<&'a RoleMember>,
}

impl RoleDiff<'_> {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

pub fn diff_members<'a>(desired: &'a [String], current: &'a [RoleMember]) -> RoleDiff<'a> {
    let mut add: Vec<&str> = Vec::new();
    for entry in desired {
        let pending = add.iter().any(|a| a.to_lowercase() == entry.to_lowercase());
        if !pending && !current.iter().any(|m| matches(entry, m)) {
            add.push(entry);
        }
    }
    let remove = current
        .iter()
        .filter(|m| !desired.iter().any(|e| matches(e, m)))
        .collect();
    RoleDiff { add, remove }
}

/// Server members expressed in the declaration's spelling.
///
/// Matched members keep the first declared entry naming them, in declared
/// order; unmatched members follow as GUIDs. Each server member appears once.
pub fn project_members(declared: &[String], current: &[RoleMember]) -> Vec<String> {
    let mut seen: Vec<&str> = Vec::new();
    let mut out: Vec<String> = Vec::new();
    for entry in declared {
        if let Some(member) = current.iter().find(|m| matches(entry, m))
            && !seen.contains(&member.guid.as_str())
        {
            seen.push(&member.guid);
            out.push(entry.clone());
        }
    }
    let mut extra: Vec<String> = current
        .iter()
        .filter(|m| !declared.iter().any(|e| matches(e, m)))
        .map(|m| m.guid.clone())
        .collect();
    extra.sort();
    out.extend(extra);
    out
}

async fn grant(
    session: &Session,
    parent: RoleParent,
    guid: &str,
    role: &str,
    entry: &str,
) -> Result<()> {
    if is_guid(entry) {
        session.v2.grant_role(parent, guid, role, entry).await?;
    } else {
        session
            .v2
            .grant_role_by_username(parent, guid, role, entry)
            .await?;
    }
    Ok(())
}

/// Converges one role on one parent entity to `desired`.
///
/// For space roles `org_guid` names the owning organization; new members are
/// made members of it first. Revoking a space role never touches the org.
pub async fn reconcile_role(
    session: &Session,
    parent: RoleParent,
    guid: &str,
    role: &str,
    desired: &[String],
    org_guid: Option<&str>,
) -> Result<()> {
    let current = session.v2.role_members(parent, guid, role).await?;
    let diff = diff_members(desired, &current);
    if diff.is_empty() {
        return Ok(());
    }

    if let Some(org_guid) = org_guid
        && !diff.add.is_empty()
    {
        let org_members = session
            .v2
            .role_members(RoleParent::Organization, org_guid, ORG_MEMBERSHIP_ROLE)
            .await?;
        for entry in &diff.add {
            if !org_members.iter().any(|m| matches(entry, m)) {
                grant(
                    session,
                    RoleParent::Organization,
                    org_guid,
                    ORG_MEMBERSHIP_ROLE,
                    entry,
                )
                .await?;
            }
        }
    }

    for entry in &diff.add {
        info!(%guid, role, user = entry, "granting role");
        grant(session, parent, guid, role, entry).await?;
    }
    for member in &diff.remove {
        info!(%guid, role, user = %member.guid, "revoking role");
        session
            .v2
            .revoke_role(parent, guid, role, &member.guid)
            .await?;
    }
    Ok(())
}

/// Revokes the role from every server member matched by `declared`.
pub async fn revoke_declared(
    session: &Session,
    parent: RoleParent,
    guid: &str,
    role: &str,
    declared: &[String],
) -> Result<()> {
    let current = session.v2.role_members(parent, guid, role).await?;
    for member in current
        .iter()
        .filter(|m| declared.iter().any(|e| matches(e, m)))
    {
        session
            .v2
            .revoke_role(parent, guid, role, &member.guid)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(guid: &str, username: &str) -> RoleMember {
        RoleMember {
            guid: guid.to_string(),
            username: Some(username.to_string()),
        }
    }

    fn entries(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_match_by_guid_or_username() {
        let m = member("u-1", "Alice@Example.com");
        assert!(matches("u-1", &m));
        assert!(matches("alice@example.com", &m));
        assert!(!matches("bob", &m));
    }

    #[test]
    fn test_diff() {
        let current = vec![member("u-1", "alice"), member("u-2", "bob")];
        let desired = entries(&["ALICE", "carol", "carol"]);
        let diff = diff_members(&desired, &current);
        assert_eq!(diff.add, vec!["carol"]);
        assert_eq!(diff.remove.len(), 1);
        assert_eq!(diff.remove[0].guid, "u-2");
    }

    #[test]
    fn test_converged_set_has_empty_diff() {
        let current = vec![member("u-1", "alice")];
        assert!(diff_members(&entries(&["u-1"]), &current).is_empty());
    }

    #[test]
    fn test_projection_keeps_declared_spelling() {
        let current = vec![member("u-2", "bob"), member("u-1", "alice")];
        let projected = project_members(&entries(&["Alice"]), &current);
        assert_eq!(projected, entries(&["Alice", "u-2"]));
    }

    #[test]
    fn test_projection_lists_each_member_once() {
        let current = vec![member("u-1", "alice"), member("u-2", "bob")];
        let projected = project_members(&entries(&["alice", "bob", "ALICE", "u-1"]), &current);
        assert_eq!(projected, entries(&["alice", "bob"]));
    }

    #[test]
    fn test_differently_spelled_new_member_is_granted_once() {
        let desired = entries(&["Carol", "carol"]);
        let diff = diff_members(&desired, &[]);
        assert_eq!(diff.add, vec!["Carol"]);
    }
}
