use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::profile::{Profile, Role};
use crate::models::session::CurrentUser;

/// Returns whether the profile's role is one of the required roles.
///
/// An absent profile never passes, regardless of the required set.
pub fn check_permission(profile: Option<&Profile>, required: &[Role]) -> bool {
    match profile {
        Some(profile) => required.contains(&profile.role),
        None => false,
    }
}

/// Returns whether the given user authored the record.
pub fn is_author(user_id: Uuid, author_id: Uuid) -> bool {
    user_id == author_id
}

/// Errors with `Unauthorized` unless the profile holds one of the required roles.
pub fn require(profile: Option<&Profile>, required: &[Role]) -> Result<()> {
    if check_permission(profile, required) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Whether the user may manage accounts and profiles.
pub fn can_manage_users(profile: Option<&Profile>) -> bool {
    check_permission(profile, &[Role::SuperAdmin])
}

/// Whether the user may manage members and leadership records.
pub fn can_manage_members(profile: Option<&Profile>) -> bool {
    check_permission(profile, &[Role::SuperAdmin, Role::Admin])
}

/// Whether the user may publish articles (as opposed to drafting them).
pub fn can_publish_articles(profile: Option<&Profile>) -> bool {
    check_permission(profile, &[Role::SuperAdmin, Role::Admin])
}

/// Whether the user may modify a content record with the given author.
///
/// Admins may modify anything; a kontributor only their own records.
pub fn can_modify_content(current: &CurrentUser, author_id: Uuid) -> bool {
    if check_permission(current.profile.as_ref(), &[Role::SuperAdmin, Role::Admin]) {
        return true;
    }
    check_permission(current.profile.as_ref(), &[Role::Kontributor])
        && is_author(current.user_id, author_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile_with_role(role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "user@example.org".to_string(),
            full_name: None,
            role,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_must_be_member_of_required_set() {
        let all = [Role::SuperAdmin, Role::Admin, Role::Kontributor];
        for role in all {
            let profile = profile_with_role(role);
            for required in [
                &all[..],
                &[Role::SuperAdmin][..],
                &[Role::SuperAdmin, Role::Admin][..],
                &[][..],
            ] {
                assert_eq!(
                    check_permission(Some(&profile), required),
                    required.contains(&role),
                );
            }
        }
    }

    #[test]
    fn absent_profile_never_passes() {
        assert!(!check_permission(None, &[]));
        assert!(!check_permission(None, &[Role::SuperAdmin]));
        assert!(!check_permission(
            None,
            &[Role::SuperAdmin, Role::Admin, Role::Kontributor]
        ));
    }

    #[test]
    fn author_check_compares_identities() {
        let id = Uuid::new_v4();
        assert!(is_author(id, id));
        assert!(!is_author(id, Uuid::new_v4()));
    }

    #[test]
    fn kontributor_may_only_modify_own_content() {
        let author = Uuid::new_v4();
        let kontributor = CurrentUser {
            user_id: author,
            profile: Some(profile_with_role(Role::Kontributor)),
        };
        assert!(can_modify_content(&kontributor, author));
        assert!(!can_modify_content(&kontributor, Uuid::new_v4()));

        let admin = CurrentUser {
            user_id: Uuid::new_v4(),
            profile: Some(profile_with_role(Role::Admin)),
        };
        assert!(can_modify_content(&admin, author));

        let anonymous = CurrentUser {
            user_id: author,
            profile: None,
        };
        assert!(!can_modify_content(&anonymous, author));
    }
}
