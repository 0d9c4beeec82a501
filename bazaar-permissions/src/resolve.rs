use bazaar_catalog::models::{AccessLevel, Model, Permission, TeamRole};
use uuid::Uuid;

/// The effective permission a caller holds on a model. Ordered so that
/// `Write > Read > None`, which lets the resolver express "explicit grant
/// beats the cascade, but never drops an owner below write" as a single
/// `max` rather than a chain of early returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EffectivePermission {
    None,
    Read,
    Write,
}

impl From<Permission> for EffectivePermission {
    fn from(p: Permission) -> Self {
        match p {
            Permission::Read => EffectivePermission::Read,
            Permission::Write => EffectivePermission::Write,
        }
    }
}

/// The caller resolving permissions: `None` user id models the public
/// (anonymous) synthetic principal from spec §4.2.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Option<Uuid>,
    pub is_global_admin: bool,
    pub teams: Vec<(Uuid, TeamRole)>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            is_global_admin: false,
            teams: Vec::new(),
        }
    }

    fn team_role(&self, team_id: Uuid) -> Option<TeamRole> {
        self.teams.iter().find(|(id, _)| *id == team_id).map(|(_, role)| *role)
    }
}

/// `resolve(caller, model)` from spec §4.2. `explicit` is the caller's
/// `ModelPermission` row for this model, if any — looked up by the caller
/// since this function stays a pure combinator over already-fetched state.
pub fn resolve(principal: &Principal, model: &Model, explicit: Option<Permission>) -> EffectivePermission {
    let is_owner = principal.user_id == Some(model.user_id);
    let owner_floor = if is_owner || principal.is_global_admin {
        EffectivePermission::Write
    } else {
        EffectivePermission::None
    };

    let cascade = match model.access_level {
        AccessLevel::Protected => match model.team_id.and_then(|team_id| principal.team_role(team_id)) {
            Some(TeamRole::TeamAdmin) => EffectivePermission::Write,
            Some(TeamRole::Member) => model.default_permission.into(),
            None => EffectivePermission::None,
        },
        AccessLevel::Public => model.default_permission.into(),
        AccessLevel::Private => EffectivePermission::None,
    };

    let base = explicit.map(EffectivePermission::from).unwrap_or(cascade);
    base.max(owner_floor)
}

/// Whether `caller` may see `model` at all in a listing — invariant 5 in
/// spec §8 (`list_visible` soundness): a model is visible iff resolve
/// would not return `None`.
pub fn is_visible(principal: &Principal, model: &Model, explicit: Option<Permission>) -> bool {
    resolve(principal, model, explicit) != EffectivePermission::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_catalog::models::JobStatus;

    fn model(owner: Uuid, access: AccessLevel, team_id: Option<Uuid>, default_permission: Permission) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "m".into(),
            kind: "ndb".into(),
            sub_kind: None,
            train_status: JobStatus::Complete,
            deploy_status: JobStatus::NotStarted,
            access_level: access,
            default_permission,
            downloads: 0,
            domain: None,
            published_at: None,
            parent_id: None,
            user_id: owner,
            team_id,
        }
    }

    #[test]
    fn owner_always_gets_write() {
        let owner = Uuid::new_v4();
        let principal = Principal {
            user_id: Some(owner),
            is_global_admin: false,
            teams: vec![],
        };
        let m = model(owner, AccessLevel::Private, None, Permission::Read);
        assert_eq!(resolve(&principal, &m, None), EffectivePermission::Write);
    }

    #[test]
    fn global_admin_always_gets_write() {
        let principal = Principal {
            user_id: Some(Uuid::new_v4()),
            is_global_admin: true,
            teams: vec![],
        };
        let m = model(Uuid::new_v4(), AccessLevel::Private, None, Permission::Read);
        assert_eq!(resolve(&principal, &m, None), EffectivePermission::Write);
    }

    #[test]
    fn explicit_read_on_owned_model_stays_write_floor() {
        let owner = Uuid::new_v4();
        let principal = Principal {
            user_id: Some(owner),
            is_global_admin: false,
            teams: vec![],
        };
        let m = model(owner, AccessLevel::Private, None, Permission::Read);
        assert_eq!(resolve(&principal, &m, Some(Permission::Read)), EffectivePermission::Write);
    }

    #[test]
    fn private_model_denies_stranger() {
        let principal = Principal {
            user_id: Some(Uuid::new_v4()),
            is_global_admin: false,
            teams: vec![],
        };
        let m = model(Uuid::new_v4(), AccessLevel::Private, None, Permission::Read);
        assert_eq!(resolve(&principal, &m, None), EffectivePermission::None);
    }

    #[test]
    fn protected_team_member_gets_default_permission() {
        let team_id = Uuid::new_v4();
        let principal = Principal {
            user_id: Some(Uuid::new_v4()),
            is_global_admin: false,
            teams: vec![(team_id, TeamRole::Member)],
        };
        let m = model(Uuid::new_v4(), AccessLevel::Protected, Some(team_id), Permission::Write);
        assert_eq!(resolve(&principal, &m, None), EffectivePermission::Write);
    }

    #[test]
    fn protected_team_admin_always_gets_write() {
        let team_id = Uuid::new_v4();
        let principal = Principal {
            user_id: Some(Uuid::new_v4()),
            is_global_admin: false,
            teams: vec![(team_id, TeamRole::TeamAdmin)],
        };
        let m = model(Uuid::new_v4(), AccessLevel::Protected, Some(team_id), Permission::Read);
        assert_eq!(resolve(&principal, &m, None), EffectivePermission::Write);
    }

    #[test]
    fn protected_non_member_denied() {
        let principal = Principal {
            user_id: Some(Uuid::new_v4()),
            is_global_admin: false,
            teams: vec![],
        };
        let m = model(Uuid::new_v4(), AccessLevel::Protected, Some(Uuid::new_v4()), Permission::Read);
        assert_eq!(resolve(&principal, &m, None), EffectivePermission::None);
    }

    #[test]
    fn public_model_gets_default_permission() {
        let principal = Principal::anonymous();
        let m = model(Uuid::new_v4(), AccessLevel::Public, None, Permission::Read);
        assert_eq!(resolve(&principal, &m, None), EffectivePermission::Read);
    }

    #[test]
    fn resolver_totality_is_one_of_three_values() {
        let principal = Principal::anonymous();
        let m = model(Uuid::new_v4(), AccessLevel::Private, None, Permission::Read);
        let result = resolve(&principal, &m, None);
        assert!(matches!(
            result,
            EffectivePermission::None | EffectivePermission::Read | EffectivePermission::Write
        ));
    }
}
