//! Principal permissions and the access rules built on them.

use crate::core::{Result, Waystone, WaystoneError};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

/// Permission strings understood by the access rules.
pub mod permissions {
    /// Open the waystone list menu from a command.
    pub const ALLOW_LIST_MENU: &str = "hytale.command.waystones.allowListMenu";
    /// Edit any waystone, including admin-only fields.
    pub const ALLOW_EDIT_ALL: &str = "hytale.command.waystones.allowEditAll";
    /// See and travel to every private waystone.
    pub const ALLOW_SEE_ALL_PRIVATE: &str = "hytale.command.waystones.allowSeeAllPrivate";
    /// Break private waystones owned by someone else.
    pub const ALLOW_PRIVATE_WAYSTONE_REMOVAL: &str = "hytale.command.waystones.allowPrivateWaystoneRemoval";
    /// Ignore the discovery requirement when listing.
    pub const ALLOW_SHOW_UNDISCOVERED: &str = "hytale.command.waystones.allowShowUndiscovered";

    pub const BLOCK_WAYSTONE_PLACEMENT: &str = "hytale.command.waystones.blockWaystonePlacement";
    pub const BLOCK_WAYSTONE_REMOVAL: &str = "hytale.command.waystones.blockWaystoneRemoval";
    pub const BLOCK_PUBLIC_WAYSTONE_CREATION: &str = "hytale.command.waystones.blockPublicWaystoneCreation";

    /// Followed by a number, e.g. `...maxWaystones.5`.
    pub const MAX_WAYSTONES_PREFIX: &str = "hytale.command.waystones.maxWaystones.";

    /// Members bypass every restriction.
    pub const OP_GROUP: &str = "OP";
}

/// Answers permission questions about a principal.
pub trait PrincipalOracle: Send + Sync {
    fn is_admin(&self, principal: &str) -> bool;

    /// Direct or group-granted permission. Admins are not implicitly granted
    /// anything here; the policy functions add the admin bypass.
    fn has_permission(&self, principal: &str, permission: &str) -> bool;

    /// Highest configured waystone cap, or -1 for unlimited.
    fn max_waystones(&self, principal: &str) -> i32;
}

// ============================================================================
// Permission Table
// ============================================================================

/// One source of grants: user permissions, user groups and group permissions.
#[derive(Debug, Clone, Default)]
pub struct PermissionProvider {
    user_permissions: HashMap<String, HashSet<String>>,
    user_groups: HashMap<String, HashSet<String>>,
    group_permissions: HashMap<String, HashSet<String>>,
}

impl PermissionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_user(mut self, principal: &str, permission: &str) -> Self {
        self.user_permissions
            .entry(principal.to_string())
            .or_default()
            .insert(permission.to_string());
        self
    }

    pub fn add_to_group(mut self, principal: &str, group: &str) -> Self {
        self.user_groups
            .entry(principal.to_string())
            .or_default()
            .insert(group.to_string());
        self
    }

    pub fn grant_group(mut self, group: &str, permission: &str) -> Self {
        self.group_permissions
            .entry(group.to_string())
            .or_default()
            .insert(permission.to_string());
        self
    }

    fn groups_of(&self, principal: &str) -> impl Iterator<Item = &String> {
        self.user_groups.get(principal).into_iter().flatten()
    }

    /// Every permission the principal holds here, direct first.
    fn permissions_of<'a>(&'a self, principal: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        let direct = self.user_permissions.get(principal).into_iter().flatten();
        let via_groups = self
            .groups_of(principal)
            .filter_map(|group| self.group_permissions.get(group))
            .flatten();
        direct.chain(via_groups)
    }
}

/// In-memory `PrincipalOracle` over a list of providers.
///
/// Grants are a flat union: a permission held in any provider, directly or
/// through any group, counts.
#[derive(Debug, Default)]
pub struct PermissionTable {
    providers: RwLock<Vec<PermissionProvider>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: PermissionProvider) -> Self {
        Self {
            providers: RwLock::new(vec![provider]),
        }
    }

    pub fn add_provider(&self, provider: PermissionProvider) {
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(provider);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn any_provider<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&PermissionProvider) -> bool,
    {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|provider| f(provider))
    }
}

impl PrincipalOracle for PermissionTable {
    fn is_admin(&self, principal: &str) -> bool {
        self.any_provider(|provider| provider.groups_of(principal).any(|g| g == permissions::OP_GROUP))
    }

    fn has_permission(&self, principal: &str, permission: &str) -> bool {
        self.any_provider(|provider| provider.permissions_of(principal).any(|p| p == permission))
    }

    fn max_waystones(&self, principal: &str) -> i32 {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flat_map(|provider| provider.permissions_of(principal))
            .filter_map(|permission| parse_max_waystones(permission))
            .fold(-1, i32::max)
    }
}

/// Number suffix of a `maxWaystones.N` permission; other strings yield None.
pub fn parse_max_waystones(permission: &str) -> Option<i32> {
    permission
        .strip_prefix(permissions::MAX_WAYSTONES_PREFIX)
        .and_then(|suffix| suffix.parse().ok())
}

// ============================================================================
// Policy
// ============================================================================

fn allowed(oracle: &dyn PrincipalOracle, principal: &str, permission: &str) -> bool {
    oracle.is_admin(principal) || oracle.has_permission(principal, permission)
}

fn denied(oracle: &dyn PrincipalOracle, principal: &str, permission: &str) -> bool {
    !oracle.is_admin(principal) && oracle.has_permission(principal, permission)
}

pub fn can_open_list(oracle: &dyn PrincipalOracle, principal: &str) -> bool {
    allowed(oracle, principal, permissions::ALLOW_LIST_MENU)
}

pub fn can_place(oracle: &dyn PrincipalOracle, principal: &str) -> bool {
    !denied(oracle, principal, permissions::BLOCK_WAYSTONE_PLACEMENT)
}

pub fn can_make_public(oracle: &dyn PrincipalOracle, principal: &str) -> bool {
    !denied(oracle, principal, permissions::BLOCK_PUBLIC_WAYSTONE_CREATION)
}

pub fn can_edit_all(oracle: &dyn PrincipalOracle, principal: &str) -> bool {
    allowed(oracle, principal, permissions::ALLOW_EDIT_ALL)
}

pub fn can_see_all_private(oracle: &dyn PrincipalOracle, principal: &str) -> bool {
    allowed(oracle, principal, permissions::ALLOW_SEE_ALL_PRIVATE)
}

pub fn can_show_undiscovered(oracle: &dyn PrincipalOracle, principal: &str) -> bool {
    allowed(oracle, principal, permissions::ALLOW_SHOW_UNDISCOVERED)
}

/// Owner, granted editor, or anyone with edit-all.
pub fn can_edit(oracle: &dyn PrincipalOracle, principal: &str, waystone: &Waystone) -> bool {
    waystone.can_edit(principal) || can_edit_all(oracle, principal)
}

/// Fails with `LimitReached` when `owned` already meets the principal's cap.
pub fn check_creation_limit(oracle: &dyn PrincipalOracle, principal: &str, owned: usize) -> Result<()> {
    if oracle.is_admin(principal) {
        return Ok(());
    }
    let limit = oracle.max_waystones(principal);
    if limit >= 0 && owned >= limit as usize {
        return Err(WaystoneError::LimitReached { limit });
    }
    Ok(())
}

/// Break rules, checked in order: server-owned, private and not owned,
/// then the removal deny permission.
pub fn check_removal(oracle: &dyn PrincipalOracle, principal: &str, waystone: Option<&Waystone>) -> Result<()> {
    let admin = oracle.is_admin(principal);

    if let Some(waystone) = waystone {
        if waystone.is_server_owned() && !admin {
            return Err(WaystoneError::PermissionDenied(format!(
                "'{}' is server owned",
                waystone.name()
            )));
        }
        if !waystone.is_public()
            && !waystone.is_owned_by(principal)
            && !admin
            && !oracle.has_permission(principal, permissions::ALLOW_PRIVATE_WAYSTONE_REMOVAL)
        {
            return Err(WaystoneError::PermissionDenied(format!(
                "'{}' is private and owned by {}",
                waystone.name(),
                waystone.owner_name()
            )));
        }
    }

    if denied(oracle, principal, permissions::BLOCK_WAYSTONE_REMOVAL) {
        return Err(WaystoneError::PermissionDenied("waystone removal is blocked".into()));
    }
    Ok(())
}
