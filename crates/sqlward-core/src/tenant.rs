//! Tenant context consumed by the scoping stage.

use std::collections::BTreeSet;

use uuid::Uuid;

/// The resolved tenant/user identity a request runs under.
///
/// Created per request by the identity collaborator and read-only within the
/// pipeline. Scoping a tenant-mapped table with an anonymous context is an
/// error, never a silent pass-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// The tenant every scoped predicate is pinned to.
    pub tenant_id: Uuid,
    /// The acting user.
    pub user_id: Uuid,
    /// Permission names granted to the user, opaque to this pipeline.
    pub permissions: BTreeSet<String>,
}

impl TenantContext {
    /// Create a context with no permissions.
    pub fn new(tenant_id: Uuid, user_id: Uuid) -> Self {
        Self {
            tenant_id,
            user_id,
            permissions: BTreeSet::new(),
        }
    }

    /// Attach permission names.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this context carries no usable identity.
    pub fn is_anonymous(&self) -> bool {
        self.tenant_id.is_nil() || self.user_id.is_nil()
    }

    /// Whether the named permission was granted.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_ids_are_anonymous() {
        let ctx = TenantContext::new(Uuid::nil(), Uuid::new_v4());
        assert!(ctx.is_anonymous());

        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::nil());
        assert!(ctx.is_anonymous());

        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(!ctx.is_anonymous());
    }

    #[test]
    fn test_permissions() {
        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4())
            .with_permissions(["orders.read", "orders.write"]);
        assert!(ctx.has_permission("orders.read"));
        assert!(!ctx.has_permission("orders.delete"));
    }
}
