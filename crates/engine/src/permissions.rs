//! Advisory permission gating.
//!
//! UI affordances consult this before offering create/update/delete. The
//! engine itself never enforces it: the remote service is the actual
//! authority and re-checks server-side.

/// Feature module a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKey {
    StockAdjustments,
    StockTransfers,
}

impl ModuleKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKey::StockAdjustments => "stock-adjustments",
            ModuleKey::StockTransfers => "stock-transfers",
        }
    }
}

impl core::fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionAction {
    Create,
    Update,
    Delete,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 3] = [
        PermissionAction::Create,
        PermissionAction::Update,
        PermissionAction::Delete,
    ];
}

/// Permission collaborator.
pub trait PermissionGate: Send + Sync {
    fn check(&self, module: ModuleKey, action: PermissionAction) -> bool;
}

/// Gate that allows everything (dev/tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl PermissionGate for AllowAll {
    fn check(&self, _module: ModuleKey, _action: PermissionAction) -> bool {
        true
    }
}

/// Actions the gate allows for a module, for building UI affordances.
pub fn allowed_actions(gate: &dyn PermissionGate, module: ModuleKey) -> Vec<PermissionAction> {
    PermissionAction::ALL
        .iter()
        .copied()
        .filter(|action| gate.check(module, *action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoDeletes;

    impl PermissionGate for NoDeletes {
        fn check(&self, _module: ModuleKey, action: PermissionAction) -> bool {
            action != PermissionAction::Delete
        }
    }

    #[test]
    fn allow_all_permits_every_action() {
        let actions = allowed_actions(&AllowAll, ModuleKey::StockAdjustments);
        assert_eq!(actions, PermissionAction::ALL.to_vec());
    }

    #[test]
    fn gate_filters_affordances() {
        let actions = allowed_actions(&NoDeletes, ModuleKey::StockTransfers);
        assert_eq!(
            actions,
            vec![PermissionAction::Create, PermissionAction::Update]
        );
    }
}
