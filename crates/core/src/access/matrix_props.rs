//! Property-based tests for the permission matrix.

use proptest::prelude::*;
use rimba_shared::types::UserId;

use crate::access::context::AccessContext;
use crate::access::matrix::PermissionMatrix;
use crate::access::permission::Permission;
use crate::access::role::Role;

fn arb_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn arb_permission() -> impl Strategy<Value = Permission> {
    prop::sample::select(Permission::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// God mode grants every permission regardless of role.
    #[test]
    fn prop_god_mode_grants_everything(role in arb_role(), permission in arb_permission()) {
        let ctx = AccessContext::new(UserId::new(), role).with_god_mode();
        prop_assert!(PermissionMatrix::has_permission(&ctx, permission));
    }

    /// Being a god admin implies having god mode.
    #[test]
    fn prop_god_admin_implies_god_mode(role in arb_role(), god_mode in any::<bool>()) {
        let mut ctx = AccessContext::new(UserId::new(), role);
        ctx.god_mode = god_mode;
        if PermissionMatrix::is_god_admin(&ctx) {
            prop_assert!(PermissionMatrix::has_god_mode(&ctx));
        }
    }

    /// Without god mode a decision is exactly the table lookup.
    #[test]
    fn prop_plain_decision_follows_table(role in arb_role(), permission in arb_permission()) {
        let ctx = AccessContext::new(UserId::new(), role);
        prop_assert_eq!(
            PermissionMatrix::has_permission(&ctx, permission),
            PermissionMatrix::grants(role).contains(&permission)
        );
    }

    /// The enhanced map agrees with the single-key predicate for every key.
    #[test]
    fn prop_enhanced_agrees_with_predicate(role in arb_role(), god_mode in any::<bool>()) {
        let mut ctx = AccessContext::new(UserId::new(), role);
        ctx.god_mode = god_mode;
        let enhanced = PermissionMatrix::enhanced(&ctx);
        for p in Permission::ALL {
            prop_assert_eq!(enhanced.allows(p), PermissionMatrix::has_permission(&ctx, p));
        }
        prop_assert_eq!(enhanced.god_mode, god_mode);
    }
}
