//! Permission Definitions
//!
//! 按角色固定授权，不可配置：
//!
//! | 权限 | admin | manager | waiter | cook |
//! |------|:-----:|:-------:|:------:|:----:|
//! | `orders:read` | ✓ | ✓ | ✓ | ✓ |
//! | `orders:write` (下单/结账/撤单) | ✓ | | ✓ | |
//! | `orders:status` (出餐进度) | ✓ | | | ✓ |
//! | `inventory:manage` (进货/库存) | ✓ | ✓ | | |

use crate::auth::Role;

pub const ORDERS_READ: &str = "orders:read";
pub const ORDERS_WRITE: &str = "orders:write";
pub const ORDERS_STATUS: &str = "orders:status";
pub const INVENTORY_MANAGE: &str = "inventory:manage";

/// 超级权限
pub const ALL: &str = "all";

const ADMIN_PERMISSIONS: &[&str] = &[ALL];
const MANAGER_PERMISSIONS: &[&str] = &[ORDERS_READ, INVENTORY_MANAGE];
const WAITER_PERMISSIONS: &[&str] = &[ORDERS_READ, ORDERS_WRITE];
const COOK_PERMISSIONS: &[&str] = &[ORDERS_READ, ORDERS_STATUS];

/// Permissions granted to a role
pub fn role_permissions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Manager => MANAGER_PERMISSIONS,
        Role::Waiter => WAITER_PERMISSIONS,
        Role::Cook => COOK_PERMISSIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;

    fn user(role: Role) -> CurrentUser {
        CurrentUser { id: 1, role }
    }

    #[test]
    fn test_role_matrix() {
        let cases = [
            (Role::Admin, [true, true, true, true]),
            (Role::Manager, [true, false, false, true]),
            (Role::Waiter, [true, true, false, false]),
            (Role::Cook, [true, false, true, false]),
        ];
        for (role, expected) in cases {
            let u = user(role);
            let got = [ORDERS_READ, ORDERS_WRITE, ORDERS_STATUS, INVENTORY_MANAGE]
                .map(|p| u.has_permission(p));
            assert_eq!(got, expected, "role {role}");
        }
    }
}
