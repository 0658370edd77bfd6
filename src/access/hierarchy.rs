//! Static capability table over account roles.
//!
//! Every `(actor, target)` role pair maps to a bitmask of account
//! capabilities. The table is total: each of the 25 cells is spelled out,
//! so there is no fallthrough to reason about.

use crate::models::role::Role;
use std::cmp::Ordering;

/// Account capability bits
#[allow(non_snake_case)]
pub mod AccountCap {
    pub const NONE: u8 = 0x00;
    pub const VIEW: u8 = 0x01;
    pub const EDIT: u8 = 0x02;
    pub const TOGGLE_ACTIVE: u8 = 0x04;
    pub const DELETE: u8 = 0x08;
    /// Create a new account whose role is the target role
    pub const CREATE: u8 = 0x10;
    pub const VERIFY: u8 = 0x20;

    pub const MANAGE: u8 = VIEW | EDIT | TOGGLE_ACTIVE;
    pub const ALL: u8 = MANAGE | DELETE | CREATE | VERIFY;
}

use self::AccountCap::{ALL, CREATE, MANAGE, NONE};

// Rows are the actor, columns the target, both in `Role::ALL` order:
// Student, Teacher, Technician, Admin, External.
const CAPABILITIES: [[u8; 5]; 5] = [
    /* Student    */ [NONE, NONE, NONE, NONE, NONE],
    /* Teacher    */ [MANAGE | CREATE, CREATE, NONE, NONE, NONE],
    /* Technician */ [MANAGE, NONE, NONE, NONE, NONE],
    /* Admin      */ [ALL, ALL, ALL, ALL, ALL],
    /* External   */ [NONE, NONE, NONE, NONE, NONE],
];

/// Capability mask `actor` holds over accounts with role `target`.
pub fn capabilities(actor: Role, target: Role) -> u8 {
    CAPABILITIES[actor.index()][target.index()]
}

pub fn has_capability(actor: Role, target: Role, cap: u8) -> bool {
    cap != NONE && capabilities(actor, target) & cap == cap
}

/// Authority comparison. `Greater` means `a` may edit `b` but not the
/// other way round; roles where neither edits the other are incomparable.
pub fn authority_cmp(a: Role, b: Role) -> Option<Ordering> {
    if a == b {
        return Some(Ordering::Equal);
    }
    let a_edits_b = has_capability(a, b, AccountCap::EDIT);
    let b_edits_a = has_capability(b, a, AccountCap::EDIT);
    match (a_edits_b, b_edits_a) {
        (true, false) => Some(Ordering::Greater),
        (false, true) => Some(Ordering::Less),
        _ => None,
    }
}

/// Roles whose accounts `actor` may edit and (de)activate.
pub fn manageable_roles(actor: Role) -> Vec<Role> {
    Role::ALL
        .into_iter()
        .filter(|target| has_capability(actor, *target, MANAGE))
        .collect()
}

/// Roles `actor` may assign when creating an account.
pub fn assignable_roles(actor: Role) -> Vec<Role> {
    Role::ALL
        .into_iter()
        .filter(|target| has_capability(actor, *target, CREATE))
        .collect()
}

/// Roles that see and operate on every print job, not just their own.
pub fn oversees_all_jobs(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Technician)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_everything() {
        for target in Role::ALL {
            assert_eq!(capabilities(Role::Admin, target), AccountCap::ALL);
        }
    }

    #[test]
    fn test_teacher_row() {
        assert!(has_capability(Role::Teacher, Role::Student, AccountCap::MANAGE));
        assert!(has_capability(Role::Teacher, Role::Student, AccountCap::CREATE));
        assert!(has_capability(Role::Teacher, Role::Teacher, AccountCap::CREATE));
        assert!(!has_capability(Role::Teacher, Role::Teacher, AccountCap::EDIT));
        assert!(!has_capability(Role::Teacher, Role::Admin, AccountCap::CREATE));
        assert!(!has_capability(Role::Teacher, Role::Student, AccountCap::DELETE));
    }

    #[test]
    fn test_none_capability_is_never_held() {
        assert!(!has_capability(Role::Admin, Role::Admin, AccountCap::NONE));
    }

    #[test]
    fn test_partial_order() {
        use Ordering::*;
        assert_eq!(authority_cmp(Role::Admin, Role::Teacher), Some(Greater));
        assert_eq!(authority_cmp(Role::Student, Role::Technician), Some(Less));
        assert_eq!(authority_cmp(Role::Teacher, Role::Teacher), Some(Equal));
        // Teacher and technician both manage students but not each other
        assert_eq!(authority_cmp(Role::Teacher, Role::Technician), None);
        assert_eq!(authority_cmp(Role::Student, Role::External), None);
    }

    #[test]
    fn test_authority_is_antisymmetric() {
        for a in Role::ALL {
            for b in Role::ALL {
                let forward = authority_cmp(a, b);
                let backward = authority_cmp(b, a);
                assert_eq!(forward, backward.map(Ordering::reverse), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_manageable_and_assignable() {
        assert_eq!(manageable_roles(Role::Technician), vec![Role::Student]);
        assert_eq!(assignable_roles(Role::Teacher), vec![Role::Student, Role::Teacher]);
        assert!(assignable_roles(Role::Technician).is_empty());
        assert_eq!(assignable_roles(Role::Admin), Role::ALL.to_vec());
        assert!(manageable_roles(Role::External).is_empty());
    }

    #[test]
    fn test_job_oversight() {
        assert!(oversees_all_jobs(Role::Admin));
        assert!(oversees_all_jobs(Role::Technician));
        assert!(!oversees_all_jobs(Role::Teacher));
        assert!(!oversees_all_jobs(Role::Student));
    }
}
