//! Role and ownership based authorization.
//!
//! Decisions are pure functions of the principal, the operation, the target's
//! owner and the entity's capability sets. Nothing here touches a store.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::auth::{Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSet(u8);

impl OperationSet {
    pub const NONE: OperationSet = OperationSet(0);
    pub const ALL: OperationSet = OperationSet::of(&[
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::List,
    ]);

    pub const fn of(ops: &[Operation]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < ops.len() {
            bits |= ops[i].bit();
            i += 1;
        }
        OperationSet(bits)
    }

    pub const fn contains(&self, op: Operation) -> bool {
        self.0 & op.bit() != 0
    }
}

/// What each non-managing role may do with one entity type.
///
/// `employee` operations apply to any record; `owner` operations apply only to
/// records owned by the principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub employee: OperationSet,
    pub owner: OperationSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// True when the principal may perform `op` on any record regardless of owner.
pub fn bypasses_ownership(principal: &Principal, op: Operation, caps: &Capabilities) -> bool {
    if !principal.active {
        return false;
    }
    match principal.role {
        Role::Admin | Role::Manager => true,
        Role::Employee => caps.employee.contains(op),
        Role::Client => false,
    }
}

pub fn authorize(
    principal: &Principal,
    op: Operation,
    owner: Option<Uuid>,
    caps: &Capabilities,
) -> Decision {
    if !principal.active {
        return Decision::Deny;
    }
    if bypasses_ownership(principal, op, caps) {
        return Decision::Allow;
    }
    match owner {
        Some(owner) if owner == principal.id && caps.owner.contains(op) => Decision::Allow,
        _ => Decision::Deny,
    }
}

/// Capability sets per entity.
pub mod capabilities {
    use super::{Capabilities, Operation::*, OperationSet};

    /// Accounts: staff get no blanket access; everyone may read and edit themselves.
    pub const USERS: Capabilities = Capabilities {
        employee: OperationSet::NONE,
        owner: OperationSet::of(&[Read, Update]),
    };

    pub const CARS: Capabilities = Capabilities {
        employee: OperationSet::of(&[Create, Read, List]),
        owner: OperationSet::ALL,
    };

    /// Repairs are owned through their car; owners can only look.
    pub const REPAIRS: Capabilities = Capabilities {
        employee: OperationSet::of(&[Create, Read, Update, List]),
        owner: OperationSet::of(&[Read, List]),
    };

    pub const APPOINTMENTS: Capabilities = Capabilities {
        employee: OperationSet::of(&[Create, Read, Update, List]),
        owner: OperationSet::ALL,
    };

    pub const EMPLOYEES: Capabilities = Capabilities {
        employee: OperationSet::of(&[Read, List]),
        owner: OperationSet::of(&[Read]),
    };

    pub const CLIENTS: Capabilities = Capabilities {
        employee: OperationSet::of(&[Read, List]),
        owner: OperationSet::of(&[Create, Read, Update, List]),
    };
}
