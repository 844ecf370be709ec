/// Caller role derived from the token's `role` claim.
///
/// Ids 1 and 2 carry blanket authority over letters; every other
/// non-zero group id is a regular employee bound by the delegation chain.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => None,
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            _ => Some(Role::Employee),
        }
    }
}
