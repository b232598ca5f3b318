use serde::{Deserialize, Serialize};

use crate::kind::Kind;
use crate::Record;

/// A person who has signed in at least once; `subject` is the identity
/// provider's stable id and is unique across users.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub subject: String,
}

impl Record for UserRecord {
    const KIND: Kind = Kind::User;
}
