use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one set of one exercise instance in the running plan. For
/// superset members the set index doubles as the round index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SetKey {
    pub instance_id: String,
    pub set_index: usize,
}

impl SetKey {
    pub fn new(instance_id: impl Into<String>, set_index: usize) -> Self {
        Self {
            instance_id: instance_id.into(),
            set_index,
        }
    }
}

impl fmt::Display for SetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.instance_id, self.set_index)
    }
}
