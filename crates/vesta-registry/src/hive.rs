use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level registry namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Hive {
    /// Kernel-internal bookkeeping
    Kernel,
    /// Per-machine settings
    Local,
    /// Installed application metadata
    Apps,
    /// User accounts
    Users,
}

impl Hive {
    /// All hives, in tree order.
    pub const ALL: [Hive; 4] = [Hive::Kernel, Hive::Local, Hive::Apps, Hive::Users];

    /// Key of this hive at the root of the tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hive::Kernel => "KERNEL",
            Hive::Local => "LOCAL",
            Hive::Apps => "APPS",
            Hive::Users => "USERS",
        }
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hive::ALL
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown hive: {}", s))
    }
}
