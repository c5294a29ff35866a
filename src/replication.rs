//! Replication status reported by `INFO replication`.
//!
//! Only the locally known role, replication id and offset are kept here; the
//! replica handshake and the offset stream are handled elsewhere. The command
//! layer prints [`ReplicationInfo::status`] verbatim.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Length of a replication id.
pub const REPLID_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Master,
    /// Replica of the given `host:port`.
    Replica { host: String, port: u16 },
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => f.write_str("master"),
            Role::Replica { .. } => f.write_str("slave"),
        }
    }
}

#[derive(Debug)]
pub struct ReplicationInfo {
    role: Role,
    replid: String,
    offset: AtomicI64,
}

impl ReplicationInfo {
    /// Creates the status for `role` with a freshly generated replication id.
    pub fn new(role: Role) -> Self {
        let replid = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REPLID_LEN)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect();
        Self::with_replid(role, replid)
    }

    pub fn with_replid(role: Role, replid: String) -> Self {
        Self {
            role,
            replid,
            offset: AtomicI64::new(0),
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn replid(&self) -> &str {
        &self.replid
    }

    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::Relaxed)
    }

    pub fn set_offset(&self, offset: i64) {
        self.offset.store(offset, Ordering::Relaxed);
    }

    /// The `# Replication` section of `INFO`.
    pub fn status(&self) -> String {
        let mut status = format!("# Replication\r\nrole:{}\r\n", self.role);
        if let Role::Replica { host, port } = &self.role {
            status.push_str(&format!("master_host:{}\r\nmaster_port:{}\r\n", host, port));
        }
        status.push_str(&format!(
            "master_replid:{}\r\nmaster_repl_offset:{}\r\n",
            self.replid,
            self.offset()
        ));
        status
    }
}

impl Default for ReplicationInfo {
    fn default() -> Self {
        Self::new(Role::Master)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_replid() {
        let info = ReplicationInfo::new(Role::Master);
        assert_eq!(info.replid().len(), REPLID_LEN);
        assert!(info.replid().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(info.replid(), ReplicationInfo::new(Role::Master).replid());
    }

    #[test]
    fn test_master_status() {
        let info = ReplicationInfo::with_replid(Role::Master, "abc".to_string());
        info.set_offset(42);
        assert_eq!(
            info.status(),
            "# Replication\r\nrole:master\r\nmaster_replid:abc\r\nmaster_repl_offset:42\r\n"
        );
    }

    #[test]
    fn test_replica_status() {
        let role = Role::Replica {
            host: "localhost".to_string(),
            port: 6379,
        };
        let info = ReplicationInfo::with_replid(role, "abc".to_string());
        let status = info.status();
        assert!(status.contains("role:slave\r\n"));
        assert!(status.contains("master_host:localhost\r\n"));
        assert!(status.contains("master_port:6379\r\n"));
    }
}
