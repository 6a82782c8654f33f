//! Inventory seam
//!
//! The inventory owns the monitored hosts and their persistence. The
//! monitor only lists hosts and writes refreshed certificate fields back;
//! adding and removing hosts stays with the inventory.

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::common::{MonitorError, Result};
use super::host::MonitoredHost;

/// Store of monitored hosts
pub trait Inventory: Send + Sync {
    /// All monitored hosts
    fn list_hosts(&self) -> BoxFuture<'_, Result<Vec<MonitoredHost>>>;

    /// Store the certificate fields and `last_checked` of an existing host
    fn update_host<'a>(&'a self, host: &'a MonitoredHost) -> BoxFuture<'a, Result<()>>;
}

/// In-memory inventory
///
/// Used by the command line tool and by tests.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    hosts: RwLock<Vec<MonitoredHost>>,
}

impl MemoryInventory {
    /// Create an inventory holding `hosts`
    pub fn new(hosts: Vec<MonitoredHost>) -> Self {
        Self {
            hosts: RwLock::new(hosts),
        }
    }

    /// Current contents
    pub async fn snapshot(&self) -> Vec<MonitoredHost> {
        self.hosts.read().await.clone()
    }
}

impl Inventory for MemoryInventory {
    fn list_hosts(&self) -> BoxFuture<'_, Result<Vec<MonitoredHost>>> {
        Box::pin(async move { Ok(self.snapshot().await) })
    }

    fn update_host<'a>(&'a self, host: &'a MonitoredHost) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut hosts = self.hosts.write().await;
            let stored = hosts
                .iter_mut()
                .find(|stored| stored.url == host.url)
                .ok_or_else(|| MonitorError::Inventory(format!("Unknown host: {}", host.url)))?;
            *stored = host.clone();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CertificateStatus;

    #[tokio::test]
    async fn test_update_existing_host() {
        let inventory = MemoryInventory::new(vec![
            MonitoredHost::new("a.example"),
            MonitoredHost::new("b.example"),
        ]);

        let mut updated = MonitoredHost::new("b.example");
        updated.status = Some(CertificateStatus::Expired);
        inventory.update_host(&updated).await.unwrap();

        let hosts = inventory.list_hosts().await.unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].status, None);
        assert_eq!(hosts[1].status, Some(CertificateStatus::Expired));
    }

    #[tokio::test]
    async fn test_update_unknown_host_is_rejected() {
        let inventory = MemoryInventory::new(vec![MonitoredHost::new("a.example")]);
        let result = inventory.update_host(&MonitoredHost::new("c.example")).await;
        assert!(matches!(result, Err(MonitorError::Inventory(_))));
        assert_eq!(inventory.snapshot().await.len(), 1);
    }
}
