use super::client::ProxmoxClient;
use super::error::Result;
use super::models::ClusterStatusItem;
use reqwest::Method;

impl ProxmoxClient {
    pub async fn get_cluster_status(&self) -> Result<Vec<ClusterStatusItem>> {
        self.request(Method::GET, "cluster/status", None).await
    }
}
