use super::client::ProxmoxClient;
use super::error::Result;
use super::models::{NodeListItem, NodeStatusData};
use reqwest::Method;

impl ProxmoxClient {
    pub async fn get_nodes(&self) -> Result<Vec<NodeListItem>> {
        self.request(Method::GET, "nodes", None).await
    }

    pub async fn get_node_status(&self, node: &str) -> Result<NodeStatusData> {
        let path = format!("nodes/{}/status", node);
        self.request(Method::GET, &path, None).await
    }
}
