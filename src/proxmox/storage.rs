use super::client::ProxmoxClient;
use super::error::Result;
use super::models::StorageItem;
use reqwest::Method;

impl ProxmoxClient {
    pub async fn get_storage_list(&self, node: &str) -> Result<Vec<StorageItem>> {
        let path = format!("nodes/{}/storage", node);
        self.request(Method::GET, &path, None).await
    }
}
