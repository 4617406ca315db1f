//! DynamoDB implementation of the metadata index.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{CloudError, CloudResult};
use crate::index::MetadataIndex;
use crate::types::FileRecord;

/// Metadata index backed by a DynamoDB table with an `(owner, path)`
/// composite key.
///
/// Attribute names follow the existing table schema: `owner`, `path`,
/// `lastUpdated`, `md5Hash`, `fileName`, `permissions`.
pub struct DynamoIndex {
    client: DynamoClient,
    table: String,
}

impl DynamoIndex {
    /// Builds an index client for the configured table, honoring an
    /// endpoint override (DynamoDB Local).
    pub async fn connect(config: &SyncConfig) -> Self {
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&base);
        if let Some(endpoint) = &config.index_endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: DynamoClient::from_conf(builder.build()),
            table: config.index_table.clone(),
        }
    }
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> String {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl MetadataIndex for DynamoIndex {
    async fn get(&self, owner: &str, path: &str) -> CloudResult<Option<FileRecord>> {
        let resp = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("owner", AttributeValue::S(owner.to_string()))
            .key("path", AttributeValue::S(path.to_string()))
            .send()
            .await
            .map_err(|e| CloudError::Index(format!("get failed for {owner}:{path}: {e}")))?;

        Ok(resp.item().map(|item| FileRecord {
            owner: string_attr(item, "owner"),
            path: string_attr(item, "path"),
            last_updated: string_attr(item, "lastUpdated"),
            md5_hash: string_attr(item, "md5Hash"),
            file_name: string_attr(item, "fileName"),
            permissions: string_attr(item, "permissions"),
        }))
    }

    async fn put(&self, record: &FileRecord) -> CloudResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .item("owner", AttributeValue::S(record.owner.clone()))
            .item("path", AttributeValue::S(record.path.clone()))
            .item("lastUpdated", AttributeValue::S(record.last_updated.clone()))
            .item("md5Hash", AttributeValue::S(record.md5_hash.clone()))
            .item("fileName", AttributeValue::S(record.file_name.clone()))
            .item("permissions", AttributeValue::S(record.permissions.clone()))
            .send()
            .await
            .map_err(|e| {
                CloudError::Index(format!(
                    "put failed for {}:{}: {e}",
                    record.owner, record.path
                ))
            })?;

        debug!("created index record for {}:{}", record.owner, record.path);
        Ok(())
    }

    async fn update(
        &self,
        owner: &str,
        path: &str,
        md5_hash: &str,
        last_updated: &str,
    ) -> CloudResult<()> {
        // `path` is a DynamoDB reserved word, hence the name placeholder.
        match self
            .client
            .update_item()
            .table_name(&self.table)
            .key("owner", AttributeValue::S(owner.to_string()))
            .key("path", AttributeValue::S(path.to_string()))
            .update_expression("SET md5Hash = :h, lastUpdated = :t")
            .condition_expression("attribute_exists(#p)")
            .expression_attribute_names("#p", "path")
            .expression_attribute_values(":h", AttributeValue::S(md5_hash.to_string()))
            .expression_attribute_values(":t", AttributeValue::S(last_updated.to_string()))
            .send()
            .await
        {
            Ok(_) => {
                debug!("updated index record for {owner}:{path}");
                Ok(())
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    Err(CloudError::RecordNotFound {
                        owner: owner.to_string(),
                        path: path.to_string(),
                    })
                } else {
                    Err(CloudError::Index(format!(
                        "update failed for {owner}:{path}: {service_err}"
                    )))
                }
            }
        }
    }
}
