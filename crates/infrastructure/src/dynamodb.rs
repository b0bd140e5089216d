use crate::StoreError;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::Client;
use shared::Config;
use std::fmt::Debug;

/// 一時的な障害として再試行するエラーコード
const TRANSIENT_ERROR_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
];

pub const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));
        // DynamoDB Local などローカル環境向け
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// SDK エラーを `StoreError` に変換する
    pub fn convert_error<E, R>(&self, error: SdkError<E, R>) -> StoreError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: Debug,
    {
        let transient = matches!(
            error,
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
        ) || error
            .code()
            .is_some_and(|code| TRANSIENT_ERROR_CODES.contains(&code));

        let message = DisplayErrorContext(&error).to_string();
        tracing::error!(table = %self.table_name, transient, error = %message, "DynamoDB リクエスト失敗");

        if transient {
            StoreError::Transient(message)
        } else {
            StoreError::DynamoDb(message)
        }
    }
}
