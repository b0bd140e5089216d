use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// トレーシングサブスクライバーを初期化
/// `RUST_LOG` が未設定なら `info` で出力する
pub fn init_tracing() -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // 構造化ログ（JSON）で標準出力へ
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).json())
        .with(filter)
        .try_init()
}

/// リクエスト単位のスパンを作成
pub fn request_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!("request", method = %method, path = %path)
}
