//! ログ初期化

/// `RUST_LOG` があればそれを、無ければ "info" を使う。二重初期化は無視する。
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}
