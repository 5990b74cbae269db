use colored::Colorize;
use provisio_config::Settings;
use provisio_core::{PollOutcome, Poller, WaitContext};
use provisio_http::{ApiConfig, HttpStatusClient};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// 終了コード: タイムアウト (オペレーションはまだ進行中かもしれない)
const EXIT_TIMED_OUT: u8 = 2;

pub fn api_config(settings: &Settings) -> anyhow::Result<ApiConfig> {
    let url = settings.api_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "API の URL が設定されていません。PROVISIO_API_URL 環境変数か設定ファイルの api_url を指定してください"
        )
    })?;

    let mut config = ApiConfig::new(url);
    if let Some(token) = settings.token() {
        config = config.with_token(token);
    } else {
        tracing::debug!(token_env = %settings.token_env, "No API token set");
    }
    config.validate()?;
    Ok(config)
}

pub fn poller(settings: &Settings, api: ApiConfig) -> anyhow::Result<Poller> {
    let client = HttpStatusClient::new(api)?;
    Ok(Poller::new(
        Arc::new(client),
        Arc::new(provisio_kinds::default_registry()),
        settings.poller_config(),
    ))
}

/// タイムアウト付きのコンテキスト。Ctrl-C でキャンセルされる
pub fn wait_context(settings: &Settings, timeout_secs: Option<u64>) -> WaitContext {
    let timeout = timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.default_timeout());
    let ctx = WaitContext::with_timeout(timeout);

    let token = ctx.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping the wait");
            token.cancel();
        }
    });

    ctx
}

/// 結果を表示して終了コードを返す
pub fn report(what: &str, done: &str, outcome: &PollOutcome) -> ExitCode {
    match outcome {
        PollOutcome::Ready(status) => {
            println!("{}", format!("✓ {} {}", what, done).green().bold());
            if let Some(id) = status.id() {
                println!("  id: {}", id.cyan());
            }
            ExitCode::SUCCESS
        }
        PollOutcome::Failed(reason) => {
            eprintln!("{}", format!("✗ {} が失敗しました", what).red().bold());
            eprintln!("  {}", reason);
            ExitCode::FAILURE
        }
        PollOutcome::TimedOut { last_error } => {
            eprintln!(
                "{}",
                format!("⏱ {} の待機がタイムアウトしました", what).yellow().bold()
            );
            eprintln!(
                "  オペレーションはサーバー側でまだ進行中の可能性があります。再実行する前にリソースの状態を確認してください"
            );
            if let Some(error) = last_error {
                eprintln!("  最後のエラー: {}", error.dimmed());
            }
            ExitCode::from(EXIT_TIMED_OUT)
        }
    }
}
