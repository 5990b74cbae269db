use crate::utils;
use colored::Colorize;
use provisio_config::Settings;
use provisio_core::{Intent, ResourceKind};
use provisio_http::HttpMutator;
use std::process::ExitCode;

pub async fn handle(
    settings: &Settings,
    kind: ResourceKind,
    path: &str,
    timeout: Option<u64>,
) -> anyhow::Result<ExitCode> {
    let api = utils::api_config(settings)?;
    let mutator = HttpMutator::new(api.clone())?;
    let poller = utils::poller(settings, api)?;

    println!("{}", format!("{} {} を削除中...", kind, path).yellow());
    let mutation = mutator.delete(kind, path).await?;
    if mutation.status == 404 {
        println!("{}", format!("ℹ {} は既に存在しません", path).dimmed());
    }

    // リクエストの完了ではなくリソースの消滅を待つ
    let handle = mutation.resource_handle(Intent::BecomeAbsent)?;
    let what = handle.describe();
    let ctx = utils::wait_context(settings, timeout);

    let outcome = poller.wait_registered(&ctx, handle).await?;
    Ok(utils::report(&what, "は削除されました", &outcome))
}
