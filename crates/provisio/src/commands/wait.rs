use crate::utils;
use colored::Colorize;
use provisio_config::Settings;
use provisio_core::{Intent, OperationHandle, ResourceKind};
use std::process::ExitCode;

pub async fn handle(
    settings: &Settings,
    kind: ResourceKind,
    location: Option<String>,
    id: Option<String>,
    absent: bool,
    timeout: Option<u64>,
) -> anyhow::Result<ExitCode> {
    let handle = match (location, id) {
        (Some(location), _) => OperationHandle::location(location, kind)?,
        (None, Some(id)) => {
            let intent = if absent {
                Intent::BecomeAbsent
            } else {
                Intent::BecomeReady
            };
            OperationHandle::resource(id, intent, kind)?
        }
        (None, None) => anyhow::bail!("--location か --id のどちらかを指定してください"),
    };

    let poller = utils::poller(settings, utils::api_config(settings)?)?;
    let ctx = utils::wait_context(settings, timeout);

    let what = handle.describe();
    println!("{}", format!("{} を待機中...", what).yellow());

    let done = match handle.intent() {
        Intent::BecomeReady => "の準備ができました",
        Intent::BecomeAbsent => "は削除されました",
    };
    let outcome = poller.wait_registered(&ctx, handle).await?;
    Ok(utils::report(&what, done, &outcome))
}
