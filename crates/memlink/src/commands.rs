// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations. Results are printed to stdout as JSON.

use std::time::Duration;

use memlink_config::MemlinkConfig;
use memlink_core::MemlinkError;
use memlink_local::{LocalMemoryService, TaskLookup};
use serde::Serialize;
use serde_json::{json, Value};

use crate::Commands;

/// Interval between task status polls while waiting for a memorize result.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run(command: Commands, config: &MemlinkConfig) -> Result<(), MemlinkError> {
    let service = LocalMemoryService::from_config(config)?;
    let result = dispatch(command, &service).await;
    service.shutdown().await;
    result
}

async fn dispatch(command: Commands, service: &LocalMemoryService) -> Result<(), MemlinkError> {
    match command {
        Commands::Profiles => print(&service.connection_profiles_summary().await),
        Commands::Resolve { profile } => match service.resolve_profile_credentials(&profile).await {
            Some(credential) => print(&credential),
            None => Err(MemlinkError::Profile(format!(
                "connection profile `{profile}` not found"
            ))),
        },
        Commands::Models { profile, kind, force } => {
            let listing = service.list_models_for_profile(&profile, kind, force).await;
            print(listing.as_ref())
        }
        Commands::Health => print(&service.bridge_health().await),
        Commands::Categories => print(&json!({
            "ok": true,
            "result": service.list_categories().await?,
        })),
        Commands::Memorize { file, user, agent } => {
            let content = tokio::fs::read_to_string(&file).await?;
            let conversation: Value = serde_json::from_str(&content).map_err(|e| {
                MemlinkError::Config(format!("{} is not valid JSON: {e}", file.display()))
            })?;
            let task_id = service
                .dispatch_memorize(&user, &agent, &conversation)
                .await
                .map_err(|e| MemlinkError::Profile(e.to_string()))?;
            eprintln!("memlink: memorize task {task_id} dispatched");

            loop {
                match service.task_status(&task_id) {
                    TaskLookup::Found(task) if task.status.is_terminal() => return print(&task),
                    TaskLookup::Found(_) => tokio::time::sleep(POLL_INTERVAL).await,
                    TaskLookup::Unknown => {
                        return Err(MemlinkError::Internal(format!(
                            "task {task_id} disappeared while waiting"
                        )));
                    }
                }
            }
        }
    }
}

fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), MemlinkError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| MemlinkError::Internal(format!("cannot render output: {e}")))?;
    println!("{text}");
    Ok(())
}
