//! Runs the example menu over stdin/stdout.
//!
//! Lines starting with `@` control the session instead of going to the menu:
//! `@disconnect` drops the connection, `@reconnect` restores it and
//! `@close` force-closes the menu.

use async_trait::async_trait;
use menu_engine::db::Database;
use menu_engine::demo;
use menu_engine::runtime::{
    CommandStack, MenuServices, OutputSink, ProductionManager, SqliteMenuStore,
};
use menu_engine::EntityId;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct StdoutSink;

#[async_trait]
impl OutputSink for StdoutSink {
    async fn present(&self, _entity: &EntityId, text: &str) -> Result<(), String> {
        let mut out = tokio::io::stdout();
        out.write_all(format!("{text}\n\n").as_bytes())
            .await
            .map_err(|e| e.to_string())?;
        out.flush().await.map_err(|e| e.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with menu text
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menu_engine=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Configuration
    let entity = EntityId::new(std::env::var("MENU_ENTITY").unwrap_or_else(|_| "player".to_string()));
    let persistent = std::env::var("MENU_PERSISTENT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let db = match std::env::var("MENU_DB_PATH") {
        Ok(db_path) => {
            if let Some(parent) = PathBuf::from(&db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %db_path, "Opening database");
            Database::open(&db_path)?
        }
        Err(_) => {
            tracing::info!("Using in-memory database");
            Database::open_in_memory()?
        }
    };

    let commands = CommandStack::new(["look", "l", "say", "inventory", "quit"]).with_handler(
        "look",
        |entity| {
            println!("{entity} stands in a quiet room. A menu hangs in the air.\n");
            Ok(())
        },
    );
    let services = MenuServices::new(StdoutSink, commands, SqliteMenuStore::new(db));
    let manager: ProductionManager<StdoutSink> = ProductionManager::new(services);
    manager.register_menu(demo::MENU_NAME, demo::registry()).await;

    let resumed = manager.reconnect(&entity).await?;
    if resumed {
        tracing::info!(entity = %entity, "Resumed saved menu");
    } else {
        manager
            .open(entity.clone(), demo::MENU_NAME, demo::config().persistent(persistent))
            .await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut connected = true;
    while let Some(line) = lines.next_line().await? {
        let result = match line.trim() {
            "@disconnect" => {
                connected = false;
                manager.disconnect(&entity).await
            }
            "@reconnect" => match manager.reconnect(&entity).await {
                Ok(found) => {
                    connected = found;
                    if !found {
                        println!("Nothing to reconnect to.\n");
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "@close" => manager.force_close(&entity).await,
            _ => manager.submit(&entity, &line).await,
        };
        if let Err(e) = result {
            println!("{e}\n");
        }

        if connected && !manager.is_active(&entity).await {
            break;
        }
    }

    tracing::info!(entity = %entity, "Menu demo finished");
    Ok(())
}
