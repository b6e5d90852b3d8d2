/*!
 * Policy Watch - Main Entry Point
 *
 * Watches a user policy (Education/AllowGraphingCalculator by default) and
 * prints a colored status line every time the state is refreshed.
 * Press Ctrl+C to stop.
 */

use std::error::Error;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use policy_watch::{
    init_tracing, FilePolicyProvider, PolicyProvider, PolicyWatcher, StaticPolicyProvider,
    StatusLine, WatcherConfig,
};

/// Path to a JSON policy document; without it a static provider is used
const ENV_STORE: &str = "POLICY_WATCH_STORE";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = WatcherConfig::from_env()?;
    info!(
        user = %config.user,
        policy = %config.policy,
        interval_ms = config.interval.as_millis() as u64,
        "Policy watch starting"
    );

    let provider: Arc<dyn PolicyProvider> = match std::env::var(ENV_STORE) {
        Ok(path) if !path.trim().is_empty() => {
            info!(store = %path, "Using file policy store");
            Arc::new(FilePolicyProvider::new(path))
        }
        _ => {
            warn!("{} not set, using a static policy store (policy enabled)", ENV_STORE);
            Arc::new(StaticPolicyProvider::new().with_policy(
                config.user.clone(),
                config.policy.clone(),
                true,
            ))
        }
    };

    let mut watcher = PolicyWatcher::new(provider);
    let mut updates = watcher.updates();
    watcher.start_with(&config)?;

    let ansi = std::io::stdout().is_terminal();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                match result {
                    Ok(()) => info!("Ctrl+C received, stopping watcher"),
                    Err(e) => warn!(error = %e, "Could not listen for Ctrl+C, stopping watcher"),
                }
                break;
            }
            Some(snapshot) = updates.next() => {
                println!("{}", StatusLine::new(snapshot).with_ansi(ansi));
            }
        }
    }

    watcher.stop().await?;
    let stats = watcher.stats();
    info!(
        polls_attempted = stats.polls_attempted,
        polls_failed = stats.polls_failed,
        "Policy watch stopped"
    );
    Ok(())
}
