use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use tokio::time::MissedTickBehavior;

use crate::api::AccountClient;
use crate::domain::{format_amount, Amount};

/// Display state for one banking service, refreshed by polling its client.
/// The last known name and balance are kept while the service is unreachable.
pub struct Panel {
    client: AccountClient,
    name: Option<String>,
    balance: Option<Amount>,
    online: Option<bool>,
    updated_at: Option<DateTime<Local>>,
}

impl Panel {
    pub fn new(client: AccountClient) -> Self {
        Self {
            client,
            name: None,
            balance: None,
            online: None,
            updated_at: None,
        }
    }

    /// Build a panel for a `host:port` address.
    pub fn connect(address: &str, timeout: Duration) -> Result<Self> {
        let Some((host, port)) = address.rsplit_once(':') else {
            bail!("Expected host:port, got '{}'", address);
        };
        let port: u16 = port
            .parse()
            .with_context(|| format!("Invalid port in '{}'", address))?;
        let client = AccountClient::with_timeout(host, port, timeout)?;
        Ok(Self::new(client))
    }

    pub async fn refresh(&mut self) {
        if let Ok(name) = self.client.get_name().await {
            self.name = Some(name);
        }
        if let Ok(balance) = self.client.get_balance().await {
            self.balance = Some(balance);
        }
        self.online = Some(self.client.is_service_running().await);
        self.updated_at = Some(Local::now());
    }

    pub fn render(&self) -> String {
        let name = self.name.as_deref().unwrap_or("UNKNOWN");
        let balance = self
            .balance
            .map(format_amount)
            .unwrap_or_else(|| "$????.??".to_string());
        let status = match self.online {
            Some(true) => "Online",
            Some(false) => "Offline",
            None => "Unknown",
        };

        let updated = self
            .updated_at
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());

        format!(
            "{:<20} | Balance: {:>12} | Service Status: {:<7} | Updated: {}",
            format!("{} bank:", name),
            balance,
            status,
            updated
        )
    }
}

/// Poll every panel each `interval` and print their state, until `ticks` refreshes
/// have happened or Ctrl-C is pressed.
pub async fn run(mut panels: Vec<Panel>, interval: Duration, ticks: Option<u64>) -> Result<()> {
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut done = 0;

    loop {
        tokio::select! {
            _ = timer.tick() => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }

        for panel in panels.iter_mut() {
            panel.refresh().await;
        }

        for panel in &panels {
            println!("{}", panel.render());
        }
        println!();

        done += 1;
        if ticks.is_some_and(|limit| done >= limit) {
            return Ok(());
        }
    }
}
