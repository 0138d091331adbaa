//! Zone topology command handlers.

use std::collections::BTreeMap;

use serde::Serialize;
use tabled::Tabled;

use jellyfish_core::{Controller, PortMapping, ZoneConfig};

use crate::cli::{GlobalOpts, ZonesArgs, ZonesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ZoneEntry {
    name: String,
    #[serde(flatten)]
    config: ZoneConfig,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    name: String,
    #[tabled(rename = "Pixels")]
    pixels: u32,
    #[tabled(rename = "Ports")]
    ports: String,
}

impl From<&ZoneEntry> for ZoneRow {
    fn from(z: &ZoneEntry) -> Self {
        let ports = z
            .config
            .port_map
            .iter()
            .map(|p| {
                format!(
                    "{}:{} [{}..{}]",
                    p.ctlr_name, p.phy_port, p.phy_start_idx, p.phy_end_idx
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            name: z.name.clone(),
            pixels: z.config.num_pixels,
            ports,
        }
    }
}

fn entries(zones: BTreeMap<String, ZoneConfig>) -> Vec<ZoneEntry> {
    zones
        .into_iter()
        .map(|(name, config)| ZoneEntry { name, config })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ZonesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let timeout = controller.config().timeout;
    match args.command {
        ZonesCommand::List => {
            let zones = entries(controller.get_zone_configs(timeout).await?);
            let out = output::render_list(
                &global.output,
                &zones,
                |z| ZoneRow::from(z),
                |z| z.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ZonesCommand::Add {
            name,
            phy_port,
            start,
            end,
            ctlr,
            wait,
        } => {
            // An empty controller name is filled in with the device hostname.
            let zone = ZoneConfig::new(vec![PortMapping {
                ctlr_name: ctlr.unwrap_or_default(),
                phy_port,
                phy_start_idx: start,
                phy_end_idx: end,
                zone_rgb_start_idx: 0,
            }]);
            let pixels = zone.num_pixels;
            controller
                .add_zone(&name, zone, wait.options(timeout))
                .await?;
            output::print_status(
                &format!("Zone '{name}' added ({pixels} pixels)"),
                global.quiet,
            );
            Ok(())
        }

        ZonesCommand::Delete { name, wait } => {
            if !util::confirm(&format!("Delete zone '{name}'?"), global.yes)? {
                return Ok(());
            }
            controller.delete_zone(&name, wait.options(timeout)).await?;
            output::print_status(&format!("Zone '{name}' deleted"), global.quiet);
            Ok(())
        }
    }
}
