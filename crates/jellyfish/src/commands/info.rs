//! Controller identity: `info` and `name`.

use std::fmt::Write;

use serde::Serialize;

use jellyfish_core::{Controller, FirmwareVersion};

use crate::cli::{GlobalOpts, NameArgs, NameCommand};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ControllerInfo {
    name: String,
    hostname: String,
    address: String,
    firmware: FirmwareVersion,
    zones: Vec<String>,
    patterns: usize,
}

fn detail(info: &ControllerInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:      {}", info.name);
    let _ = writeln!(out, "Hostname:  {}", info.hostname);
    let _ = writeln!(out, "Address:   {}", info.address);
    let update = if info.firmware.is_update {
        " (update available)"
    } else {
        ""
    };
    let _ = writeln!(out, "Firmware:  {}{update}", info.firmware.ver);
    let _ = writeln!(out, "Zones:     {}", info.zones.join(", "));
    let _ = write!(out, "Patterns:  {}", info.patterns);
    out
}

pub async fn handle_info(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let info = ControllerInfo {
        name: controller.name().await?,
        hostname: controller.hostname().await?,
        address: controller.config().address(),
        firmware: controller.firmware_version().await?,
        zones: controller.zone_names().await?,
        patterns: controller.pattern_names().await?.len(),
    };
    let out = output::render_single(&global.output, &info, detail, |i| i.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_name(
    controller: &Controller,
    args: NameArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NameCommand::Show => {
            let name = controller.name().await?;
            let out = output::render_single(&global.output, &name, Clone::clone, Clone::clone)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NameCommand::Set { name, wait } => {
            if name.trim().is_empty() {
                return Err(CliError::invalid("name", "must not be empty"));
            }
            let options = wait.options(controller.config().timeout);
            controller.set_name(&name, options).await?;
            output::print_status(&format!("Controller renamed to '{name}'"), global.quiet);
            Ok(())
        }
    }
}
