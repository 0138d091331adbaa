//! Zone state handlers: `states`, `on`, `off`, `color`, `lights`.

use serde::Serialize;
use tabled::Tabled;

use jellyfish_core::{Controller, ZoneState};

use crate::cli::{ColorArgs, GlobalOpts, LightsArgs, ZoneAction, ZoneSelection};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct StateEntry {
    zone: String,
    #[serde(flatten)]
    state: ZoneState,
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Running")]
    running: String,
}

fn state_row(entry: &StateEntry, color: bool) -> StateRow {
    let running = match (entry.state.pattern_file(), &entry.state.data) {
        (Some(file), _) => file.to_owned(),
        (None, Some(data)) => format!("({})", data.pattern_type),
        (None, None) => String::new(),
    };
    StateRow {
        zone: entry.zone.clone(),
        state: output::on_off(entry.state.is_on(), color),
        running,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_states(
    controller: &Controller,
    selection: ZoneSelection,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let timeout = controller.config().timeout;
    let states: Vec<StateEntry> = controller
        .get_zone_states(&selection.zones, timeout)
        .await?
        .into_iter()
        .map(|(zone, state)| StateEntry { zone, state })
        .collect();
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &states,
        |s| state_row(s, color),
        |s| format!("{}\t{}", s.zone, output::on_off(s.state.is_on(), false)),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_power(
    controller: &Controller,
    action: ZoneAction,
    on: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = action.wait.options(controller.config().timeout);
    let zones = &action.selection.zones;
    if on {
        controller.turn_on(zones, options).await?;
    } else {
        controller.turn_off(zones, options).await?;
    }
    output::print_status(
        &format!("Turned {} {}", output::on_off(on, false), describe(zones)),
        global.quiet,
    );
    Ok(())
}

pub async fn handle_color(
    controller: &Controller,
    args: ColorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = args.wait.options(controller.config().timeout);
    controller
        .apply_color(args.color, args.brightness, &args.selection.zones, options)
        .await?;
    output::print_status(
        &format!("Showing {} on {}", args.color, describe(&args.selection.zones)),
        global.quiet,
    );
    Ok(())
}

pub async fn handle_lights(
    controller: &Controller,
    args: LightsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = args.wait.options(controller.config().timeout);
    controller
        .apply_light_string(&args.colors, args.brightness, &args.selection.zones, options)
        .await?;
    output::print_status(
        &format!(
            "Showing {} colors on {}",
            args.colors.len(),
            describe(&args.selection.zones)
        ),
        global.quiet,
    );
    Ok(())
}

fn describe(zones: &[String]) -> String {
    if zones.is_empty() {
        "all zones".into()
    } else {
        zones.join(", ")
    }
}
