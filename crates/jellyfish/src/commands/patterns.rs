//! Stored pattern command handlers.

use std::fmt::Write;

use tabled::Tabled;

use jellyfish_core::{Controller, Pattern, PatternConfig};

use crate::cli::{GlobalOpts, PatternsArgs, PatternsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PatternRow {
    #[tabled(rename = "Folder")]
    folder: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Read-only")]
    read_only: String,
}

impl From<&Pattern> for PatternRow {
    fn from(p: &Pattern) -> Self {
        Self {
            folder: p.folders.clone(),
            name: if p.is_folder() {
                "(folder)".into()
            } else {
                p.name.clone()
            },
            read_only: if p.read_only { "yes".into() } else { String::new() },
        }
    }
}

fn detail(config: &PatternConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Type:        {}", config.pattern_type);
    let colors: Vec<String> = config
        .colors
        .chunks(3)
        .map(|c| c.iter().map(u8::to_string).collect::<Vec<_>>().join(","))
        .collect();
    let _ = writeln!(out, "Colors:      {}", colors.join("  "));
    let _ = writeln!(out, "Brightness:  {}%", config.run_data.brightness);
    let _ = writeln!(out, "Speed:       {}", config.run_data.speed);
    let _ = writeln!(out, "Effect:      {}", config.run_data.effect);
    let _ = writeln!(out, "Direction:   {}", config.direction);
    let _ = write!(out, "Transition:  {}", config.effect_between_pixels);
    if let Some(zone) = &config.soffit_zone {
        let _ = write!(out, "\nSoffit zone: {zone}");
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: PatternsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let timeout = controller.config().timeout;
    match args.command {
        PatternsCommand::List => {
            let patterns = controller.get_pattern_list(timeout).await?;
            let out = output::render_list(
                &global.output,
                &patterns,
                |p| PatternRow::from(p),
                Pattern::key,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PatternsCommand::Show { pattern } => {
            let config = controller.get_pattern_config(&pattern, timeout).await?;
            let out = output::render_single(&global.output, &config, detail, |_| {
                pattern.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PatternsCommand::Apply {
            pattern,
            selection,
            wait,
        } => {
            controller
                .apply_pattern(&pattern, &selection.zones, wait.options(timeout))
                .await?;
            output::print_status(&format!("Running '{pattern}'"), global.quiet);
            Ok(())
        }

        PatternsCommand::Save {
            pattern,
            from_file,
            wait,
        } => {
            let config: PatternConfig = util::read_json_file(&from_file)?;
            controller
                .save_pattern(&pattern, &config, wait.options(timeout))
                .await?;
            output::print_status(&format!("Pattern '{pattern}' saved"), global.quiet);
            Ok(())
        }

        PatternsCommand::Delete { pattern, wait } => {
            if !util::confirm(&format!("Delete pattern '{pattern}'?"), global.yes)? {
                return Ok(());
            }
            controller
                .delete_pattern(&pattern, wait.options(timeout))
                .await?;
            output::print_status(&format!("Pattern '{pattern}' deleted"), global.quiet);
            Ok(())
        }
    }
}
