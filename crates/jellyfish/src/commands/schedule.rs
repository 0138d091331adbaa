//! Calendar and daily schedule handlers.

use tabled::Tabled;

use jellyfish_core::{Controller, ScheduleEvent, ScheduleEventAction, ScheduleKind, StartFrom};

use crate::cli::{GlobalOpts, ScheduleActionCommand, ScheduleArgs, ScheduleCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Days")]
    days: String,
    #[tabled(rename = "Actions")]
    actions: String,
}

impl From<&ScheduleEvent> for EventRow {
    fn from(e: &ScheduleEvent) -> Self {
        Self {
            label: e.label.clone(),
            days: e.days.join(" "),
            actions: e
                .actions
                .iter()
                .map(describe_action)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn describe_action(action: &ScheduleEventAction) -> String {
    let when = match action.start_from {
        StartFrom::Time => format!("{:02}:{:02}", action.hour, action.minute),
        reference => {
            let offset = action.hour.saturating_mul(60).saturating_add(action.minute);
            format!("{reference}{offset:+}m")
        }
    };
    let what = if action.pattern_file.is_empty() {
        action.kind.to_string()
    } else {
        format!("{} {}", action.kind, action.pattern_file)
    };
    format!("{when} {what} [{}]", action.zones.join(", "))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ScheduleArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (kind, action) = match args.command {
        ScheduleCommand::Calendar(action) => (ScheduleKind::Calendar, action),
        ScheduleCommand::Daily(action) => (ScheduleKind::Daily, action),
    };
    let timeout = controller.config().timeout;

    match action.command {
        ScheduleActionCommand::List => {
            let events = match kind {
                ScheduleKind::Calendar => controller.get_calendar_schedule(timeout).await?,
                ScheduleKind::Daily => controller.get_daily_schedule(timeout).await?,
            };
            let out = output::render_list(
                &global.output,
                &events,
                |e| EventRow::from(e),
                |e| e.label.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ScheduleActionCommand::Set { from_file, wait } => {
            let events: Vec<ScheduleEvent> = util::read_json_file(&from_file)?;
            let count = events.len();
            replace(controller, kind, events, wait.options(timeout)).await?;
            output::print_status(
                &format!("{kind} schedule replaced ({count} events)"),
                global.quiet,
            );
            Ok(())
        }

        ScheduleActionCommand::Add { from_file, wait } => {
            let event: ScheduleEvent = util::read_json_file(&from_file)?;
            let label = event.label.clone();
            let options = wait.options(timeout);
            match kind {
                ScheduleKind::Calendar => controller.add_calendar_event(event, options).await?,
                ScheduleKind::Daily => controller.add_daily_event(event, options).await?,
            }
            output::print_status(
                &format!("Event '{label}' added to the {kind} schedule"),
                global.quiet,
            );
            Ok(())
        }

        ScheduleActionCommand::Clear { wait } => {
            if !util::confirm(&format!("Remove every {kind} event?"), global.yes)? {
                return Ok(());
            }
            replace(controller, kind, Vec::new(), wait.options(timeout)).await?;
            output::print_status(&format!("{kind} schedule cleared"), global.quiet);
            Ok(())
        }
    }
}

async fn replace(
    controller: &Controller,
    kind: ScheduleKind,
    events: Vec<ScheduleEvent>,
    options: jellyfish_core::RequestOptions,
) -> Result<(), CliError> {
    match kind {
        ScheduleKind::Calendar => controller.set_calendar_schedule(events, options).await?,
        ScheduleKind::Daily => controller.set_daily_schedule(events, options).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use jellyfish_core::ActionKind;

    use super::*;

    fn action(start_from: StartFrom, hour: i32, minute: i32) -> ScheduleEventAction {
        ScheduleEventAction {
            kind: ActionKind::Run,
            start_from,
            hour,
            minute,
            pattern_file: "Christmas/Tree".into(),
            zones: vec!["Front".into()],
        }
    }

    #[test]
    fn actions_read_as_time_or_offset() {
        assert_eq!(
            describe_action(&action(StartFrom::Time, 18, 5)),
            "18:05 RUN Christmas/Tree [Front]"
        );
        assert_eq!(
            describe_action(&action(StartFrom::Sunset, 0, -30)),
            "sunset-30m RUN Christmas/Tree [Front]"
        );
    }

    #[test]
    fn out_of_range_offsets_saturate() {
        assert_eq!(
            describe_action(&action(StartFrom::Sunrise, i32::MAX, i32::MAX)),
            format!("sunrise{:+}m RUN Christmas/Tree [Front]", i32::MAX)
        );
        assert_eq!(
            describe_action(&action(StartFrom::Sunset, i32::MIN, -1)),
            format!("sunset{}m RUN Christmas/Tree [Front]", i32::MIN)
        );
    }
}
