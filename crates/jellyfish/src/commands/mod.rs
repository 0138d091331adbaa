//! Command dispatch: bridges CLI args -> Controller calls -> output formatting.

pub mod config_cmd;
pub mod info;
pub mod lights;
pub mod patterns;
pub mod schedule;
pub mod util;
pub mod zones;

use jellyfish_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Connect, run one controller-bound command, disconnect.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let connect_timeout = controller.config().connect_timeout;
    controller.connect(connect_timeout).await?;

    let result = match cmd {
        Command::Info => info::handle_info(controller, global).await,
        Command::Name(args) => info::handle_name(controller, args, global).await,
        Command::Zones(args) => zones::handle(controller, args, global).await,
        Command::States(selection) => lights::handle_states(controller, selection, global).await,
        Command::On(action) => lights::handle_power(controller, action, true, global).await,
        Command::Off(action) => lights::handle_power(controller, action, false, global).await,
        Command::Color(args) => lights::handle_color(controller, args, global).await,
        Command::Lights(args) => lights::handle_lights(controller, args, global).await,
        Command::Patterns(args) => patterns::handle(controller, args, global).await,
        Command::Schedule(args) => schedule::handle(controller, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    };

    if let Err(err) = controller.disconnect(connect_timeout).await {
        tracing::warn!(error = %err, "disconnect did not complete cleanly");
    }
    result
}
