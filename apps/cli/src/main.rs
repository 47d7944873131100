mod command;
mod logging;
mod prompter;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tabula_core::{DocumentId, Location};
use tabula_settings::SettingsStore;
use tabula_shell::{CommandState, Prompter, Shell, ShellError};
use tracing::{info, warn};

use crate::command::{parse_line, Command};
use crate::prompter::TerminalPrompter;

/// 設定目錄的環境變數。 / Environment variable overriding the settings directory.
const CONFIG_ENV: &str = "TABULA_CONFIG_DIR";
const SETTINGS_FILE: &str = "settings.json";

type TerminalShell<R, W> = Shell<TerminalPrompter<R, W>>;

#[derive(Parser)]
#[command(
    name = "tabula",
    about = "Multi-document session editor driven by line commands on stdin",
    author,
    version
)]
struct Cli {
    /// 啟動時開啟的文件（路徑或 file:// 網址）。 / Documents to open at startup (paths or file:// URLs).
    #[arg(value_name = "LOCATIONS")]
    locations: Vec<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli { locations } = Cli::parse();
    logging::init();

    let cwd = env::current_dir().context("failed to determine the current directory")?;
    let settings_path = settings_dir()?.join(SETTINGS_FILE);
    let store = load_settings(settings_path);

    let stdin = io::stdin();
    let prompter = TerminalPrompter::new(stdin.lock(), io::stdout(), cwd.clone());
    let mut shell = Shell::new(store, dirs::home_dir(), prompter);

    for input in &locations {
        let Some(location) = Location::from_user_input(input, &cwd) else {
            warn!(input = %input, "ignoring empty location");
            continue;
        };
        if let Err(err) = shell.open(location) {
            writeln!(shell.prompter_mut().output(), "error: {err}")?;
        }
    }
    shell.pump_events();

    session(&mut shell)
}

fn settings_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("tabula"))
        .ok_or_else(|| anyhow!("cannot locate a configuration directory; set {CONFIG_ENV}"))
}

fn load_settings(path: PathBuf) -> SettingsStore {
    match SettingsStore::load(&path) {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "settings unreadable; starting with defaults");
            SettingsStore::empty_at(path)
        }
    }
}

fn session<R: BufRead, W: Write>(shell: &mut TerminalShell<R, W>) -> Result<()> {
    loop {
        let Some(line) = shell
            .prompter_mut()
            .read_line()
            .context("failed to read command")?
        else {
            if !shell.quit() {
                // Nobody is left to answer; keep the documents' files as they are.
                warn!("input closed while quitting was declined");
                shell.persist().context("failed to save settings")?;
            }
            return Ok(());
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(shell.prompter_mut().output(), "error: {err}")?;
                continue;
            }
        };

        if command == Command::Quit {
            if shell.quit() {
                info!("session finished");
                return Ok(());
            }
            writeln!(shell.prompter_mut().output(), "quit cancelled")?;
            continue;
        }

        let reply = match execute(shell, command) {
            Ok(text) => text,
            Err(err) if is_cancelled(&err) => "cancelled".to_string(),
            Err(err) => format!("error: {err}"),
        };
        shell.pump_events();
        if !reply.is_empty() {
            let output = shell.prompter_mut().output();
            writeln!(output, "{reply}")?;
            output.flush()?;
        }
    }
}

fn execute<R: BufRead, W: Write>(
    shell: &mut TerminalShell<R, W>,
    command: Command,
) -> Result<String> {
    if !available(&command, shell.command_state()) {
        return Ok(format!("{} is not available", command.name()));
    }
    let reply = match command {
        Command::New => {
            let id = shell.new_document();
            format!("created {}", shell.caption(id))
        }
        Command::Open(input) => {
            let location = resolve(shell, &input)?;
            let id = shell.open(location)?;
            format!("opened {}", shell.caption(id))
        }
        Command::Edit(text) => {
            let id = active(shell)?;
            shell.edit(id, text)?;
            String::new()
        }
        Command::Language(language) => {
            let id = active(shell)?;
            shell.set_language(id, language)?;
            String::new()
        }
        Command::Save => {
            let id = active(shell)?;
            shell.save(id)?;
            format!("saved {}", shell.caption(id))
        }
        Command::SaveAs(input) => {
            let id = active(shell)?;
            let location = resolve(shell, &input)?;
            shell.save_as(id, location)?;
            format!("saved {}", shell.caption(id))
        }
        Command::SaveCopy(input) => {
            let id = active(shell)?;
            let location = resolve(shell, &input)?;
            shell.save_copy_as(id, location.clone())?;
            format!("copy saved to {location}")
        }
        Command::SaveAll => {
            let saved = shell.save_all()?;
            format!("saved {saved} document(s)")
        }
        Command::Rename(name) => {
            let id = active(shell)?;
            if shell.rename(id, &name)? {
                format!("renamed to {}", shell.caption(id))
            } else {
                "name unchanged".to_string()
            }
        }
        Command::Activate(position) => {
            let Some(id) = shell.registry().ids().get(position - 1).copied() else {
                bail!("no document at position {position}");
            };
            shell.activate(id)?;
            shell.window_title()
        }
        Command::Close => {
            let id = active(shell)?;
            let caption = shell.caption(id);
            shell.close(id)?;
            format!("closed {caption}")
        }
        Command::CloseOthers => {
            let closed = shell.close_others()?;
            format!("closed {closed} document(s)")
        }
        Command::CloseAll => {
            let closed = shell.close_all()?;
            format!("closed {closed} document(s)")
        }
        Command::List => list(shell),
        Command::Recent => recent(shell),
        Command::OpenRecent(position) => {
            let id = shell.open_recent(position - 1)?;
            format!("opened {}", shell.caption(id))
        }
        Command::ClearRecent => {
            shell.clear_recent();
            "recent documents cleared".to_string()
        }
        Command::MaxRecent(maximum) => {
            shell.set_maximum_recent(maximum);
            format!("maximum recent documents: {}", shell.recent().maximum())
        }
        Command::ShowPath(visible) => {
            shell.set_path_visible(visible);
            shell.window_title()
        }
        Command::Title => {
            let title = shell.window_title();
            if title.is_empty() {
                "(no document)".to_string()
            } else {
                title
            }
        }
        Command::State => state(shell.command_state()),
        Command::Quit => String::new(),
    };
    Ok(reply)
}

// Commands without a gate run always; `save` and friends report a missing document themselves.
fn available(command: &Command, state: CommandState) -> bool {
    match command {
        Command::SaveAll => state.save_all,
        Command::Rename(_) => state.has_file_name,
        Command::CloseOthers => state.close_others,
        Command::CloseAll => state.close_all,
        Command::OpenRecent(_) | Command::ClearRecent => state.recent_available,
        _ => true,
    }
}

fn state(state: CommandState) -> String {
    let flag = |on: bool| if on { "yes" } else { "no" };
    format!(
        "document={} location={} file-name={} save-all={} close-others={} close-all={} tab-bar={} recent={}",
        flag(state.has_document),
        flag(state.has_location),
        flag(state.has_file_name),
        flag(state.save_all),
        flag(state.close_others),
        flag(state.close_all),
        if state.tab_bar_shown { "shown" } else { "hidden" },
        flag(state.recent_available),
    )
}

fn active<P: Prompter>(shell: &Shell<P>) -> Result<DocumentId, ShellError> {
    shell.active_id().ok_or(ShellError::NoActiveDocument)
}

fn resolve<R: BufRead, W: Write>(shell: &TerminalShell<R, W>, input: &str) -> Result<Location> {
    Location::from_user_input(input, shell.prompter().cwd())
        .ok_or_else(|| anyhow!("'{input}' is not a usable location"))
}

fn list<P: Prompter>(shell: &Shell<P>) -> String {
    let active = shell.active_id();
    let lines: Vec<String> = shell
        .registry()
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let marker = if Some(document.id()) == active { '>' } else { ' ' };
            let modified = if document.is_modified() {
                " [modified]"
            } else {
                ""
            };
            format!(
                "{marker} {}: {}{modified}",
                index + 1,
                shell.caption(document.id())
            )
        })
        .collect();
    if lines.is_empty() {
        "(no documents)".to_string()
    } else {
        lines.join("\n")
    }
}

fn recent<P: Prompter>(shell: &Shell<P>) -> String {
    let recent = shell.recent();
    let home = shell.registry().home();
    let lines: Vec<String> = (0..recent.len())
        .filter_map(|index| {
            recent
                .entry_text(index, home)
                .map(|text| format!("{}: {text}", index + 1))
        })
        .collect();
    if lines.is_empty() {
        "(no recent documents)".to_string()
    } else {
        lines.join("\n")
    }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ShellError>()
        .is_some_and(ShellError::is_cancelled)
}
