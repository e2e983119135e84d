//! Line-oriented command scripts and the host that runs them.
//!
//! One command per line; blank lines and lines starting with `#` are skipped.
//! Object ids may be written bare (`3`) or with their display prefix (`#3`).
//!
//! ```text
//! select 1 2      replace the selection with objects #1 and #2
//! select          clear the selection
//! create 5        bring object #5 to life
//! destroy 2       destroy object #2
//! back | forward  navigate
//! mouse 3         side-button click (3 = back, 4 = forward)
//! status          print selection and history depth
//! menu            print the navigation commands and whether they are enabled
//! clear           forget all history
//! save            persist now
//! quit            stop reading the script
//! ```

use std::io::{BufRead, Write};
use std::rc::Rc;

use selection_history::session::DynStore;
use selection_history::{
    HistoryConfig, HistoryNavigator, HistorySession, NavigationCommand, ObjectId, ObjectTable,
    SelectionCell, SelectionSnapshot, Subscription,
};
use tracing::{debug, info};

use crate::error::{DemoError, Result};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(Vec<ObjectId>),
    Create(Vec<ObjectId>),
    Destroy(Vec<ObjectId>),
    Navigate(NavigationCommand),
    Mouse(u8),
    Status,
    Menu,
    Clear,
    Save,
    Quit,
}

impl Command {
    /// Parse one line. `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb {
            "select" => Self::Select(parse_ids(&args)?),
            "create" => Self::Create(parse_non_empty_ids(verb, &args)?),
            "destroy" => Self::Destroy(parse_non_empty_ids(verb, &args)?),
            "back" => Self::Navigate(NavigationCommand::Back),
            "forward" => Self::Navigate(NavigationCommand::Forward),
            "mouse" => match args.as_slice() {
                [button] => Self::Mouse(
                    button
                        .parse()
                        .map_err(|_| format!("invalid mouse button `{button}`"))?,
                ),
                _ => return Err("usage: mouse <button>".into()),
            },
            "status" => Self::Status,
            "menu" => Self::Menu,
            "clear" => Self::Clear,
            "save" => Self::Save,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command `{other}`")),
        };

        let takes_args = matches!(
            command,
            Self::Select(_) | Self::Create(_) | Self::Destroy(_) | Self::Mouse(_)
        );
        if !takes_args && !args.is_empty() {
            return Err(format!("`{verb}` takes no arguments"));
        }
        Ok(Some(command))
    }
}

fn parse_ids(args: &[&str]) -> std::result::Result<Vec<ObjectId>, String> {
    args.iter()
        .map(|arg| {
            arg.trim_start_matches('#')
                .parse::<u64>()
                .map(ObjectId::new)
                .map_err(|_| format!("invalid object id `{arg}`"))
        })
        .collect()
}

fn parse_non_empty_ids(verb: &str, args: &[&str]) -> std::result::Result<Vec<ObjectId>, String> {
    let ids = parse_ids(args)?;
    if ids.is_empty() {
        return Err(format!("usage: {verb} <id>..."));
    }
    Ok(ids)
}

/// Whether to keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// A scripted host: a [`SelectionCell`], an [`ObjectTable`] and the history
/// session wired to them.
pub struct ScriptHost {
    selection: SelectionCell,
    objects: Rc<ObjectTable>,
    session: HistorySession<SelectionCell, Rc<ObjectTable>, DynStore>,
    _wiring: Subscription,
}

impl ScriptHost {
    /// Start a session for `config` with objects `1..=object_count` alive.
    pub fn start(config: &HistoryConfig, object_count: u64) -> Self {
        let selection = SelectionCell::default();
        let objects = Rc::new(ObjectTable::with_objects(
            (1..=object_count).map(ObjectId::new),
        ));
        let session = HistorySession::from_config(config, selection.clone(), objects.clone());
        info!(outcome = ?session.load_outcome(), "session started");
        let wiring = session.attach(&selection);
        Self {
            selection,
            objects,
            session,
            _wiring: wiring,
        }
    }

    /// The session.
    pub fn session(&self) -> &HistorySession<SelectionCell, Rc<ObjectTable>, DynStore> {
        &self.session
    }

    /// The current selection.
    pub fn selection(&self) -> SelectionSnapshot {
        self.selection.get()
    }

    /// Run one command, writing any report to `out`.
    pub fn execute(&self, command: &Command, out: &mut impl Write) -> Result<Flow> {
        let navigator = self.session.navigator().as_ref();
        match command {
            Command::Select(ids) => self.selection.set(SelectionSnapshot::new(ids.iter().copied())),
            Command::Create(ids) => {
                for &id in ids {
                    self.objects.insert(id);
                }
            }
            Command::Destroy(ids) => {
                for &id in ids {
                    self.objects.destroy(id);
                }
            }
            Command::Navigate(nav) => {
                if !nav.execute(navigator) {
                    writeln!(out, "{}: nothing to navigate to", nav.menu_path())?;
                }
            }
            Command::Mouse(button) => match NavigationCommand::from_mouse_button(*button, 1) {
                Some(nav) => {
                    if !nav.execute(navigator) {
                        writeln!(out, "{}: nothing to navigate to", nav.menu_path())?;
                    }
                }
                None => debug!(button = *button, "mouse button not bound"),
            },
            Command::Status => self.write_status(out)?,
            Command::Menu => {
                for nav in [NavigationCommand::Back, NavigationCommand::Forward] {
                    writeln!(
                        out,
                        "{} {:<24} {:<8} {} [{}]",
                        nav.glyph(),
                        nav.menu_path(),
                        nav.default_shortcut(),
                        nav.tooltip(),
                        if nav.is_enabled(navigator) {
                            "enabled"
                        } else {
                            "disabled"
                        }
                    )?;
                }
            }
            Command::Clear => navigator.clear(),
            Command::Save => {
                if self.session.save().is_none() {
                    writeln!(out, "save failed; see log")?;
                }
            }
            Command::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    fn write_status(&self, out: &mut impl Write) -> Result<()> {
        let navigator = self.session.navigator();
        let (back, forward) = navigator.with_engine(|e| (e.back().len(), e.forward().len()));
        let ids: Vec<String> = self.selection.get().ids().iter().map(ToString::to_string).collect();
        writeln!(
            out,
            "selection [{}]  back {back}{}  forward {forward}{}",
            ids.join(" "),
            if navigator.can_navigate_backward() { "" } else { " (none live)" },
            if navigator.can_navigate_forward() { "" } else { " (none live)" },
        )?;
        Ok(())
    }

    /// Run every command from `input` until it ends or says `quit`.
    ///
    /// Returns the number of commands executed.
    pub fn run_script(&self, input: impl BufRead, out: &mut impl Write) -> Result<usize> {
        let mut executed = 0;
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let Some(command) =
                Command::parse(&line).map_err(|message| DemoError::script(index + 1, message))?
            else {
                continue;
            };
            executed += 1;
            if self.execute(&command, out)? == Flow::Stop {
                break;
            }
        }
        Ok(executed)
    }

    /// Save and end the session.
    pub fn shutdown(self) {
        let Self {
            session,
            _wiring: wiring,
            ..
        } = self;
        drop(wiring);
        session.shutdown();
    }
}
