//! Interactive shell commands.
//!
//! One line of input parses into one [`ShellCommand`], which is applied to
//! a [`Controller`].

use tracing::debug;

use crate::controller::Controller;
use crate::error::Result;
use crate::navigation::{Role, Tab};

/// Help text printed by `help`.
pub const HELP: &str = "\
commands:
  role <driver|parent|admin>   pick a role
  code <CODE>                  enter a school access code
  route <NAME>                 pick a route
  tab <map|chat>               switch tracker tab
  send <TEXT>                  send a chat message
  quick <N>                    send quick reply N
  start | stop                 start or stop the shift (driver)
  sos                          raise the emergency banner (driver)
  status                       advance boarding status (parent)
  switch                       back to the route list
  back                         one screen back
  add-route <NAME>             add a route (admin)
  remove-route <NAME>          remove a route (admin)
  show                         redraw the screen
  help                         this text
  quit                         leave";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ShellCommand {
    Role(Role),
    Code(String),
    Route(String),
    Tab(Tab),
    Send(String),
    Quick(usize),
    Start,
    Stop,
    Sos,
    Status,
    Switch,
    Back,
    AddRoute(String),
    RemoveRoute(String),
    Show,
    Help,
    Quit,
}

/// What the shell loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Redraw, optionally printing a note first.
    Continue(Option<String>),
    /// Print the help text.
    Help,
    /// Leave the shell.
    Quit,
}

impl ShellCommand {
    /// Parse one input line. Blank lines parse to `None`.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the line was rejected.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let needs_arg = |what: &str| -> std::result::Result<String, String> {
            if rest.is_empty() {
                Err(format!("{word}: missing {what}"))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match word.to_lowercase().as_str() {
            "role" => Self::Role(rest.parse()?),
            "code" => Self::Code(needs_arg("code")?),
            "route" => Self::Route(needs_arg("route name")?),
            "tab" => Self::Tab(rest.parse()?),
            "send" => Self::Send(needs_arg("message")?),
            "quick" => Self::Quick(
                rest.parse()
                    .map_err(|_| format!("quick: expected a number, got {rest:?}"))?,
            ),
            "start" => Self::Start,
            "stop" => Self::Stop,
            "sos" => Self::Sos,
            "status" => Self::Status,
            "switch" => Self::Switch,
            "back" => Self::Back,
            "add-route" => Self::AddRoute(needs_arg("route name")?),
            "remove-route" => Self::RemoveRoute(needs_arg("route name")?),
            "show" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command: {other} (try help)")),
        };
        Ok(Some(command))
    }

    /// Apply the command to `app`.
    ///
    /// An invalid access code is reported through the view, not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a registry edit cannot be saved.
    pub fn execute(self, app: &mut Controller) -> Result<Outcome> {
        debug!(command = ?self, screen = %app.screen(), "shell command");
        let note = match self {
            Self::Role(role) => ignored(app.choose_role(role)),
            Self::Code(code) => match app.verify_code(&code) {
                Ok(moved) => ignored(moved),
                Err(e) if e.is_invalid_access_code() => None,
                Err(e) => return Err(e),
            },
            Self::Route(name) => {
                (!app.choose_route(&name)).then(|| format!("no route called {name:?}"))
            }
            Self::Tab(tab) => ignored(app.set_tab(tab)),
            Self::Send(text) => ignored(app.send_message(&text).is_some()),
            Self::Quick(index) => ignored(app.send_quick_reply(index).is_some()),
            Self::Start => ignored(app.start_tracking()),
            Self::Stop => ignored(app.stop_tracking()),
            Self::Sos => ignored(app.trigger_sos()),
            Self::Status => ignored(app.cycle_boarding_status().is_some()),
            Self::Switch => ignored(app.switch_route()),
            Self::Back => ignored(app.back()),
            Self::AddRoute(name) => ignored(app.add_route(&name)?),
            Self::RemoveRoute(name) => ignored(app.remove_route(&name)?),
            Self::Show => None,
            Self::Help => return Ok(Outcome::Help),
            Self::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Continue(note))
    }
}

fn ignored(applied: bool) -> Option<String> {
    (!applied).then(|| "(nothing to do here)".to_string())
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::navigation::Screen;

    use super::*;

    fn run(app: &mut Controller, line: &str) -> Outcome {
        ShellCommand::parse(line)
            .unwrap()
            .unwrap()
            .execute(app)
            .unwrap()
    }

    #[test]
    fn test_parse_simple_words() {
        assert_eq!(ShellCommand::parse("start").unwrap(), Some(ShellCommand::Start));
        assert_eq!(ShellCommand::parse("  QUIT ").unwrap(), Some(ShellCommand::Quit));
        assert_eq!(ShellCommand::parse("").unwrap(), None);
    }

    #[test]
    fn test_parse_arguments_keep_spaces() {
        assert_eq!(
            ShellCommand::parse("route Route Gold").unwrap(),
            Some(ShellCommand::Route("Route Gold".to_string()))
        );
        assert_eq!(
            ShellCommand::parse("send  Running late! ").unwrap(),
            Some(ShellCommand::Send("Running late!".to_string()))
        );
    }

    #[test]
    fn test_parse_typed_arguments() {
        assert_eq!(
            ShellCommand::parse("role teacher").unwrap(),
            Some(ShellCommand::Role(Role::Driver))
        );
        assert_eq!(
            ShellCommand::parse("tab chat").unwrap(),
            Some(ShellCommand::Tab(Tab::Chat))
        );
        assert_eq!(
            ShellCommand::parse("quick 2").unwrap(),
            Some(ShellCommand::Quick(2))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ShellCommand::parse("role pilot").is_err());
        assert!(ShellCommand::parse("quick two").is_err());
        assert!(ShellCommand::parse("send").is_err());
        assert!(ShellCommand::parse("fly").unwrap_err().contains("unknown command"));
    }

    #[tokio::test]
    async fn test_parent_chat_session() {
        let mut app = Controller::in_memory(Config::default()).unwrap();
        run(&mut app, "role parent");
        run(&mut app, "code pae101");
        run(&mut app, "route Route Gold");
        run(&mut app, "tab chat");

        let before = app.messages().len();
        assert_eq!(run(&mut app, "send Running late!"), Outcome::Continue(None));
        assert_eq!(app.messages().len(), before + 1);
        assert!(app.messages().last().unwrap().sender.contains("Parent"));
    }

    #[tokio::test]
    async fn test_bad_code_is_not_an_error() {
        let mut app = Controller::in_memory(Config::default()).unwrap();
        run(&mut app, "role admin");
        assert_eq!(run(&mut app, "code nope"), Outcome::Continue(None));
        assert_eq!(app.screen(), Screen::Login);
        assert!(app.view_state().code_error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_route_gets_a_note() {
        let mut app = Controller::in_memory(Config::default()).unwrap();
        run(&mut app, "role parent");
        run(&mut app, "code PAE101");

        let Outcome::Continue(Some(note)) = run(&mut app, "route Route Blue") else {
            panic!("expected a note");
        };
        assert!(note.contains("Route Blue"));
        assert_eq!(app.screen(), Screen::RouteSelect);
    }

    #[tokio::test]
    async fn test_help_and_quit() {
        let mut app = Controller::in_memory(Config::default()).unwrap();
        assert_eq!(run(&mut app, "help"), Outcome::Help);
        assert_eq!(run(&mut app, "exit"), Outcome::Quit);
    }
}
