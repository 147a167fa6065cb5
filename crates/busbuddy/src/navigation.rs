//! Screen navigation.
//!
//! A small state machine over [`ViewState`]. Exactly one [`Screen`] is active
//! at a time and it is derived from the state, never stored. Every input is
//! accepted in every state; inputs that do not apply leave the state alone
//! and report `false`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::registry::{School, SchoolsRegistry};

/// Inline message shown for an unknown access code.
pub const INVALID_CODE_MESSAGE: &str = "Invalid code. Try \"SEL999\"";

/// Who is using the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Teacher or bus driver.
    Driver,
    /// Parent of a pupil.
    Parent,
    /// School administrator.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Driver => write!(f, "driver"),
            Self::Parent => write!(f, "parent"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "driver" | "teacher" => Ok(Self::Driver),
            "parent" => Ok(Self::Parent),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Tracker sub-view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    /// Live map.
    #[default]
    Map,
    /// Route chat.
    Chat,
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Map => write!(f, "map"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "map" => Ok(Self::Map),
            "chat" => Ok(Self::Chat),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}

/// Where the pupil is on today's run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardingStatus {
    /// Waiting at the stop.
    #[default]
    Waiting,
    /// On the bus.
    Boarded,
    /// Dropped off.
    Arrived,
}

impl BoardingStatus {
    /// The status after one press of the update button.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Boarded,
            Self::Boarded => Self::Arrived,
            Self::Arrived => Self::Waiting,
        }
    }
}

impl std::fmt::Display for BoardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Wait"),
            Self::Boarded => write!(f, "Boarded"),
            Self::Arrived => write!(f, "Arrived"),
        }
    }
}

/// The screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Pick driver, parent or admin.
    RoleSelect,
    /// Enter a school access code.
    Login,
    /// Admin route management.
    AdminHub,
    /// Pick a route.
    RouteSelect,
    /// Live map or chat for the chosen route.
    Tracker(Tab),
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoleSelect => write!(f, "role-select"),
            Self::Login => write!(f, "login"),
            Self::AdminHub => write!(f, "admin-hub"),
            Self::RouteSelect => write!(f, "route-select"),
            Self::Tracker(tab) => write!(f, "tracker/{tab}"),
        }
    }
}

/// Everything the presentation layer needs to pick and draw a screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Chosen role.
    pub role: Option<Role>,
    /// Inline error from the last failed code check.
    pub code_error: Option<String>,
    /// Verified school, carrying its access code.
    pub selected_school: Option<School>,
    /// Chosen route.
    pub route: Option<String>,
    /// Active tracker tab.
    pub active_tab: Tab,
    /// Whether live tracking is running.
    pub live: bool,
    /// Whether the SOS banner is up.
    pub sos_active: bool,
    /// Pupil boarding status.
    pub boarding: BoardingStatus,
}

impl ViewState {
    /// The screen this state selects.
    #[must_use]
    pub fn screen(&self) -> Screen {
        match (self.role, &self.selected_school, &self.route) {
            (None, _, _) => Screen::RoleSelect,
            (Some(_), None, _) => Screen::Login,
            (Some(Role::Admin), Some(_), _) => Screen::AdminHub,
            (Some(_), Some(_), None) => Screen::RouteSelect,
            (Some(_), Some(_), Some(_)) => Screen::Tracker(self.active_tab),
        }
    }

    /// Access code of the verified school.
    #[must_use]
    pub fn school_code(&self) -> Option<&str> {
        self.selected_school.as_ref()?.code.as_deref()
    }
}

/// Owns the view state and applies user input to it.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    state: ViewState,
}

impl Navigator {
    /// Start on the role picker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Mutable access for the fields the controller mirrors (live, SOS).
    pub(crate) fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    /// Current screen.
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.state.screen()
    }

    /// Pick a role. Only applies on the role picker.
    pub fn choose_role(&mut self, role: Role) -> bool {
        if self.screen() != Screen::RoleSelect {
            return false;
        }
        self.state.role = Some(role);
        self.log_transition("choose_role");
        true
    }

    /// Check an access code against `registry`.
    ///
    /// Returns `Ok(true)` once verified and `Ok(false)` when not on the
    /// login screen.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidAccessCode`] for unknown codes; the
    /// inline error message is set and the login screen stays up.
    pub fn verify_code(&mut self, registry: &SchoolsRegistry, input: &str) -> Result<bool> {
        if self.screen() != Screen::Login {
            return Ok(false);
        }
        match registry.verify(input) {
            Ok(school) => {
                self.state.selected_school = Some(school);
                self.state.code_error = None;
                self.log_transition("verify_code");
                Ok(true)
            }
            Err(err) => {
                debug!(%err, "access code rejected");
                self.state.code_error = Some(INVALID_CODE_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    /// Pick one of the verified school's routes.
    pub fn choose_route(&mut self, name: &str) -> bool {
        if self.screen() != Screen::RouteSelect {
            return false;
        }
        let Some(school) = &self.state.selected_school else {
            return false;
        };
        if !school.has_route(name) {
            debug!(route = name, "unknown route ignored");
            return false;
        }
        self.state.route = Some(name.to_string());
        self.log_transition("choose_route");
        true
    }

    /// Swap the tracker sub-view.
    pub fn set_tab(&mut self, tab: Tab) -> bool {
        if !matches!(self.screen(), Screen::Tracker(_)) || self.state.active_tab == tab {
            return false;
        }
        self.state.active_tab = tab;
        self.log_transition("set_tab");
        true
    }

    /// Leave the tracker for the route list.
    pub fn switch_route(&mut self) -> bool {
        if !matches!(self.screen(), Screen::Tracker(_)) {
            return false;
        }
        self.state.route = None;
        self.log_transition("switch_route");
        true
    }

    /// Go one screen back.
    pub fn back(&mut self) -> bool {
        match self.screen() {
            Screen::RoleSelect => return false,
            Screen::Login => {
                self.state.role = None;
                self.state.code_error = None;
            }
            Screen::AdminHub | Screen::RouteSelect => {
                self.state.selected_school = None;
            }
            Screen::Tracker(_) => {
                self.state.route = None;
            }
        }
        self.log_transition("back");
        true
    }

    /// Advance the pupil's boarding status. Parents only, on the tracker.
    pub fn cycle_boarding_status(&mut self) -> Option<BoardingStatus> {
        if !matches!(self.screen(), Screen::Tracker(_)) || self.state.role == Some(Role::Driver) {
            return None;
        }
        self.state.boarding = self.state.boarding.next();
        Some(self.state.boarding)
    }

    /// Re-read the verified school after the registry changed.
    pub fn refresh_school(&mut self, registry: &SchoolsRegistry) {
        let Some(code) = self.state.school_code().map(str::to_string) else {
            return;
        };
        if let Ok(school) = registry.verify(&code) {
            self.state.selected_school = Some(school);
        }
    }

    fn log_transition(&self, input: &str) {
        debug!(input, screen = %self.screen(), "navigation");
    }
}
