//! Application controller.
//!
//! Ties the navigator to the registry, the chat log, the location
//! simulator, the SOS signal and storage. Every user action goes through
//! here; the presentation layer only reads.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::chat::{self, Message, MessageLog};
use crate::config::Config;
use crate::error::Result;
use crate::location::{Location, LocationSimulator, SimulatorConfig};
use crate::navigation::{BoardingStatus, Navigator, Role, Screen, Tab, ViewState};
use crate::registry::SchoolsRegistry;
use crate::sos::SosSignal;
use crate::storage::Storage;

/// The single owner of session state.
///
/// Timers are tokio tasks, so a controller must live inside a runtime.
#[derive(Debug)]
pub struct Controller {
    config: Config,
    navigator: Navigator,
    registry: SchoolsRegistry,
    storage: Storage,
    messages: MessageLog,
    simulator: LocationSimulator,
    sos: SosSignal,
}

impl Controller {
    /// Build a controller on top of `storage`, loading the registry from it.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the stored registry cannot
    /// be read.
    pub fn new(config: Config, storage: Storage) -> Result<Self> {
        config.validate()?;
        let simulator = LocationSimulator::new(SimulatorConfig::from(&config))?;
        let registry = storage.load_registry(&config.storage.registry_key)?;
        info!(schools = registry.len(), "controller ready");
        Ok(Self {
            navigator: Navigator::new(),
            registry,
            storage,
            messages: MessageLog::seeded(config.chat.parent_display_name.clone()),
            simulator,
            sos: SosSignal::new(config.sos_reset_after()),
            config,
        })
    }

    /// Open the configured database and build a controller on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or read.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        Self::new(config, storage)
    }

    /// Build a controller backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::new(config, Storage::open_in_memory()?)
    }

    // === Reads ===

    /// Snapshot of the view state, including timer-driven flags.
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        let mut state = self.navigator.state().clone();
        state.live = self.simulator.is_live();
        state.sos_active = self.sos.is_active();
        state
    }

    /// The active screen.
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.navigator.screen()
    }

    /// The current role.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.navigator.state().role
    }

    /// The schools registry.
    #[must_use]
    pub fn registry(&self) -> &SchoolsRegistry {
        &self.registry
    }

    /// The chat log.
    #[must_use]
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Canned replies for the current role.
    #[must_use]
    pub fn quick_replies(&self) -> &'static [&'static str] {
        chat::quick_replies(self.role().unwrap_or(Role::Parent))
    }

    /// The bus position, if tracking is live.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.simulator.current()
    }

    /// Subscribe to bus positions.
    #[must_use]
    pub fn subscribe_location(&self) -> watch::Receiver<Option<Location>> {
        self.simulator.subscribe()
    }

    /// Whether tracking is live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.simulator.is_live()
    }

    /// Whether the SOS banner is up.
    #[must_use]
    pub fn is_sos_active(&self) -> bool {
        self.sos.is_active()
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The backing store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // === Navigation ===

    /// Pick a role on the role picker.
    pub fn choose_role(&mut self, role: Role) -> bool {
        self.navigator.choose_role(role)
    }

    /// Check an access code.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidAccessCode`] for unknown codes.
    pub fn verify_code(&mut self, input: &str) -> Result<bool> {
        self.navigator.verify_code(&self.registry, input)
    }

    /// Pick a route from the verified school.
    pub fn choose_route(&mut self, name: &str) -> bool {
        self.navigator.choose_route(name)
    }

    /// Swap the tracker tab.
    pub fn set_tab(&mut self, tab: Tab) -> bool {
        self.navigator.set_tab(tab)
    }

    /// Return to the route list. Stops live tracking.
    pub fn switch_route(&mut self) -> bool {
        let moved = self.navigator.switch_route();
        self.stop_if_left_tracker(moved);
        moved
    }

    /// Go one screen back. Stops live tracking when leaving the tracker.
    pub fn back(&mut self) -> bool {
        let was_tracking = matches!(self.screen(), Screen::Tracker(_));
        let moved = self.navigator.back();
        self.stop_if_left_tracker(moved && was_tracking);
        moved
    }

    /// Advance the pupil's boarding status.
    pub fn cycle_boarding_status(&mut self) -> Option<BoardingStatus> {
        self.navigator.cycle_boarding_status()
    }

    fn stop_if_left_tracker(&mut self, left: bool) {
        if left && self.simulator.is_live() {
            debug!("left tracker while live, stopping simulator");
            self.stop_tracking();
        }
    }

    fn driver_on_tracker(&self) -> bool {
        self.role() == Some(Role::Driver) && matches!(self.screen(), Screen::Tracker(_))
    }

    // === Live tracking ===

    /// Start the shift. Driver only, on the tracker.
    pub fn start_tracking(&mut self) -> bool {
        if !self.driver_on_tracker() {
            debug!(screen = %self.screen(), "start tracking ignored");
            return false;
        }
        self.simulator.start();
        self.navigator.state_mut().live = true;
        true
    }

    /// Stop the shift. Returns `false` if tracking was not live.
    pub fn stop_tracking(&mut self) -> bool {
        if !self.simulator.is_live() {
            return false;
        }
        self.simulator.stop();
        self.navigator.state_mut().live = false;
        true
    }

    /// Raise the SOS banner. Driver only, on the tracker.
    pub fn trigger_sos(&mut self) -> bool {
        if !self.driver_on_tracker() {
            debug!(screen = %self.screen(), "sos ignored");
            return false;
        }
        self.sos.trigger();
        true
    }

    // === Chat ===

    /// Send a chat message as the current role. Only on the tracker.
    pub fn send_message(&mut self, text: &str) -> Option<&Message> {
        let role = self.chat_role()?;
        self.messages.send(text, role)
    }

    /// Send the `index`-th quick reply for the current role.
    pub fn send_quick_reply(&mut self, index: usize) -> Option<&Message> {
        let role = self.chat_role()?;
        self.messages.send_quick_reply(index, role)
    }

    fn chat_role(&self) -> Option<Role> {
        if matches!(self.screen(), Screen::Tracker(_)) {
            self.role()
        } else {
            None
        }
    }

    // === Admin ===

    /// Add a route to the school open in the admin hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry snapshot cannot be saved.
    pub fn add_route(&mut self, name: &str) -> Result<bool> {
        match self.admin_school_code() {
            Some(code) => self.add_route_to(&code, name),
            None => Ok(false),
        }
    }

    /// Remove every route called `name` from the school open in the admin hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry snapshot cannot be saved.
    pub fn remove_route(&mut self, name: &str) -> Result<bool> {
        match self.admin_school_code() {
            Some(code) => self.remove_route_from(&code, name),
            None => Ok(false),
        }
    }

    /// Add a route to any school by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry snapshot cannot be saved.
    pub fn add_route_to(&mut self, code: &str, name: &str) -> Result<bool> {
        if !self.registry.add_route(code, name) {
            return Ok(false);
        }
        self.persist_registry()?;
        Ok(true)
    }

    /// Remove every route called `name` from a school by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry snapshot cannot be saved.
    pub fn remove_route_from(&mut self, code: &str, name: &str) -> Result<bool> {
        if !self.registry.remove_route(code, name) {
            return Ok(false);
        }
        self.persist_registry()?;
        Ok(true)
    }

    /// Replace the registry with the seed schools and save it.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry snapshot cannot be saved.
    pub fn reset_registry(&mut self) -> Result<()> {
        self.registry = SchoolsRegistry::seed();
        self.persist_registry()
    }

    fn admin_school_code(&self) -> Option<String> {
        if self.screen() != Screen::AdminHub {
            return None;
        }
        self.navigator.state().school_code().map(str::to_string)
    }

    fn persist_registry(&mut self) -> Result<()> {
        self.navigator.refresh_school(&self.registry);
        self.storage
            .save_registry(&self.config.storage.registry_key, &self.registry)
    }
}
