//! Text presentation layer.
//!
//! Renders whichever screen the controller selects. Nothing here changes
//! state.

use crate::chat;
use crate::controller::Controller;
use crate::navigation::{Role, Screen, Tab, ViewState};
use crate::theme::Theme;

/// Shown in place of the map until the first position arrives.
pub const MAP_PLACEHOLDER: &str = "📍 Connecting Satellite...";

/// Shown while the SOS flag is up.
pub const SOS_BANNER: &str = "⚠️ EMERGENCY SIGNAL SENT";

/// Render the active screen.
#[must_use]
pub fn render(app: &Controller, theme: &Theme) -> String {
    let state = app.view_state();
    let mut lines = match state.screen() {
        Screen::RoleSelect => role_select(theme),
        Screen::Login => login(&state),
        Screen::AdminHub => admin_hub(&state),
        Screen::RouteSelect => route_select(&state),
        Screen::Tracker(tab) => tracker(app, &state, tab),
    };
    if state.sos_active {
        lines.push(String::new());
        lines.push(SOS_BANNER.to_string());
    }
    lines.join("\n")
}

fn role_select(theme: &Theme) -> Vec<String> {
    vec![
        format!("==== {} ====", theme.title),
        theme.tagline.clone(),
        format!("accent {}", theme.accent),
        String::new(),
        "  role driver   🧢 Teacher / Driver".to_string(),
        "  role parent   🏠 Parent".to_string(),
        "  role admin    🏢 School Admin".to_string(),
    ]
}

fn login(state: &ViewState) -> Vec<String> {
    let mut lines = vec![
        "← back".to_string(),
        "🏫 School Login".to_string(),
        "Enter your school access code.  (code SEL999)".to_string(),
    ];
    if let Some(error) = &state.code_error {
        lines.push(format!("⚠️ {error}"));
    }
    lines
}

fn school_heading(state: &ViewState) -> String {
    match &state.selected_school {
        Some(school) => format!(
            "{} {} [{}]",
            school.logo,
            school.name,
            school.code.as_deref().unwrap_or("?")
        ),
        None => String::new(),
    }
}

fn numbered_routes(state: &ViewState) -> Vec<String> {
    let Some(school) = &state.selected_school else {
        return Vec::new();
    };
    if school.routes.is_empty() {
        return vec!["  (no routes)".to_string()];
    }
    school
        .routes
        .iter()
        .enumerate()
        .map(|(i, route)| format!("  {}. {route}", i + 1))
        .collect()
}

fn admin_hub(state: &ViewState) -> Vec<String> {
    let mut lines = vec![
        "← back".to_string(),
        school_heading(state),
        "Route Management".to_string(),
    ];
    lines.extend(numbered_routes(state));
    lines.push("add-route <name> | remove-route <name>".to_string());
    lines
}

fn route_select(state: &ViewState) -> Vec<String> {
    let mut lines = vec![
        "← back".to_string(),
        school_heading(state),
        "Select Route".to_string(),
    ];
    lines.extend(numbered_routes(state));
    lines
}

fn tracker(app: &Controller, state: &ViewState, tab: Tab) -> Vec<String> {
    let role = state.role.unwrap_or(Role::Parent);
    let title = match tab {
        Tab::Chat => "Comm. Channel".to_string(),
        Tab::Map => state
            .route
            .clone()
            .unwrap_or_else(|| "Select Route".to_string()),
    };
    let dot = if state.live { "●" } else { "○" };
    let badge = if role == Role::Driver {
        "[SOS]".to_string()
    } else {
        format!("ETA: {}", if state.live { "12 min" } else { "--" })
    };
    let school = state
        .selected_school
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or_default();

    let mut lines = vec![format!("{dot} {title}  {badge}"), format!("  {school}")];
    lines.push(String::new());
    match tab {
        Tab::Map => lines.extend(map_panel(app, state, role)),
        Tab::Chat => lines.extend(chat_panel(app, role)),
    }
    lines.push(String::new());
    lines.push(tab_bar(tab));
    lines
}

fn map_panel(app: &Controller, state: &ViewState, role: Role) -> Vec<String> {
    let mut lines = vec![match app.location() {
        Some(position) => format!("🚌 Bus at {position}"),
        None => MAP_PLACEHOLDER.to_string(),
    }];
    if role == Role::Driver {
        lines.push(if state.live {
            "🛑 Stop Shift  (stop)".to_string()
        } else {
            "🚀 Start Shift  (start)".to_string()
        });
    } else {
        lines.push(format!(
            "🧒 Emily Boarding [{}]  (status)",
            state.boarding
        ));
    }
    lines
}

fn chat_panel(app: &Controller, role: Role) -> Vec<String> {
    let mut lines: Vec<String> = app
        .messages()
        .messages()
        .iter()
        .map(|msg| {
            let side = if chat::is_mine(msg, role) { ">>" } else { "<<" };
            let sender = if msg.is_broadcast {
                "📢 Announcement"
            } else {
                msg.sender.as_str()
            };
            format!("{side} {sender}: {}  ({})", msg.text, msg.time)
        })
        .collect();
    lines.push(String::new());
    for (i, reply) in chat::quick_replies(role).iter().enumerate() {
        lines.push(format!("  quick {i}: {reply}"));
    }
    lines
}

fn tab_bar(active: Tab) -> String {
    let mark = |tab: Tab, label: &str| {
        if tab == active {
            format!("[{label}]")
        } else {
            label.to_string()
        }
    };
    format!(
        "{} | {} | 🔄 Switch",
        mark(Tab::Map, "📍 Map"),
        mark(Tab::Chat, "💬 Chat")
    )
}
