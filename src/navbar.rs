//! Navbar normalization and reserved button injection.

use std::fmt;
use std::sync::Arc;

use crate::engine::PanoramaEngine;

/// Built-in controls shown when the navbar is requested without a layout.
pub const DEFAULT_NAVBAR: [&str; 3] = ["autorotate", "zoom", "fullscreen"];

/// Reserved id of the button that re-arms the little planet transition.
pub const RESET_LITTLE_PLANET_BUTTON_ID: &str = "resetLittlePlanetButton";

/// Reserved id of the button that collapses and restores the navbar.
pub const HIDE_NAVBAR_BUTTON_ID: &str = "hideNavbarButton";

/// Click handler of a custom navbar button, invoked with the live engine.
#[derive(Clone)]
pub struct ButtonAction(Arc<dyn Fn(&mut dyn PanoramaEngine) + Send + Sync>);

impl ButtonAction {
    pub fn new(action: impl Fn(&mut dyn PanoramaEngine) + Send + Sync + 'static) -> Self {
        Self(Arc::new(action))
    }

    pub fn run(&self, engine: &mut dyn PanoramaEngine) { (self.0)(engine) }
}

impl fmt::Debug for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("ButtonAction") }
}

impl PartialEq for ButtonAction {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

/// A navbar button defined by the consumer or injected by the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct NavbarButton {
    pub id:         String,
    pub content:    String,
    pub title:      Option<String>,
    pub class_name: Option<String>,
    pub action:     Option<ButtonAction>,
}

impl NavbarButton {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id:         id.into(),
            content:    content.into(),
            title:      None,
            class_name: None,
            action:     None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_action(mut self, action: ButtonAction) -> Self {
        self.action = Some(action);
        self
    }

    fn reset_little_planet() -> Self {
        Self::new(RESET_LITTLE_PLANET_BUTTON_ID, "🪐")
            .with_title("Reset Little Planet")
            .with_class_name("resetLittlePlanetButton")
    }

    fn hide_navbar() -> Self {
        Self::new(HIDE_NAVBAR_BUTTON_ID, "🙈")
            .with_title("Hide Navbar")
            .with_class_name("hideNavbarButton")
    }
}

/// One navbar entry: a named built-in control or a custom button.
#[derive(Debug, Clone, PartialEq)]
pub enum NavbarItem {
    Builtin(String),
    Custom(NavbarButton),
}

impl NavbarItem {
    pub fn custom_id(&self) -> Option<&str> {
        match self {
            Self::Custom(button) => Some(&button.id),
            Self::Builtin(_) => None,
        }
    }
}

impl From<&str> for NavbarItem {
    fn from(name: &str) -> Self { Self::Builtin(name.to_owned()) }
}

impl From<NavbarButton> for NavbarItem {
    fn from(button: NavbarButton) -> Self { Self::Custom(button) }
}

/// Navbar layout as the consumer may write it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NavbarInput {
    Hidden,
    #[default]
    Default,
    Named(String),
    Explicit(Vec<NavbarItem>),
}

impl From<bool> for NavbarInput {
    fn from(visible: bool) -> Self { if visible { Self::Default } else { Self::Hidden } }
}

impl From<&str> for NavbarInput {
    fn from(name: &str) -> Self { Self::Named(name.to_owned()) }
}

impl From<Vec<NavbarItem>> for NavbarInput {
    fn from(items: Vec<NavbarItem>) -> Self { Self::Explicit(items) }
}

impl From<Navbar> for NavbarInput {
    fn from(navbar: Navbar) -> Self {
        match navbar {
            Navbar::Hidden => Self::Hidden,
            Navbar::Items(items) => Self::Explicit(items),
        }
    }
}

/// Navbar layout as the engine receives it.
#[derive(Debug, Clone, PartialEq)]
pub enum Navbar {
    Hidden,
    Items(Vec<NavbarItem>),
}

impl Navbar {
    pub fn default_items() -> Self {
        Self::Items(DEFAULT_NAVBAR.iter().copied().map(NavbarItem::from).collect())
    }

    pub const fn is_hidden(&self) -> bool { matches!(self, Self::Hidden) }

    pub fn items(&self) -> &[NavbarItem] {
        match self {
            Self::Hidden => &[],
            Self::Items(items) => items,
        }
    }

    pub fn contains_custom(&self, id: &str) -> bool { self.custom_button(id).is_some() }

    pub fn custom_button(&self, id: &str) -> Option<&NavbarButton> {
        self.items().iter().find_map(|item| match item {
            NavbarItem::Custom(button) if button.id == id => Some(button),
            _ => None,
        })
    }
}

/// Normalizes any accepted navbar shape into either `Hidden` or an ordered list.
///
/// Custom buttons sharing an id keep only their first occurrence. Applying this
/// to its own output (via `NavbarInput::from`) returns the same navbar.
pub fn filter_navbar(input: NavbarInput) -> Navbar {
    match input {
        NavbarInput::Hidden => Navbar::Hidden,
        NavbarInput::Default => Navbar::default_items(),
        NavbarInput::Named(name) if name.trim().is_empty() => Navbar::Hidden,
        NavbarInput::Named(name) => Navbar::Items(vec![NavbarItem::Builtin(name)]),
        NavbarInput::Explicit(items) if items.is_empty() => Navbar::Hidden,
        NavbarInput::Explicit(items) => {
            let mut seen: Vec<String> = Vec::new();
            let items = items
                .into_iter()
                .filter(|item| match item.custom_id() {
                    Some(id) if seen.iter().any(|s| s == id) => false,
                    Some(id) => {
                        seen.push(id.to_owned());
                        true
                    },
                    None => true,
                })
                .collect();
            Navbar::Items(items)
        },
    }
}

/// Adds the viewer's own buttons to a visible navbar.
///
/// The little planet reset goes in the second slot, the hide toggle at the end.
/// Neither is added when an entry already uses its reserved id.
pub fn with_reserved_buttons(navbar: Navbar, little_planet: bool, hide_toggle: bool) -> Navbar {
    let Navbar::Items(mut items) = navbar else {
        return Navbar::Hidden;
    };

    let has = |items: &[NavbarItem], id: &str| {
        items.iter().any(|item| item.custom_id() == Some(id))
    };

    if little_planet && !has(&items, RESET_LITTLE_PLANET_BUTTON_ID) {
        let slot = items.len().min(1);
        items.insert(slot, NavbarButton::reset_little_planet().into());
    }
    if hide_toggle && !has(&items, HIDE_NAVBAR_BUTTON_ID) {
        items.push(NavbarButton::hide_navbar().into());
    }

    Navbar::Items(items)
}

/// The navbar shown while collapsed: just the hide toggle.
pub fn collapsed(navbar: &Navbar) -> Navbar {
    navbar
        .custom_button(HIDE_NAVBAR_BUTTON_ID)
        .map_or(Navbar::Hidden, |button| {
            Navbar::Items(vec![NavbarItem::Custom(button.clone())])
        })
}
