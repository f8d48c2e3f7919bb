//! Keybinding registry: maps actions to key events with config overrides.
//!
//! Bindings are looked up per context first, then in `Global`, so a panel can
//! reuse a key for its own purpose (e.g. `j` scrolls in the content panel but
//! moves the selection in the channel list).
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    CycleFocus,
    Back,
    Select,
    Reload,
    EditFilter,
    ClearFilter,
    CommitFilter,
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    ScrollTop,
    ScrollBottom,
    OpenInBrowser,
    DeleteChannel,
    AddChannel,
    CycleTheme,
    ShowHelp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Next channel",
            Self::NavUp => "Previous channel",
            Self::CycleFocus => "Cycle panel focus",
            Self::Back => "Go back / dismiss",
            Self::Select => "Open channel",
            Self::Reload => "Reload page (reconnect)",
            Self::EditFilter => "Edit filter",
            Self::ClearFilter => "Clear filter",
            Self::CommitFilter => "Apply filter now",
            Self::ScrollDown => "Scroll down one line",
            Self::ScrollUp => "Scroll up one line",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::ScrollTop => "Jump to top",
            Self::ScrollBottom => "Jump to bottom (loads more)",
            Self::OpenInBrowser => "Open item link in browser",
            Self::DeleteChannel => "Delete this channel",
            Self::AddChannel => "Add a channel",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Channels,
    Content,
    Filter,
    Broken,
}

impl Context {
    /// Section title on the help screen.
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Channels => "Channel list",
            Self::Content => "Content",
            Self::Filter => "Filter input",
            Self::Broken => "Broken channel",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "Home", "End", "PageUp"
/// - Modifier combos: "Ctrl+d", "Ctrl+u"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let rest = rest.trim();
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "home" => return Some(KeySpec::plain(KeyCode::Home)),
        "end" => return Some(KeySpec::plain(KeyCode::End)),
        "pageup" => return Some(KeySpec::plain(KeyCode::PageUp)),
        "pagedown" => return Some(KeySpec::plain(KeyCode::PageDown)),
        "backspace" => return Some(KeySpec::plain(KeyCode::Backspace)),
        "space" => return Some(KeySpec::plain(KeyCode::Char(' '))),
        _ => {}
    }

    if let Some(n) = s
        .strip_prefix('F')
        .or_else(|| s.strip_prefix('f'))
        .and_then(|rest| rest.parse::<u8>().ok())
    {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::plain(KeyCode::Char(c))),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
pub struct KeybindingRegistry {
    /// Primary lookup: (Context, KeySpec) -> Action
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the help screen
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::*;
        use KeyCode::*;

        // === Global ===
        self.bind(Global, KeySpec::plain(Char('q')), Action::Quit);
        self.bind(Global, KeySpec::ctrl('c'), Action::Quit);
        self.bind(Global, KeySpec::plain(Tab), Action::CycleFocus);
        self.bind(Global, KeySpec::plain(Esc), Action::Back);
        self.bind(Global, KeySpec::plain(Char('r')), Action::Reload);
        self.bind(Global, KeySpec::plain(Char('/')), Action::EditFilter);
        self.bind(Global, KeySpec::plain(Char('a')), Action::AddChannel);
        self.bind(Global, KeySpec::plain(Char('T')), Action::CycleTheme);
        self.bind(Global, KeySpec::plain(Char('?')), Action::ShowHelp);

        // === Channel list ===
        self.bind(Channels, KeySpec::plain(Char('j')), Action::NavDown);
        self.bind(Channels, KeySpec::plain(Down), Action::NavDown);
        self.bind(Channels, KeySpec::plain(Char('k')), Action::NavUp);
        self.bind(Channels, KeySpec::plain(Up), Action::NavUp);
        self.bind(Channels, KeySpec::plain(Enter), Action::Select);

        // === Content ===
        self.bind(Content, KeySpec::plain(Char('j')), Action::ScrollDown);
        self.bind(Content, KeySpec::plain(Down), Action::ScrollDown);
        self.bind(Content, KeySpec::plain(Char('k')), Action::ScrollUp);
        self.bind(Content, KeySpec::plain(Up), Action::ScrollUp);
        self.bind(Content, KeySpec::ctrl('d'), Action::PageDown);
        self.bind(Content, KeySpec::plain(PageDown), Action::PageDown);
        self.bind(Content, KeySpec::plain(Char(' ')), Action::PageDown);
        self.bind(Content, KeySpec::ctrl('u'), Action::PageUp);
        self.bind(Content, KeySpec::plain(PageUp), Action::PageUp);
        self.bind(Content, KeySpec::plain(Char('g')), Action::ScrollTop);
        self.bind(Content, KeySpec::plain(Home), Action::ScrollTop);
        self.bind(Content, KeySpec::plain(Char('G')), Action::ScrollBottom);
        self.bind(Content, KeySpec::plain(End), Action::ScrollBottom);
        self.bind(Content, KeySpec::plain(Char('o')), Action::OpenInBrowser);
        self.bind(Content, KeySpec::plain(Char('x')), Action::ClearFilter);

        // === Filter input (printable keys go to the input itself) ===
        self.bind(Filter, KeySpec::plain(Esc), Action::Back);
        self.bind(Filter, KeySpec::plain(Enter), Action::CommitFilter);
        self.bind(Filter, KeySpec::ctrl('u'), Action::ClearFilter);

        // === Broken channel fallback ===
        self.bind(Broken, KeySpec::plain(Char('d')), Action::DeleteChannel);
        self.bind(Broken, KeySpec::plain(Enter), Action::DeleteChannel);
    }

    /// Apply user overrides from config.
    ///
    /// Keys in the map are action names (e.g., "quit", "scroll_down").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();
        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            // Rebind in every context the action was bound in, then drop the old keys.
            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, a) in &self.bindings {
                if *a == action && !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }
            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }
            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }
        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// Tries the specific context first, then falls back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);
        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        if context != Context::Global {
            if let Some(&action) = self.lookup.get(&(Context::Global, key)) {
                return Some(action);
            }
        }
        None
    }

    /// Look up the action in one context only, without the Global fallback.
    pub fn action_in_context(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        self.lookup
            .get(&(context, KeySpec::new(code, modifiers)))
            .copied()
    }

    /// All bindings for the help screen: (context, key display, action, description).
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "navdown" | "down" => Some(Action::NavDown),
        "nav_up" | "navup" | "up" => Some(Action::NavUp),
        "cycle_focus" | "cyclefocus" | "tab" => Some(Action::CycleFocus),
        "back" => Some(Action::Back),
        "select" | "enter" => Some(Action::Select),
        "reload" | "refresh" => Some(Action::Reload),
        "edit_filter" | "editfilter" | "filter" => Some(Action::EditFilter),
        "clear_filter" | "clearfilter" => Some(Action::ClearFilter),
        "commit_filter" | "commitfilter" => Some(Action::CommitFilter),
        "scroll_down" | "scrolldown" => Some(Action::ScrollDown),
        "scroll_up" | "scrollup" => Some(Action::ScrollUp),
        "page_down" | "pagedown" => Some(Action::PageDown),
        "page_up" | "pageup" => Some(Action::PageUp),
        "scroll_top" | "scrolltop" | "top" => Some(Action::ScrollTop),
        "scroll_bottom" | "scrollbottom" | "bottom" => Some(Action::ScrollBottom),
        "open_in_browser" | "openinbrowser" | "open" => Some(Action::OpenInBrowser),
        "delete_channel" | "deletechannel" | "delete" => Some(Action::DeleteChannel),
        "add_channel" | "addchannel" | "add" => Some(Action::AddChannel),
        "cycle_theme" | "cycletheme" | "theme" => Some(Action::CycleTheme),
        "show_help" | "showhelp" | "help" => Some(Action::ShowHelp),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_quit() {
        let reg = KeybindingRegistry::new();
        let action = reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Global);
        assert_eq!(action, Some(Action::Quit));
    }

    #[test]
    fn test_same_key_differs_by_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('j'), KeyModifiers::NONE, Context::Channels),
            Some(Action::NavDown)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('j'), KeyModifiers::NONE, Context::Content),
            Some(Action::ScrollDown)
        );
    }

    #[test]
    fn test_context_falls_back_to_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('r'), KeyModifiers::NONE, Context::Broken),
            Some(Action::Reload)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('?'), KeyModifiers::NONE, Context::Content),
            Some(Action::ShowHelp)
        );
    }

    #[test]
    fn test_action_in_context_skips_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_in_context(KeyCode::Char('q'), KeyModifiers::NONE, Context::Filter),
            None
        );
        assert_eq!(
            reg.action_in_context(KeyCode::Enter, KeyModifiers::NONE, Context::Filter),
            Some(Action::CommitFilter)
        );
    }

    #[test]
    fn test_delete_only_in_broken_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('d'), KeyModifiers::NONE, Context::Broken),
            Some(Action::DeleteChannel)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('d'), KeyModifiers::NONE, Context::Content),
            None
        );
    }

    #[test]
    fn test_add_channel_reachable_from_every_panel() {
        let reg = KeybindingRegistry::new();
        for ctx in [Context::Channels, Context::Content, Context::Broken] {
            assert_eq!(
                reg.action_for_key(KeyCode::Char('a'), KeyModifiers::NONE, ctx),
                Some(Action::AddChannel)
            );
        }
        assert_eq!(parse_action_name("add_channel"), Some(Action::AddChannel));
    }

    #[test]
    fn test_ctrl_modifiers() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('d'), KeyModifiers::CONTROL, Context::Content),
            Some(Action::PageDown)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL, Context::Filter),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_apply_overrides_valid() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("reload".to_string(), "F5".to_string());
        let warnings = reg.apply_overrides(&overrides);
        assert!(warnings.is_empty());

        assert_eq!(
            reg.action_for_key(KeyCode::Char('r'), KeyModifiers::NONE, Context::Global),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::F(5), KeyModifiers::NONE, Context::Global),
            Some(Action::Reload)
        );
    }

    #[test]
    fn test_apply_overrides_keeps_context() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("scroll_down".to_string(), "n".to_string());
        reg.apply_overrides(&overrides);

        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::NONE, Context::Content),
            Some(Action::ScrollDown)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::NONE, Context::Global),
            None
        );
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("nonexistent_action".to_string(), "q".to_string());
        overrides.insert("quit".to_string(), "Ctrl+".to_string());
        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 2);
        // Failed override leaves the default in place.
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Global),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("q"), Some(KeySpec::plain(KeyCode::Char('q'))));
        assert_eq!(parse_key_string("Ctrl+d"), Some(KeySpec::ctrl('d')));
        assert_eq!(parse_key_string("end"), Some(KeySpec::plain(KeyCode::End)));
        assert_eq!(parse_key_string("F12"), Some(KeySpec::plain(KeyCode::F(12))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("ü"), Some(KeySpec::plain(KeyCode::Char('ü'))));
        assert_eq!(parse_key_string("nope"), None);
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key(&KeySpec::ctrl('u')), "Ctrl+u");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::Char(' '))), "Space");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::F(5))), "F5");
    }

    #[test]
    fn test_all_bindings_cover_every_context() {
        let reg = KeybindingRegistry::new();
        let bindings = reg.all_bindings();
        for ctx in [
            Context::Global,
            Context::Channels,
            Context::Content,
            Context::Filter,
            Context::Broken,
        ] {
            assert!(bindings.iter().any(|(c, ..)| *c == ctx), "{ctx:?} empty");
        }
    }
}
