//! AR session gate
//!
//! Decides what the entry button shows and what a click does. The actual
//! session request lives in the platform layer; this only tracks where the
//! request is and what the user should see.

use crate::consts::WEBXR_INFO_URL;

/// What the browser can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrAvailability {
    /// `immersive-ar` sessions are supported
    Supported,
    /// WebXR exists but AR sessions are not supported (or the query failed)
    NotSupported,
    /// No WebXR because the page is not a secure context
    NeedsHttps,
    /// No WebXR at all
    NotAvailable,
}

impl XrAvailability {
    /// Classify from what the page can observe. `ar_supported` is the result of
    /// the session support query, `None` if it failed.
    pub fn detect(has_xr: bool, secure_context: bool, ar_supported: Option<bool>) -> Self {
        if !has_xr {
            return if secure_context {
                XrAvailability::NotAvailable
            } else {
                XrAvailability::NeedsHttps
            };
        }
        match ar_supported {
            Some(true) => XrAvailability::Supported,
            _ => XrAvailability::NotSupported,
        }
    }
}

/// How the entry control should look
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonView {
    /// Support check still running
    Hidden,
    /// Clickable button
    Active { label: &'static str },
    /// Inert button
    Disabled { label: &'static str },
    /// Static link replacing the button
    Link { label: &'static str, href: String },
}

/// Where the AR session is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Requesting,
    Active,
}

/// What a click asks the platform to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCommand {
    RequestSession,
    EndSession,
    Nothing,
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    availability: Option<XrAvailability>,
    phase: SessionPhase,
    intro_visible: bool,
    /// Bumped on every session start and end
    generation: u64,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            availability: None,
            phase: SessionPhase::Idle,
            intro_visible: true,
            generation: 0,
        }
    }

    pub fn availability(&self) -> Option<XrAvailability> {
        self.availability
    }

    pub fn set_availability(&mut self, availability: XrAvailability) {
        log::info!("WebXR availability: {:?}", availability);
        self.availability = Some(availability);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Title and subtitle stay up until the first click
    pub fn intro_visible(&self) -> bool {
        self.intro_visible
    }

    /// Button state; `page_url` is used for the https redirect link
    pub fn view(&self, page_url: &str) -> ButtonView {
        match self.availability {
            None => ButtonView::Hidden,
            Some(XrAvailability::Supported) => match self.phase {
                SessionPhase::Active => ButtonView::Active { label: "Exit AR" },
                SessionPhase::Idle | SessionPhase::Requesting => ButtonView::Active { label: "Enter AR" },
            },
            Some(XrAvailability::NotSupported) => ButtonView::Disabled {
                label: "AR NOT SUPPORTED",
            },
            Some(XrAvailability::NeedsHttps) => ButtonView::Link {
                label: "WEBXR NEEDS HTTPS",
                href: https_url(page_url),
            },
            Some(XrAvailability::NotAvailable) => ButtonView::Link {
                label: "WEBXR NOT AVAILABLE",
                href: WEBXR_INFO_URL.to_string(),
            },
        }
    }

    pub fn click(&mut self) -> GateCommand {
        if self.availability != Some(XrAvailability::Supported) {
            return GateCommand::Nothing;
        }
        self.intro_visible = false;
        match self.phase {
            SessionPhase::Idle => {
                self.phase = SessionPhase::Requesting;
                GateCommand::RequestSession
            }
            SessionPhase::Requesting => GateCommand::Nothing,
            SessionPhase::Active => GateCommand::EndSession,
        }
    }

    pub fn session_started(&mut self) {
        self.phase = SessionPhase::Active;
        self.generation += 1;
    }

    pub fn request_failed(&mut self) {
        self.phase = SessionPhase::Idle;
    }

    pub fn session_ended(&mut self) {
        self.phase = SessionPhase::Idle;
        self.generation += 1;
    }

    /// Token for work scheduled by the running session
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether work tagged with `generation` belongs to the session that is still running
    pub fn is_current(&self, generation: u64) -> bool {
        self.phase == SessionPhase::Active && self.generation == generation
    }
}

/// Same page over https
pub fn https_url(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{}", rest),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(XrAvailability::detect(true, true, Some(true)), XrAvailability::Supported);
        assert_eq!(XrAvailability::detect(true, true, Some(false)), XrAvailability::NotSupported);
        assert_eq!(XrAvailability::detect(true, true, None), XrAvailability::NotSupported);
        assert_eq!(XrAvailability::detect(false, false, None), XrAvailability::NeedsHttps);
        assert_eq!(XrAvailability::detect(false, true, None), XrAvailability::NotAvailable);
    }

    #[test]
    fn test_hidden_until_checked() {
        let gate = SessionGate::new();
        assert_eq!(gate.view("https://x"), ButtonView::Hidden);
    }

    #[test]
    fn test_enter_exit_cycle() {
        let mut gate = SessionGate::new();
        gate.set_availability(XrAvailability::Supported);
        assert_eq!(gate.view(""), ButtonView::Active { label: "Enter AR" });
        assert!(gate.intro_visible());

        assert_eq!(gate.click(), GateCommand::RequestSession);
        assert!(!gate.intro_visible());
        // Double click while the request is pending
        assert_eq!(gate.click(), GateCommand::Nothing);

        gate.session_started();
        assert_eq!(gate.view(""), ButtonView::Active { label: "Exit AR" });
        assert_eq!(gate.click(), GateCommand::EndSession);

        gate.session_ended();
        assert_eq!(gate.phase(), SessionPhase::Idle);
        assert_eq!(gate.view(""), ButtonView::Active { label: "Enter AR" });
    }

    #[test]
    fn test_ended_session_work_is_stale() {
        let mut gate = SessionGate::new();
        gate.set_availability(XrAvailability::Supported);
        assert_eq!(gate.availability(), Some(XrAvailability::Supported));

        gate.click();
        gate.session_started();
        let first = gate.generation();
        assert!(gate.is_current(first));

        gate.click();
        gate.session_ended();
        assert!(!gate.is_current(first));

        // A second session never revives the first one's timers
        gate.click();
        gate.session_started();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(gate.generation()));
    }

    #[test]
    fn test_failed_request_returns_to_idle() {
        let mut gate = SessionGate::new();
        gate.set_availability(XrAvailability::Supported);
        gate.click();
        gate.request_failed();
        assert_eq!(gate.click(), GateCommand::RequestSession);
    }

    #[test]
    fn test_unsupported_views_are_inert() {
        let mut gate = SessionGate::new();
        gate.set_availability(XrAvailability::NotSupported);
        assert_eq!(gate.view(""), ButtonView::Disabled { label: "AR NOT SUPPORTED" });
        assert_eq!(gate.click(), GateCommand::Nothing);
        assert!(gate.intro_visible());

        gate.set_availability(XrAvailability::NeedsHttps);
        assert_eq!(
            gate.view("http://example.com/ar/"),
            ButtonView::Link {
                label: "WEBXR NEEDS HTTPS",
                href: "https://example.com/ar/".to_string()
            }
        );

        gate.set_availability(XrAvailability::NotAvailable);
        assert_eq!(
            gate.view("https://example.com/"),
            ButtonView::Link {
                label: "WEBXR NOT AVAILABLE",
                href: WEBXR_INFO_URL.to_string()
            }
        );
    }

    #[test]
    fn test_https_url() {
        assert_eq!(https_url("http://a.b/c?d"), "https://a.b/c?d");
        assert_eq!(https_url("https://a.b/"), "https://a.b/");
    }
}
