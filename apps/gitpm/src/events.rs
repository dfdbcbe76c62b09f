//! Event handling and status display

use console::{style, Term};
use gitpm_events::{AppEvent, EventLevel, EventMessage, FailureContext, GeneralEvent, PackageEvent};

/// Renders tracker events as status lines on stderr
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Suppress all output (JSON mode)
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        if self.quiet {
            return;
        }
        if message.meta.level == EventLevel::Debug && !self.debug_enabled {
            return;
        }

        match message.event {
            AppEvent::General(event) => self.handle_general(event, message.meta.source.as_str()),
            AppEvent::Package(event) => self.handle_package(event),
        }
    }

    fn handle_general(&self, event: GeneralEvent, source: &str) {
        match event {
            GeneralEvent::Warning { message, context } => {
                let line = match context {
                    Some(context) => format!("{message} ({context})"),
                    None => message,
                };
                self.show_warning(&line);
            }
            GeneralEvent::Error { message, details } => {
                self.show_error(&message);
                if let Some(details) = details {
                    self.show_status(&format!("  {details}"));
                }
            }
            GeneralEvent::DebugLog { message, .. } => {
                self.show_status(&format!("debug[{source}]: {message}"));
            }
        }
    }

    fn handle_package(&self, event: PackageEvent) {
        match event {
            PackageEvent::InstallRequested { package, source_uri } => {
                self.show_status(&format!("Installing {package} from {source_uri}"));
            }
            PackageEvent::InstallCompleted { display_name, .. } => {
                self.show_success(&format!("Installed {display_name}"));
            }
            PackageEvent::InstallFailed {
                package, failure, ..
            } => self.show_failure(&format!("Install of {package} failed"), &failure),
            PackageEvent::UninstallRequested { package } => {
                self.show_status(&format!("Uninstalling {package}"));
            }
            PackageEvent::UninstallCompleted { display_name, .. } => {
                self.show_success(&format!("Uninstalled {display_name}"));
            }
            PackageEvent::UninstallFailed {
                package, failure, ..
            } => self.show_failure(&format!("Uninstall of {package} failed"), &failure),
            PackageEvent::ListStarting => {
                if self.debug_enabled {
                    self.show_status("Checking installed packages");
                }
            }
            PackageEvent::ListCompleted { installed, matched } => {
                if self.debug_enabled {
                    self.show_status(&format!(
                        "{installed} packages installed, {matched} from the catalog"
                    ));
                }
            }
            PackageEvent::ListFailed { failure } => {
                self.show_failure("Checking installed packages failed", &failure);
            }
            PackageEvent::StatusChanged { package, from, to } => {
                if self.debug_enabled {
                    self.show_status(&format!("{package}: {from} -> {to}"));
                }
            }
        }
    }

    fn show_failure(&self, headline: &str, failure: &FailureContext) {
        self.show_error(&format!("{headline}: {}", failure.message));
        if let Some(code) = &failure.code {
            self.show_status(&format!("  Code: {code}"));
        }
        if let Some(hint) = &failure.hint {
            self.show_status(&format!("  Hint: {hint}"));
        }
    }

    fn show_status(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    fn show_success(&self, message: &str) {
        if self.colors_enabled {
            let _ = self
                .term
                .write_line(&style(message).green().force_styling(true).to_string());
        } else {
            self.show_status(message);
        }
    }

    fn show_warning(&self, message: &str) {
        if self.colors_enabled {
            let _ = self.term.write_line(
                &style(format!("warning: {message}"))
                    .yellow()
                    .force_styling(true)
                    .to_string(),
            );
        } else {
            self.show_status(&format!("warning: {message}"));
        }
    }

    fn show_error(&self, message: &str) {
        if self.colors_enabled {
            let _ = self.term.write_line(
                &style(format!("error: {message}"))
                    .red()
                    .bold()
                    .force_styling(true)
                    .to_string(),
            );
        } else {
            self.show_status(&format!("error: {message}"));
        }
    }
}
