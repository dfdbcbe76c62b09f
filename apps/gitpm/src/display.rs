//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use gitpm_tracker::{Completion, PackageRecord};
use gitpm_types::{ColorChoice, InstallStatus, OperationKind};
use serde::Serialize;
use std::io;

/// Result of a command, ready to render
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    /// Every catalog package with its status
    Packages { packages: Vec<PackageRecord> },
    /// A request completed
    Completed {
        package: PackageRecord,
        completion: Completion,
    },
    /// Nothing to do; the package is already in the requested state
    Unchanged { package: PackageRecord },
    /// Where a package is installed from
    Source { package: PackageRecord },
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &CommandResult) -> io::Result<()> {
        let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &CommandResult) -> io::Result<()> {
        match result {
            CommandResult::Packages { packages } => self.render_package_list(packages),
            CommandResult::Completed {
                package,
                completion,
            } => self.render_completion(package, completion),
            CommandResult::Unchanged { package } => {
                let state = match package.status() {
                    InstallStatus::Installed => "already installed",
                    _ => "not installed",
                };
                self.term
                    .write_line(&format!("{} is {state}.", self.bold(package.display_name())))
            }
            CommandResult::Source { package } => self.term.write_line(package.source_uri()),
        }
    }

    /// Render the catalog with statuses
    fn render_package_list(&self, packages: &[PackageRecord]) -> io::Result<()> {
        if packages.is_empty() {
            return self.term.write_line(
                "No packages in the catalog. Add [[packages]] to the config or set project.catalog_dir.",
            );
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Id").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

        for package in packages {
            table.add_row(vec![
                Cell::new(package.display_name()),
                Cell::new(package.package_id()),
                self.format_status(package.status()),
            ]);
        }

        self.term.write_line(&table.to_string())?;

        let installed = packages
            .iter()
            .filter(|package| package.status() == InstallStatus::Installed)
            .count();
        self.term.write_line(&format!(
            "{installed} of {} packages installed",
            packages.len()
        ))
    }

    fn render_completion(&self, package: &PackageRecord, completion: &Completion) -> io::Result<()> {
        let verb = match completion.kind {
            OperationKind::Add => "Installed",
            OperationKind::Remove => "Uninstalled",
            OperationKind::List => "Listed",
        };
        let line = format!(
            "{verb} {} ({})",
            self.bold(package.display_name()),
            package.package_id()
        );
        self.term.write_line(&self.styled(&line, Style::new().green()))
    }

    fn format_status(&self, status: InstallStatus) -> Cell {
        let cell = Cell::new(status.to_string());
        if !self.supports_color() {
            return cell;
        }
        match status {
            InstallStatus::Installed => cell.fg(Color::Green),
            InstallStatus::CurrentlyInstalling => cell.fg(Color::Yellow),
            InstallStatus::NotInstalled => cell.fg(Color::DarkGrey),
        }
    }

    fn bold(&self, text: &str) -> String {
        self.styled(text, Style::new().bold())
    }

    fn styled(&self, text: &str, style: Style) -> String {
        if self.supports_color() {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}
