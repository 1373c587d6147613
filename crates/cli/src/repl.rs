//! Interactive dashboard REPL.

use crate::render::{print_options, print_summary, print_view};
use crate::{export, write_chart, OutputFormat};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::sync::Arc;
use ventas_core::session::EXPORT_FILE_NAME;
use ventas_core::{Choice, ColumnMapping, Dimension, Metric, Role, Session};
use ventas_sheet::Sheet;

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Choose a region; `None` lists the options
    Region(Option<Choice>),
    /// Choose a salesperson; `None` lists the options
    Vendedor(Option<Choice>),
    /// Group one chart, or all charts when no chart is named
    Group(Option<Metric>, Dimension),
    Detail(Option<String>),
    Map(Role, String),
    Fecha(bool),
    Clear,
    Show,
    Options,
    Columns,
    Export(PathBuf),
    Chart(PathBuf),
    Help,
    Quit,
}

fn choice(arg: &str) -> Choice {
    if arg.eq_ignore_ascii_case("all") || arg == "*" {
        Choice::All
    } else {
        Choice::value(arg)
    }
}

/// Parse a `:command [args]` line.
pub fn parse_command(line: &str) -> Result<Command> {
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let arg = rest.trim();

    let command = match name {
        ":region" | ":r" => Command::Region((!arg.is_empty()).then(|| choice(arg))),
        ":vendedor" | ":v" => Command::Vendedor((!arg.is_empty()).then(|| choice(arg))),
        ":group" | ":g" => match arg.split_whitespace().collect::<Vec<_>>().as_slice() {
            [dimension] => Command::Group(None, dimension.parse()?),
            [metric, dimension] => Command::Group(Some(metric.parse()?), dimension.parse()?),
            _ => bail!("Usage: :group [unidades|ventas|pct] region|vendedor"),
        },
        ":detail" | ":d" => Command::Detail((!arg.is_empty()).then(|| arg.to_string())),
        ":map" | ":m" => {
            let (role, column) = arg
                .split_once('=')
                .or_else(|| arg.split_once(char::is_whitespace))
                .context("Usage: :map ROLE COLUMN")?;
            Command::Map(role.parse()?, column.trim().to_string())
        }
        ":fecha" => match arg.to_lowercase().as_str() {
            "on" | "si" | "sí" | "yes" | "true" => Command::Fecha(true),
            "off" | "no" | "false" => Command::Fecha(false),
            _ => bail!("Usage: :fecha on|off"),
        },
        ":clear" => Command::Clear,
        ":show" | ":s" => Command::Show,
        ":options" | ":o" => Command::Options,
        ":columns" | ":c" => Command::Columns,
        ":export" | ":e" => Command::Export(PathBuf::from(if arg.is_empty() {
            EXPORT_FILE_NAME
        } else {
            arg
        })),
        ":chart" => {
            if arg.is_empty() {
                bail!("Usage: :chart PATH");
            }
            Command::Chart(PathBuf::from(arg))
        }
        ":help" | ":h" | ":?" => Command::Help,
        ":quit" | ":q" | ":exit" => Command::Quit,
        _ => bail!("Unknown command: {line}"),
    };
    Ok(command)
}

/// REPL state: the raw table, the mapping being edited and the session once
/// the mapping is complete.
pub struct Dashboard {
    raw: Arc<Sheet>,
    mapping: ColumnMapping,
    session: Option<Session>,
    format: OutputFormat,
}

impl Dashboard {
    pub fn new(raw: Arc<Sheet>, mapping: ColumnMapping, format: OutputFormat) -> Self {
        Self {
            raw,
            mapping,
            session: None,
            format,
        }
    }

    /// Try to open the session with the current mapping.
    pub fn reopen(&mut self) -> Result<()> {
        if let Some(session) = self.session.as_mut() {
            session.remap(self.mapping.clone())?;
        } else {
            self.session = Some(Session::open(Arc::clone(&self.raw), self.mapping.clone())?);
        }
        Ok(())
    }

    fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .context("Column mapping incomplete; fix it with :map ROLE COLUMN")
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .context("Column mapping incomplete; fix it with :map ROLE COLUMN")
    }

    /// Run one command; returns `false` when the REPL should stop.
    pub fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Quit => return Ok(false),
            Command::Help => print_help(),
            Command::Region(None) => print_options("Regions", &self.session()?.region_options()?),
            Command::Region(Some(region)) => {
                self.session_mut()?.set_region(region)?;
                self.print_summary()?;
            }
            Command::Vendedor(None) => {
                print_options("Salespeople", &self.session()?.vendedor_options()?);
            }
            Command::Vendedor(Some(vendedor)) => {
                self.session_mut()?.set_vendedor(vendedor)?;
                self.print_summary()?;
            }
            Command::Group(metric, dimension) => {
                let session = self.session_mut()?;
                match metric {
                    Some(metric) => session.set_grouping(metric, dimension),
                    None => {
                        for metric in Metric::ALL {
                            session.set_grouping(metric, dimension);
                        }
                    }
                }
                self.show()?;
            }
            Command::Detail(vendedor) => {
                self.session_mut()?.set_detail(vendedor)?;
                self.show()?;
            }
            Command::Map(role, column) => {
                self.mapping.set(role, column);
                self.remap()?;
            }
            Command::Fecha(use_fecha) => {
                self.mapping.set_use_fecha(use_fecha);
                self.remap()?;
            }
            Command::Clear => {
                let session = self.session_mut()?;
                session.set_region(Choice::All)?;
                session.set_vendedor(Choice::All)?;
                self.print_summary()?;
            }
            Command::Show => self.show()?,
            Command::Options => {
                let session = self.session()?;
                print_options("Regions", &session.region_options()?);
                print_options("Salespeople", &session.vendedor_options()?);
                print_options("Detail", &session.detail_options()?);
            }
            Command::Columns => self.print_columns(),
            Command::Export(path) => {
                export(self.session()?, &path)?;
            }
            Command::Chart(path) => write_chart(&self.session()?.view()?, &path)?,
        }
        Ok(true)
    }

    fn remap(&mut self) -> Result<()> {
        self.reopen()?;
        println!("{}", "Mapping applied".green());
        self.print_summary()
    }

    fn show(&self) -> Result<()> {
        print_view(&self.session()?.view()?, self.format)
    }

    fn print_summary(&self) -> Result<()> {
        print_summary(&self.session()?.view()?.summary);
        Ok(())
    }

    fn print_columns(&self) {
        println!("{}", "Columns:".cyan().bold());
        for column in self.raw.text_column_names() {
            let roles: Vec<String> = self
                .mapping
                .assignments()
                .filter(|(_, mapped)| *mapped == column)
                .map(|(role, _)| role.to_string())
                .collect();
            if roles.is_empty() {
                println!("  {column}");
            } else {
                println!("  {column} -> {}", roles.join(", ").green());
            }
        }
        let fecha = if self.mapping.use_fecha() { "on" } else { "off" };
        println!("  fecha: {fecha}");
    }
}

/// Run the REPL.
pub fn run(raw: Arc<Sheet>, mapping: ColumnMapping, format: OutputFormat) -> Result<()> {
    println!(
        "{} {} - Interactive Mode",
        "ventas".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "Type {} for help, {} to exit\n",
        ":help".yellow(),
        ":quit".yellow()
    );

    let mut dashboard = Dashboard::new(raw, mapping, format);
    match dashboard.reopen() {
        Ok(()) => dashboard.print_summary()?,
        Err(e) => {
            println!("{} {e}", "Error:".red().bold());
            dashboard.print_columns();
        }
    }

    let mut rl = DefaultEditor::new()?;
    let history_path = dirs_history_path();

    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = "ventas> ".green().bold().to_string();

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match parse_command(line).and_then(|command| dashboard.execute(command)) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("{} {e:#}", "Error:".red().bold()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                println!("{} {e}", "Error:".red().bold());
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

/// Get the history file path.
fn dirs_history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|mut p| {
        p.push("ventas");
        let _ = std::fs::create_dir_all(&p);
        p.push("history.txt");
        p
    })
}

/// Print REPL help.
fn print_help() {
    println!("{}", "ventas REPL Commands:".cyan().bold());
    println!("  {}      Filter by region (no NAME lists them)", ":region [NAME|all]".yellow());
    println!("  {}    Filter by salesperson", ":vendedor [NAME|all]".yellow());
    println!("  {} Group charts by region or vendedor", ":group [CHART] DIMENSION".yellow());
    println!("  {}          Salesperson to detail", ":detail [NAME]".yellow());
    println!("  {}       Map a role to a column", ":map ROLE COLUMN".yellow());
    println!("  {}           Toggle the date column", ":fecha on|off".yellow());
    println!("  {}                  Reset the filters", ":clear".yellow());
    println!("  {}                   Show the full dashboard", ":show".yellow());
    println!("  {}                Show filter and detail options", ":options".yellow());
    println!("  {}                Show columns and mapping", ":columns".yellow());
    println!("  {}          Export the filtered table", ":export [PATH]".yellow());
    println!("  {}            Write the charts as HTML", ":chart PATH".yellow());
    println!("  {}          Show this help", ":help, :h, :?".yellow());
    println!("  {}       Exit the REPL", ":quit, :q, :exit".yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use ventas_core::KeywordTable;

    fn raw() -> Arc<Sheet> {
        Arc::new(Sheet::from_data(vec![
            vec!["Zona", "Nombre", "Unidades", "Total $"],
            vec!["North", "Ana", "10", "100"],
            vec!["North", "Beto", "5", "50"],
            vec!["South", "Ana", "2", "20"],
        ]))
    }

    #[test]
    fn test_parse_filter_commands() {
        assert_eq!(parse_command(":region").unwrap(), Command::Region(None));
        assert_eq!(
            parse_command(":region North").unwrap(),
            Command::Region(Some(Choice::value("North")))
        );
        assert_eq!(
            parse_command(":vendedor all").unwrap(),
            Command::Vendedor(Some(Choice::All))
        );
        assert_eq!(
            parse_command(":vendedor Ana María").unwrap(),
            Command::Vendedor(Some(Choice::value("Ana María")))
        );
    }

    #[test]
    fn test_parse_group_command() {
        assert_eq!(
            parse_command(":group vendedor").unwrap(),
            Command::Group(None, Dimension::Vendedor)
        );
        assert_eq!(
            parse_command(":group pct region").unwrap(),
            Command::Group(Some(Metric::PctVentas), Dimension::Region)
        );
        assert!(parse_command(":group").is_err());
        assert!(parse_command(":group ventas").is_err());
    }

    #[test]
    fn test_parse_map_command() {
        assert_eq!(
            parse_command(":map ventas Total $").unwrap(),
            Command::Map(Role::Ventas, "Total $".to_string())
        );
        assert_eq!(
            parse_command(":map region=Zona").unwrap(),
            Command::Map(Role::Region, "Zona".to_string())
        );
        assert!(parse_command(":map ventas").is_err());
    }

    #[test]
    fn test_parse_misc_commands() {
        assert_eq!(parse_command(":fecha off").unwrap(), Command::Fecha(false));
        assert_eq!(
            parse_command(":export").unwrap(),
            Command::Export(PathBuf::from("ventas_filtrado.csv"))
        );
        assert_eq!(parse_command(":q").unwrap(), Command::Quit);
        assert!(parse_command(":chart").is_err());
        assert!(parse_command(":nope").is_err());
    }

    #[test]
    fn test_pending_mapping_then_fix() {
        let raw = raw();
        let mapping = ColumnMapping::guess(&KeywordTable::default(), &raw);
        let mut dashboard = Dashboard::new(raw, mapping, OutputFormat::Table);

        assert!(dashboard.reopen().is_err());
        assert!(dashboard.execute(Command::Show).is_err());

        dashboard
            .execute(Command::Map(Role::Ventas, "Total $".to_string()))
            .unwrap();
        dashboard
            .execute(Command::Region(Some(Choice::value("South"))))
            .unwrap();
        let view = dashboard.session().unwrap().view().unwrap();
        assert_eq!(view.summary.ventas, 20.0);
    }

    #[test]
    fn test_region_change_resets_vendedor() {
        let raw = raw();
        let mut mapping = ColumnMapping::guess(&KeywordTable::default(), &raw);
        mapping.set(Role::Ventas, "Total $");
        let mut dashboard = Dashboard::new(raw, mapping, OutputFormat::Json);
        dashboard.reopen().unwrap();

        dashboard
            .execute(Command::Vendedor(Some(Choice::value("Beto"))))
            .unwrap();
        dashboard
            .execute(Command::Region(Some(Choice::value("South"))))
            .unwrap();
        assert_eq!(
            dashboard.session().unwrap().selection().vendedor,
            Choice::All
        );

        dashboard.execute(Command::Clear).unwrap();
        assert_eq!(dashboard.session().unwrap().selection().region, Choice::All);
        assert!(!dashboard.execute(Command::Quit).unwrap());
    }
}
