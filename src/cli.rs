// File: ./src/cli.rs
//! Shared command-line logic: help text, logging setup and the plain-text
//! rendering of the section tree.
use crate::context::AppContext;
use crate::controller::AppState;
use crate::form::FieldKind;
use crate::section::SectionState;
use anyhow::{Context, Result};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fmt::Write;
use std::fs::OpenOptions;

pub fn print_help(binary_name: &str) {
    println!(
        "Cmsprobe v{} - Interactive test harness for a CMS REST API",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] [--local] [-v]", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -l, --local           Run against an in-memory mockup instead of the API.");
    println!("    -v, --verbose         Log info messages to the terminal.");
    println!("    -h, --help            Show this help message.");
    println!();
    print_commands();
}

pub fn print_commands() {
    println!("COMMANDS:");
    println!("    show                              Print the section tree");
    println!("    toggle <kind>                     Show/hide a section");
    println!("    act <kind> <new|reset|edit|delete|regenerate|contact>");
    println!("    set <kind> <fieldset> <field>=<value> [<field>=<value> ...]");
    println!("    focus <kind> <fieldset>           Clear a fieldset's feedback");
    println!("    submit <kind> <fieldset>          Submit one fieldset");
    println!("    browse <YYYY-MM-DD>               Move the date picker without picking");
    println!("    pick <YYYY-MM-DD>                 Pick a day on the date picker");
    println!("    greet                             Rotate the greeting");
    println!("    refresh                           Re-read every endpoint");
    println!("    help | quit");
    println!();
    println!("KINDS:");
    println!("    event, person, page, survey");
}

/// Terminal logger for warnings (info with `verbose`), plus a file log in
/// the data directory when one is available.
pub fn init_logging(ctx: &dyn AppContext, verbose: bool) -> Result<()> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("cmsprobe")
        .build();
    let term_level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = ctx.get_log_path() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
    }

    CombinedLogger::init(loggers).context("Logger already initialized")?;
    Ok(())
}

fn render_section(out: &mut String, section: &SectionState) {
    let _ = writeln!(out, "== {} [{}]", section.kind.title(), section.toggle_label());
    if section.hidden {
        return;
    }
    let buttons: Vec<_> = section
        .buttons
        .iter()
        .map(|b| format!("[{}]", b.label))
        .collect();
    let _ = writeln!(out, "   {}", buttons.join(" "));
    for fieldset in section.fieldsets() {
        let _ = write!(out, "   -- {} ({})", fieldset.legend, fieldset.name);
        if !fieldset.message.is_empty() {
            let marker = if fieldset.error { "!" } else { "" };
            let _ = write!(out, "  {}{}", marker, fieldset.message);
        }
        let _ = writeln!(out);
        for field in &fieldset.fields {
            let value = match field.kind {
                FieldKind::Calendar => continue,
                FieldKind::Checkbox if field.value.is_empty() => "[ ]".to_string(),
                FieldKind::Checkbox => "[x]".to_string(),
                _ => field.value.clone(),
            };
            let ro = if field.readonly { " (readonly)" } else { "" };
            let _ = writeln!(out, "      {}{}: {}", field.name, ro, value);
        }
    }
}

pub fn render_state(state: &AppState, nav: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", nav);
    if let Some(w) = &state.warning {
        let _ = writeln!(out, "warning: {}", w);
    }
    for section in state.sections.iter() {
        render_section(&mut out, section);
    }
    out
}
