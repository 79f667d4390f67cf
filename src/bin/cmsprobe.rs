use anyhow::Result;
use chrono::{NaiveDate, Utc};
use cmsprobe::calendar::{HeadlessPicker, PickerNotice};
use cmsprobe::cli;
use cmsprobe::client::{Backend, MemoryBackend, RestClient};
use cmsprobe::config::Config;
use cmsprobe::context::StandardContext;
use cmsprobe::controller::Controller;
use cmsprobe::form::FormEntries;
use cmsprobe::model::{ResourceKind, mock_resource};
use cmsprobe::section::ActionOp;
use std::env;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

struct Args {
    root: Option<PathBuf>,
    local: bool,
    verbose: bool,
}

fn parse_args() -> Option<Args> {
    let mut args = Args {
        root: None,
        local: false,
        verbose: false,
    };
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => return None,
            "-r" | "--root" => args.root = it.next().map(PathBuf::from),
            "-l" | "--local" => args.local = true,
            "-v" | "--verbose" => args.verbose = true,
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
    }
    Some(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = parse_args() else {
        cli::print_help("cmsprobe");
        return Ok(());
    };

    let ctx = StandardContext::new(args.root);
    cli::init_logging(&ctx, args.verbose)?;
    let config = Config::load_or_default(&ctx)?;
    log::info!("Using config at {}", Config::get_path_string(&ctx)?);

    let today = config
        .converter()
        .map_err(anyhow::Error::msg)?
        .to_wall_clock(Utc::now())
        .date();
    let picker = HeadlessPicker::new(today);

    if args.local {
        let backend = MemoryBackend::new();
        backend.insert(mock_resource(ResourceKind::Person));
        run(Controller::new(backend, picker, &config).map_err(anyhow::Error::msg)?).await
    } else {
        let backend = RestClient::new(
            &config.api_url,
            &config.user_agent,
            config.access_token.clone(),
        )
        .map_err(anyhow::Error::msg)?;
        run(Controller::new(backend, picker, &config).map_err(anyhow::Error::msg)?).await
    }
}

fn feed(ctl: &mut Controller<impl Backend, HeadlessPicker>, notices: Vec<PickerNotice>) {
    for notice in notices {
        ctl.handle_picker(notice);
    }
}

/// The schedule form hosts the picker; render it whenever that form is shown.
fn mount_picker(ctl: &mut Controller<impl Backend, HeadlessPicker>) {
    let shown = ctl
        .state()
        .sections
        .event
        .fieldset(cmsprobe::form::SCHEDULE_FIELDSET)
        .is_some();
    if shown {
        let notices = ctl.picker_mut().render();
        feed(ctl, notices);
    }
}

fn parse_day(raw: Option<&str>) -> Result<NaiveDate, String> {
    let raw = raw.ok_or("Missing date")?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("Invalid date '{}': {}", raw, e))
}

fn parse_op(raw: Option<&str>) -> Result<ActionOp, String> {
    match raw.map(str::to_lowercase).as_deref() {
        Some("new") | Some("create") => Ok(ActionOp::Create),
        Some("reset") => Ok(ActionOp::Reset),
        Some("edit") => Ok(ActionOp::Edit),
        Some("delete") => Ok(ActionOp::Delete),
        Some("regenerate") => Ok(ActionOp::Regenerate),
        Some("contact") => Ok(ActionOp::LogContact),
        other => Err(format!("Unknown action: {:?}", other)),
    }
}

fn parse_kind(raw: Option<&str>) -> Result<ResourceKind, String> {
    raw.ok_or_else(|| "Missing kind".to_string())?.parse()
}

async fn run<B: Backend>(mut ctl: Controller<B, HeadlessPicker>) -> Result<()> {
    if let Err(e) = ctl.refresh().await {
        eprintln!("{}", e);
    }
    println!("{}", cli::render_state(ctl.state(), &ctl.nav_label()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            continue;
        };
        let result: Result<(), String> = match cmd {
            "quit" | "exit" => break,
            "help" => {
                cli::print_commands();
                continue;
            }
            "show" => Ok(()),
            "refresh" => ctl.refresh().await,
            "greet" => {
                ctl.cycle_greeting();
                Ok(())
            }
            "toggle" => parse_kind(words.next()).map(|kind| {
                ctl.toggle(kind);
                mount_picker(&mut ctl);
            }),
            "act" => match (parse_kind(words.next()), parse_op(words.next())) {
                (Ok(kind), Ok(op)) => {
                    ctl.act(kind, op).await;
                    mount_picker(&mut ctl);
                    Ok(())
                }
                (Err(e), _) | (_, Err(e)) => Err(e),
            },
            "set" => parse_kind(words.next()).and_then(|kind| {
                let fieldset = words.next().ok_or("Missing fieldset")?.to_string();
                for (field, value) in FormEntries::parse_pairs(words.by_ref()).iter() {
                    if !ctl.set_field(kind, &fieldset, field, value) {
                        return Err(format!("No field '{}' in '{}'", field, fieldset));
                    }
                }
                Ok(())
            }),
            "focus" => parse_kind(words.next()).and_then(|kind| {
                let fieldset = words.next().ok_or("Missing fieldset")?;
                ctl.input_focus(kind, fieldset);
                Ok(())
            }),
            "submit" => match parse_kind(words.next()) {
                Ok(kind) => match words.next() {
                    Some(fieldset) => {
                        ctl.submit(kind, fieldset).await;
                        Ok(())
                    }
                    None => Err("Missing fieldset".to_string()),
                },
                Err(e) => Err(e),
            },
            "browse" => parse_day(words.next()).map(|day| {
                let notices = ctl.picker_mut().browse(day);
                feed(&mut ctl, notices);
            }),
            "pick" => parse_day(words.next()).map(|day| {
                let notices = ctl.picker_mut().pick(day);
                feed(&mut ctl, notices);
            }),
            other => Err(format!("Unknown command '{}'; try 'help'", other)),
        };
        if let Err(e) = result {
            eprintln!("{}", e);
        }
        println!("{}", cli::render_state(ctl.state(), &ctl.nav_label()));
    }
    Ok(())
}
