//! `pagecraft` command-line entry point

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pagecraft_cli::{
    init_tracing, key_lines, load_config, load_page, open_session, pack, render_key_lines, save,
    Attach,
};
use std::path::PathBuf;

fn page_arg() -> Arg {
    Arg::new("page")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Page document (JSON)")
}

fn attach_arg() -> Arg {
    Arg::new("attach")
        .long("attach")
        .action(ArgAction::Append)
        .value_name("KEY=FILE")
        .help("Attach a local file at the slot named by KEY")
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Output file")
}

fn cli() -> Command {
    Command::new("pagecraft")
        .version(pagecraft_sections::VERSION)
        .about("Inspect and package Pagecraft page documents")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Editor config (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("keys")
                .about("List attachment slots and their extraction keys")
                .arg(page_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("pack")
                .about("Write the multipart body for a page")
                .arg(page_arg())
                .arg(attach_arg())
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("save")
                .about("Save a page through the in-process backend")
                .arg(page_arg())
                .arg(attach_arg())
                .arg(
                    Arg::new("base-url")
                        .long("base-url")
                        .default_value("https://cdn.example")
                        .help("Location prefix for stored attachments"),
                )
                .arg(out_arg()),
        )
}

fn attachments(args: &ArgMatches) -> Result<Vec<Attach>> {
    args.get_many::<String>("attach")
        .unwrap_or_default()
        .map(|arg| Attach::parse(arg))
        .collect()
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing --{name}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("keys", args)) => {
            let page = load_page(path(args, "page")?)?;
            let lines = key_lines(&page, &config);
            println!("{}", render_key_lines(&lines, args.get_flag("json"))?);
        }
        Some(("pack", args)) => {
            let page = load_page(path(args, "page")?)?;
            let session = open_session(page, config, &attachments(args)?)?;
            let summary = pack(&session, path(args, "out")?)?;
            println!("{}", summary.content_type);
            println!(
                "{} parts, {} attachments, {} bytes",
                summary.fields.len() + summary.groups.len() + summary.attachments.len(),
                summary.attachments.len(),
                summary.attachment_bytes
            );
        }
        Some(("save", args)) => {
            let page = load_page(path(args, "page")?)?;
            let session = open_session(page, config, &attachments(args)?)?;
            let base_url = args
                .get_one::<String>("base-url")
                .map_or("https://cdn.example", String::as_str);
            let out = path(args, "out")?;
            let saved = save(session, base_url, out).await?;
            println!("saved {} groups to {}", saved.groups.len(), out.display());
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}
