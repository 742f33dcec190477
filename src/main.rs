//! CLI entry point for `msgforge`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use msgforge::config::Config;
use msgforge::model::{AttachmentBuilder, Importance, Message, Recipient, RecipientKind};
use msgforge::property::tag::REGISTRY;
use msgforge::writer::{self, BuildOptions};

#[derive(Parser)]
#[command(name = "msgforge", version, about = "Write Outlook-compatible .msg files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a .msg file from the given fields and attachments
    Build(BuildArgs),
    /// List the known MAPI property tags
    Tags {
        #[arg(long)]
        json: bool,
    },
    /// Convert between EML and MSG
    Convert {
        input: PathBuf,
        output: PathBuf,
    },
    /// Show the active configuration, or write it with --init
    Config {
        /// Write the configuration file
        #[arg(long)]
        init: bool,
        /// Overwrite an existing configuration file
        #[arg(long, requires = "init")]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Output .msg file
    #[arg(short, long)]
    output: PathBuf,

    #[arg(short, long, default_value = "")]
    subject: String,

    /// Sender, as "Name <addr>" or a bare address
    #[arg(long)]
    from: Option<String>,

    /// Comma-separated To recipients
    #[arg(long)]
    to: Option<String>,

    /// Comma-separated Cc recipients
    #[arg(long)]
    cc: Option<String>,

    /// Comma-separated Bcc recipients
    #[arg(long)]
    bcc: Option<String>,

    /// Plain-text body
    #[arg(long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the plain-text body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// Read an HTML body from a file
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Message-ID header value
    #[arg(long)]
    message_id: Option<String>,

    #[arg(long, value_enum, default_value = "normal")]
    importance: ImportanceArg,

    /// Attach a file (repeatable)
    #[arg(short, long = "attach", value_name = "PATH")]
    attachments: Vec<PathBuf>,

    /// Attach an inline file referenced by content id (repeatable)
    #[arg(long = "inline", value_name = "PATH=CID")]
    inline: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportanceArg {
    Low,
    Normal,
    High,
}

impl From<ImportanceArg> for Importance {
    fn from(arg: ImportanceArg) -> Self {
        match arg {
            ImportanceArg::Low => Importance::Low,
            ImportanceArg::Normal => Importance::Normal,
            ImportanceArg::High => Importance::High,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = msgforge::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Build(args) => cmd_build(args, &config),
        Commands::Tags { json } => cmd_tags(json),
        Commands::Convert { input, output } => cmd_convert(&input, &output),
        Commands::Config { init, force } => cmd_config(init, force, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = msgforge::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let log_file = msgforge::config::log_file_path(config);
        let file_name = log_file
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("msgforge.log"));
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Assemble a message from the command line and write it.
fn cmd_build(args: BuildArgs, config: &Config) -> anyhow::Result<()> {
    let mut message = Message::new(&args.subject);
    message.importance = args.importance.into();
    message.message_id = args.message_id;

    if let Some(from) = &args.from {
        let sender = Recipient::parse(from, RecipientKind::To)?;
        message = message.with_sender(sender.email(), sender.display_name());
    }

    for (list, kind) in [
        (&args.to, RecipientKind::To),
        (&args.cc, RecipientKind::Cc),
        (&args.bcc, RecipientKind::Bcc),
    ] {
        if let Some(raw) = list {
            for recipient in Recipient::parse_list(raw, kind)? {
                message.recipients.push(recipient);
            }
        }
    }

    if let Some(body) = args.body {
        message.body = body;
    } else if let Some(path) = &args.body_file {
        message.body = std::fs::read_to_string(path)
            .with_context(|| format!("reading body from {}", path.display()))?;
    }
    if let Some(path) = &args.html_file {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("reading HTML body from {}", path.display()))?;
        message.html_body = Some(html);
    }

    for path in &args.attachments {
        message.attachments.add_file(path)?;
    }
    for entry in &args.inline {
        let (path, cid) = entry
            .rsplit_once('=')
            .with_context(|| format!("expected PATH=CID, got '{entry}'"))?;
        let file = File::open(path).with_context(|| format!("opening {path}"))?;
        let attachment = AttachmentBuilder::new(path)
            .reader(std::io::BufReader::new(file))
            .inline(Some(cid))
            .build()?;
        message.attachments.push(attachment)?;
    }

    let total = message.attachments.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Encoding attachments [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let options = BuildOptions::from_config(&config.message, chrono::Utc::now());
    let summary = writer::save_message(
        message,
        &args.output,
        &options,
        Some(&|current, _total| {
            pb.set_position(current as u64);
        }),
    )?;
    pb.finish_and_clear();

    use humansize::{format_size, BINARY};
    let out_size = std::fs::metadata(&args.output)
        .map(|m| m.len())
        .unwrap_or(0);

    println!();
    println!("  {:<20} {}", "Output", args.output.display());
    println!("  {:<20} {}", "Size", format_size(out_size, BINARY));
    println!("  {:<20} {}", "Recipients", summary.recipient_slots.len());
    println!(
        "  {:<20} {} ({})",
        "Attachments",
        summary.attachment_slots.len(),
        format_size(summary.attachment_bytes, BINARY)
    );
    println!("  {:<20} {:.2?}", "Build time", start.elapsed());
    println!();

    Ok(())
}

/// Print the property tag registry.
fn cmd_tags(json: bool) -> anyhow::Result<()> {
    if json {
        let items: Vec<serde_json::Value> = REGISTRY
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": format!("0x{:04X}", t.id),
                    "type": t.prop_type.name(),
                    "type_code": format!("0x{:04X}", t.prop_type.code()),
                    "name": t.name,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!();
    println!("  {:<8} {:<12} {}", "ID", "TYPE", "NAME");
    println!("  {}", "-".repeat(60));
    for tag in REGISTRY {
        println!(
            "  0x{:04X}   {:<12} {}",
            tag.id,
            tag.prop_type.name(),
            tag.name
        );
    }
    println!();
    Ok(())
}

/// Conversion front door. Always reports that it is unsupported.
fn cmd_convert(input: &Path, output: &Path) -> anyhow::Result<()> {
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let reader = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let result = match ext.as_str() {
        "msg" => msgforge::convert::eml_to_msg(reader, std::io::sink()),
        "eml" => msgforge::convert::msg_to_eml(reader, std::io::sink()),
        _ => anyhow::bail!("Output must end in .msg or .eml: {}", output.display()),
    };
    result.with_context(|| format!("converting {}", input.display()))?;
    Ok(())
}

/// Print the active configuration, or save it to the config file.
fn cmd_config(init: bool, force: bool, config: &Config) -> anyhow::Result<()> {
    let path = msgforge::config::config_file_path()
        .context("Could not determine config file path")?;

    if init {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        msgforge::config::save_config(config)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    println!("# Config file: {}", path.display());
    println!(
        "# Log file:    {}",
        msgforge::config::log_file_path(config).display()
    );
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "msgforge", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
