// SPDX-License-Identifier: MPL-2.0
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use viewer_core::application::HandlerRegistry;
use viewer_core::builtin::register_builtin;
use viewer_core::infrastructure::{HttpTransport, LocalFileInfoSource};
use viewer_core::{config, OpenOptions, SourceState, ViewerSession};

const HELP: &str = "\
viewer-core: walk a local folder through a viewer session

USAGE:
  viewer-core [OPTIONS] FOLDER [FILE]

ARGS:
  FOLDER              Library root to list
  FILE                File inside FOLDER to open first

OPTIONS:
  --config-dir DIR    Directory holding settings.toml
  --steps N           Number of next() steps to take [default: 3]
  --no-loop           Stop at the end of the folder instead of wrapping
  -h, --help          Print this help
";

struct Args {
    config_dir: Option<PathBuf>,
    steps: usize,
    no_loop: bool,
    folder: PathBuf,
    file: Option<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    Ok(Args {
        config_dir: args.opt_value_from_str("--config-dir")?,
        steps: args.opt_value_from_str("--steps")?.unwrap_or(3),
        no_loop: args.contains("--no-loop"),
        folder: args.free_from_str()?,
        file: args.opt_free_from_str()?,
    })
}

fn print_active(session: &ViewerSession, label: &str) {
    let Some(file) = session.current() else {
        println!("{label}: nothing open");
        return;
    };
    let handler = session
        .active_handler()
        .map_or_else(|| "-".to_string(), |handler| handler.id.clone());
    let position = session
        .current_index()
        .map_or_else(|| "-".to_string(), |index| (index + 1).to_string());
    println!(
        "{label}: [{position}/{}] {} ({}) -> {handler}",
        session.files().len(),
        file.filename,
        file.mime
    );
}

async fn run(args: Args) -> viewer_core::Result<()> {
    let (settings, warning) = config::load_with_override(args.config_dir);
    if let Some(warning) = warning {
        eprintln!("{warning}");
    }

    let registry = Arc::new(HandlerRegistry::new());
    register_builtin(&registry)?;

    let file_info = LocalFileInfoSource::new(&args.folder)
        .with_sort_order(settings.navigation.sort_order());
    let transport = HttpTransport::from_config(&settings.server)?;
    let session = ViewerSession::from_config(
        &settings,
        registry,
        Arc::new(file_info),
        Arc::new(transport),
    )?;

    let file = args.file.as_deref().map(|name| format!("/{}", name.trim_start_matches('/')));
    let mut options = OpenOptions::new();
    if args.no_loop {
        options = options.with_can_loop(false);
    }
    session.open_folder("/", file.as_deref(), options, None).await?;
    print_active(&session, "open");

    match session.resolve_active_source().await? {
        SourceState::Ready(url) => println!("source: {url}"),
        SourceState::Failed(err) => println!("source failed [{}]: {err}", err.i18n_key()),
        SourceState::Superseded => println!("source superseded"),
    }

    for step in 1..=args.steps {
        match session.next().await? {
            Some(_) => print_active(&session, &format!("next #{step}")),
            None => {
                println!("next #{step}: end of folder");
                break;
            }
        }
    }

    let info = session.navigation_info();
    tracing::debug!(?info, "Final navigation state");
    session.close();
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}\n\n{HELP}");
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: cannot start async runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
