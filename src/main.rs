use azure_network_workflows::args::{Cli, TransportKind};
use azure_network_workflows::azure::{AzCliTransport, RestTransport};
use azure_network_workflows::config::{self, Settings};
use azure_network_workflows::output::print_summary;
use azure_network_workflows::{execute, load_scenario, RunOptions};
use clap::Parser;
use colored::Colorize;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use std::error::Error;
use std::process::ExitCode;

fn init_logging() -> Result<(), Box<dyn Error>> {
    if std::path::Path::new(config::LOG_CONFIG_FILE).exists() {
        log4rs::init_file(config::LOG_CONFIG_FILE, Default::default())?;
    } else {
        let stdout = ConsoleAppender::builder().build();
        let config = Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(log::LevelFilter::Warn))?;
        log4rs::init_config(config)?;
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_env(cli.cloud)?;
    let data = load_scenario(&cli.data)?;
    let options = RunOptions {
        workflow: cli.workflow,
        mode: cli.mode(),
        teardown: cli.teardown,
    };

    let resources = match cli.transport {
        TransportKind::AzCli => {
            let transport = AzCliTransport::new();
            transport.check_cloud(settings.cloud);
            execute(transport, &settings, &data, options).await?
        }
        TransportKind::Rest => {
            let sp = settings.require_service_principal()?;
            let transport = RestTransport::with_service_principal(settings.cloud, sp)?;
            execute(transport, &settings, &data, options).await?
        }
    };

    if !cli.teardown {
        print_summary(cli.workflow.title(), &resources, cli.style());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    if let Err(e) = init_logging() {
        eprintln!("Error initializing log4rs: {e}");
    }
    log::info!("#Start main()");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{} {e}", "ERROR".on_red());
            ExitCode::FAILURE
        }
    }
}
