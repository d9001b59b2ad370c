use std::io::{BufRead, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use plotkit::communication::ConnectionParams;
use plotkit::{
    init_logging, list_ports, CompilingJobSource, Config, DeviceSession, HttpJobSource, JobQueue,
    JobSource, SerialTransport, TextToGcode, BUILD_DATE, VERSION,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile text to G-code
    Compile {
        /// Text to draw; read from stdin when omitted
        text: Option<String>,
        /// Configuration file (.toml or .json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the program here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Home the plotter and draw jobs as they arrive
    Run {
        /// Serial port of the controller
        #[arg(long)]
        port: String,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Poll G-code jobs from this URL instead of reading text from stdin
        #[arg(long)]
        job_url: Option<String>,
    },
    /// List serial ports that may have a controller attached
    Ports,
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::debug!("plotkit {} built {}", VERSION, BUILD_DATE);

    match Cli::parse().command {
        Commands::Compile {
            text,
            config,
            output,
        } => compile(text, config, output),
        Commands::Run {
            port,
            config,
            job_url,
        } => run(port, config, job_url),
        Commands::Ports => ports(),
    }
}

fn compile(
    text: Option<String>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = Config::load_or_default(config.as_deref())?;
    let pipeline = TextToGcode::new(&config.plot_options())?;
    tracing::info!(
        "Scale {:.4} mm/unit, about {} characters per line",
        pipeline.engine().scale(),
        pipeline.engine().estimate_chars_per_line()
    );

    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    let gcode = pipeline.generate(&text);
    match output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", gcode))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", gcode),
    }
    Ok(())
}

fn run(port: String, config: Option<PathBuf>, job_url: Option<String>) -> anyhow::Result<()> {
    let config = Config::load_or_default(config.as_deref())?;
    let params = ConnectionParams {
        port,
        ..config.connection.clone()
    };

    let mut source: Box<dyn JobSource> = match job_url {
        Some(url) => {
            tracing::info!("Polling jobs from {}", url);
            Box::new(HttpJobSource::new(url)?)
        }
        None => {
            let queue = Arc::new(JobQueue::new(config.queue.capacity));
            spawn_stdin_submitter(queue.clone())?;
            tracing::info!("Reading text jobs from stdin, one per line");
            Box::new(CompilingJobSource::new(queue, &config.plot_options())?)
        }
    };

    let transport = SerialTransport::open(&params)?;
    let mut session = DeviceSession::new(transport, config.session_config());
    if let Err(halt) = session.run(source.as_mut(), || true) {
        tracing::error!("{}", halt);
        return Err(halt.into());
    }
    Ok(())
}

fn spawn_stdin_submitter(queue: Arc<JobQueue>) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("stdin-jobs".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Stopped reading stdin: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match queue.submit(&line) {
                    Ok(position) => tracing::info!("Queued job at position {}", position),
                    Err(e) => tracing::warn!("Job rejected: {}", e),
                }
            }
        })
        .context("Failed to start stdin reader")?;
    Ok(())
}

fn ports() -> anyhow::Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        tracing::info!("No controller ports found");
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => {
                println!("{}\t{} [{:04x}:{:04x}]", port.port_name, port.description, vid, pid)
            }
            _ => println!("{}\t{}", port.port_name, port.description),
        }
    }
    Ok(())
}
