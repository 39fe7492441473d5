//! CLI entry point for banker
//!
//! The initial state comes from a configuration file (`--config`) or is
//! prompted on stdin. Then, supports two execution modes:
//! - Interactive: Read instructions from stdin line-by-line
//! - Batch: Read instructions from a playbook file
//!
//! # Examples
//!
//! Interactive mode:
//! ```bash
//! ./banker --config classic.banker
//! > RQ 0 1 0 1 1
//! > CS
//! > ^D
//! ```
//!
//! Batch mode:
//! ```bash
//! ./banker --config classic.banker --playbook scenario.playbook
//! ```

use std::{
    convert::TryFrom,
    io::{self, BufRead, Write},
};

use banker_interactive::{Flow, Instruction, Session, VictimOrder, config::Configuration};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "banker")]
#[command(about = "Banker's algorithm resource allocation simulator", long_about = None)]
struct Args {
    /// Path to the initial state (TOTAL and CUSTOMER lines), prompted on stdin when absent
    #[arg(short, long, env = "BANKER_CONFIG")]
    config: Option<String>,

    /// Path to a playbook file containing instructions to execute (batch mode)
    #[arg(short, long)]
    playbook: Option<String>,

    /// Number of customers to prompt for when no configuration file is given
    #[arg(long, default_value_t = 5)]
    customers: usize,

    /// Number of resource types to prompt for when no configuration file is given
    #[arg(long, default_value_t = 4)]
    resources: usize,

    /// Order in which customers are preempted to break a deadlock
    #[arg(long, value_enum, default_value_t = VictimOrder::Ascending)]
    victim_policy: VictimOrder,
}

#[cfg(not(tarpaulin_include))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("error"))?;
    fmt().with_writer(std::io::stderr).with_target(false).with_env_filter(filter).init();

    let args = Args::parse();

    let stdin = io::stdin();
    let mut reader = stdin.lock();

    let config = match &args.config {
        Some(path) => Configuration::from_file(path)?,
        None => Configuration::prompt(&mut reader, &mut io::stdout(), args.customers, args.resources)?,
    };
    let service = args.victim_policy.apply(config.into_service()?);
    let mut session = Session::new(service)?;

    if let Some(playbook_path) = args.playbook {
        // Batch mode: read from file
        run_batch_mode(&mut session, &playbook_path).await?;
    } else {
        // Interactive mode: read from stdin
        run_interactive_mode(&mut session, &mut reader).await?;
    }

    Ok(())
}

/// Run in batch mode, reading instructions from a file
async fn run_batch_mode(session: &mut Session, file_path: &str) -> anyhow::Result<()> {
    info!("Running batch mode from file: {}", file_path);

    let file = std::fs::File::open(file_path)?;
    let reader = io::BufReader::new(file);
    let mut stdout = io::stdout();

    let start_time = std::time::Instant::now();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        debug!("[{}] {} ... ", line_num + 1, line);
        writeln!(stdout, "> {}", line)?;

        let instruction = Instruction::try_from(line)
            .map_err(|e| anyhow::anyhow!("line {}: {}", line_num + 1, e))?;
        if session.execute(&instruction, &mut stdout).await? == Flow::Exit {
            break;
        }
    }

    info!(execution_time = ?start_time.elapsed(), "Batch execution completed successfully.");
    Ok(())
}

/// Run in interactive mode, reading instructions from stdin
async fn run_interactive_mode<R: BufRead>(session: &mut Session, reader: &mut R) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    writeln!(stdout)?;
    writeln!(stdout, "banker - Interactive Mode")?;
    writeln!(stdout, "=========================")?;
    writeln!(stdout, "Type HELP for the instruction list, EXIT or Ctrl+D to leave")?;
    writeln!(stdout)?;

    let mut line = String::new();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        let bytes_read = reader.read_line(&mut line)?;

        // EOF reached
        if bytes_read == 0 {
            writeln!(stdout)?;
            break;
        }

        // Parse and execute instruction
        match Instruction::try_from(line.trim()) {
            Ok(instruction) => match session.execute(&instruction, &mut stdout).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                // Continue in interactive mode even after errors
                Err(e) => eprintln!("✗ Error: {}", e),
            },
            Err(e) => {
                eprintln!("✗ Parse error: {}", e);
            }
        }
    }

    writeln!(stdout, "Goodbye!")?;
    Ok(())
}
