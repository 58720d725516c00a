/*!
 * sigsup - Main Entry Point
 *
 * - `sigsup run`: supervise one child and report how it shut down
 * - `sigsup child`: act as the supervised child (used by the exec launcher)
 */

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::Result;
use sigsup::core::errors::SigsupResult;
use sigsup::core::limits::{
    DEFAULT_DEADLINE, DEFAULT_POLL_QUANTUM, DEFAULT_READY_TIMEOUT, ENV_DEADLINE_MS,
    ENV_QUANTUM_MS, ENV_READY_TIMEOUT_MS,
};
use sigsup::runner::StdoutNotifier;
use sigsup::{
    init_tracing, ExecLauncher, ForkLauncher, RunnerConfig, Signal, SupervisionResult,
    Supervisor, SupervisorConfig, TaskRunner,
};
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// Fork a child, interrupt it, and verify it shuts down cleanly
#[derive(Parser)]
#[command(name = "sigsup", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Supervise one child and report its exit status
    Run(RunArgs),
    /// Run the polling loop in this process; readiness is written to stdout
    Child(TimingArgs),
}

#[derive(Args)]
struct TimingArgs {
    /// Deadline for the child's polling loop, in milliseconds
    #[arg(long, env = ENV_DEADLINE_MS, default_value_t = DEFAULT_DEADLINE.as_millis() as u64)]
    deadline_ms: u64,

    /// Sleep between cancellation checks, in milliseconds
    #[arg(long, env = ENV_QUANTUM_MS, default_value_t = DEFAULT_POLL_QUANTUM.as_millis() as u64)]
    quantum_ms: u64,

    /// Signal that cancels the child (INT, SIGTERM, 10, ...)
    #[arg(long, default_value = "INT")]
    signal: Signal,
}

impl TimingArgs {
    fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::new()
            .with_deadline(Duration::from_millis(self.deadline_ms))
            .with_quantum(Duration::from_millis(self.quantum_ms))
            .with_signal(self.signal)
    }
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    timing: TimingArgs,

    /// Bound on the readiness handshake, in milliseconds
    #[arg(long, env = ENV_READY_TIMEOUT_MS, default_value_t = DEFAULT_READY_TIMEOUT.as_millis() as u64)]
    ready_timeout_ms: u64,

    /// How many times to send the signal
    #[arg(long, default_value_t = 1)]
    signal_count: u32,

    /// Never send the signal; the child should hit its deadline
    #[arg(long)]
    no_signal: bool,

    /// How the child is spawned
    #[arg(long, value_enum, default_value_t = LauncherKind::Fork)]
    launcher: LauncherKind,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LauncherKind {
    Fork,
    Exec,
}

impl RunArgs {
    fn supervisor_config(&self) -> SupervisorConfig {
        let config = SupervisorConfig::new()
            .with_runner(self.timing.runner_config())
            .with_ready_timeout(Duration::from_millis(self.ready_timeout_ms))
            .with_signal_count(self.signal_count);
        if self.no_signal {
            config.without_signal()
        } else {
            config
        }
    }
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => Ok(run(args)?),
        Commands::Child(args) => Ok(child(args)),
    }
}

fn run(args: RunArgs) -> SigsupResult<ExitCode> {
    let config = args.supervisor_config();

    let result = match args.launcher {
        LauncherKind::Fork => Supervisor::new(config)
            .with_launcher(ForkLauncher::new())
            .supervise()?,
        LauncherKind::Exec => Supervisor::new(config)
            .with_launcher(ExecLauncher::current_exe()?)
            .supervise()?,
    };

    report(&result, args.json)?;
    Ok(if result.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report(result: &SupervisionResult, json: bool) -> SigsupResult<()> {
    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, result)?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{}", result)?;
    }
    Ok(())
}

fn child(args: TimingArgs) -> ExitCode {
    let runner = TaskRunner::new(args.runner_config());
    let code = match runner.run(StdoutNotifier) {
        Ok(outcome) => {
            info!(
                iterations = outcome.iterations,
                deliveries = outcome.deliveries,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "Cancelled, shutting down"
            );
            outcome.exit_code()
        }
        Err(e) => {
            error!(error = %e, "Child failed");
            e.exit_code()
        }
    };
    ExitCode::from(code as u8)
}
