//! offload CLI - 組み込み task を execution context で実行し、イベントを表示する
//!
//! # 使用例
//! ```text
//! offload run demo.scale.v1 --data 1159
//! offload run text.upper.v1 --data '"hi"' --library builtin://text
//! offload list
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

use offload_core::impls::{HandlerBundle, StaticLibraryResolver};
use offload_core::{
    ContextConfig, Handler, Supervisor, SupervisorBuilder, Task, TaskArg, TaskError, TaskHandle,
};

#[derive(Parser)]
#[command(name = "offload")]
#[command(about = "Run tasks on an isolated background execution context")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with context settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task and wait for its terminal report
    Run {
        /// Task type, e.g. demo.scale.v1
        task_type: String,

        /// Task data as JSON
        #[arg(long, default_value = "null")]
        data: String,

        /// Library locations to load before running (repeatable)
        #[arg(long = "library")]
        libraries: Vec<String>,

        /// Give up waiting after this many seconds
        #[arg(long, default_value = "30")]
        wait_secs: u64,
    },

    /// List built-in task types and library locations
    List,
}

// ========================================
// built-in tasks
// ========================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
struct Scale(i64);

impl Task for Scale {
    const TYPE: &'static str = "demo.scale.v1";
}

struct ScaleHandler;

#[async_trait]
impl Handler<Scale> for ScaleHandler {
    async fn handle(&self, arg: TaskArg<Scale>) -> Result<(), TaskError> {
        let value = arg
            .data
            .0
            .checked_mul(1000)
            .ok_or_else(|| TaskError::execution("overflow"))?;
        arg.completed(value);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Countdown {
    steps: u64,
    #[serde(default = "default_delay_ms")]
    delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    100
}

impl Task for Countdown {
    const TYPE: &'static str = "demo.countdown.v1";
}

struct CountdownHandler;

#[async_trait]
impl Handler<Countdown> for CountdownHandler {
    async fn handle(&self, arg: TaskArg<Countdown>) -> Result<(), TaskError> {
        for step in 1..=arg.data.steps {
            sleep(Duration::from_millis(arg.data.delay_ms)).await;
            arg.report_progress(step);
        }
        arg.completed("done");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Fail {
    #[serde(default)]
    reason: Option<String>,
}

impl Task for Fail {
    const TYPE: &'static str = "demo.fail.v1";
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
struct Upper(String);

impl Task for Upper {
    const TYPE: &'static str = "text.upper.v1";
}

const TEXT_LIBRARY: &str = "builtin://text";

fn build_supervisor(config: ContextConfig) -> anyhow::Result<Arc<Supervisor>> {
    let text = HandlerBundle::new("text").with_fn(|arg: TaskArg<Upper>| async move {
        arg.completed(arg.data.0.to_uppercase());
        Ok::<(), TaskError>(())
    });

    let supervisor = SupervisorBuilder::new()
        .config(config)
        .register::<Scale, _>(ScaleHandler)?
        .register::<Countdown, _>(CountdownHandler)?
        .register_fn(|arg: TaskArg<Fail>| async move {
            Err::<(), _>(TaskError::Execution(
                arg.data.reason.unwrap_or_else(|| "requested failure".to_string()),
            ))
        })?
        .library_resolver(StaticLibraryResolver::new().with_library(TEXT_LIBRARY, text))
        .expect_tasks(&[Scale::TYPE, Countdown::TYPE, Fail::TYPE])
        .build()?;
    Ok(supervisor)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ContextConfig> {
    let Some(path) = path else {
        return Ok(ContextConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    ContextConfig::from_json_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

enum Event {
    Progress(u64),
    Complete(Value),
    Error(TaskError),
}

async fn run_task(
    supervisor: &Arc<Supervisor>,
    task_type: String,
    data: &str,
    libraries: Vec<String>,
    wait: Duration,
) -> anyhow::Result<bool> {
    let data: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
    let task = TaskHandle::new(supervisor, task_type)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (p, c, e) = (tx.clone(), tx.clone(), tx);
    task.set_on_progress_changed(move |step| {
        let _ = p.send(Event::Progress(step));
    });
    task.set_on_complete(move |result| {
        let _ = c.send(Event::Complete(result));
    });
    task.set_on_error(move |err| {
        let _ = e.send(Event::Error(err));
    });

    // a failed load reaches on_error before the run's own reports
    task.load_library(libraries)?;
    let request_id = task.run(data)?;
    tracing::info!(%request_id, task_type = task.task_type(), "task dispatched");

    let outcome = tokio::time::timeout(wait, async {
        while let Some(event) = rx.recv().await {
            match event {
                Event::Progress(step) => println!("progress: {step}"),
                Event::Complete(result) => {
                    println!("result: {result}");
                    return true;
                }
                Event::Error(err) => {
                    eprintln!("error: {err}");
                    return false;
                }
            }
        }
        false
    })
    .await;

    match outcome {
        Ok(succeeded) => Ok(succeeded),
        Err(_) => anyhow::bail!("no terminal report within {}s", wait.as_secs()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_ref())?;
    let supervisor = build_supervisor(config)?;

    match cli.command {
        Commands::Run {
            task_type,
            data,
            libraries,
            wait_secs,
        } => {
            let succeeded = run_task(
                &supervisor,
                task_type,
                &data,
                libraries,
                Duration::from_secs(wait_secs),
            )
            .await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::List => {
            println!("tasks:");
            for task_type in supervisor.registered_types() {
                println!("  {task_type}");
            }
            println!("libraries:");
            println!("  {TEXT_LIBRARY} (text.upper.v1)");
        }
    }

    Ok(())
}
