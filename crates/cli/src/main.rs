use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use statecraft_engine::{Compiler, TaskFile, load_task_file};
use statecraft_types::{DeploymentEnv, IntegrationPattern};
use tracing::debug;

fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("compile", sub)) => run_compile(sub),
        Some(("validate", sub)) => run_validate(sub),
        _ => anyhow::bail!("expected a subcommand: compile or validate"),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    let file_arg = Arg::new("file")
        .required(true)
        .action(ArgAction::Set)
        .help("Path to a task file (YAML, or JSON with a .json extension)");

    Command::new("statecraft")
        .about("Compile container-job task specifications into task states and policy statements")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compile")
                .about("Print the compiled task state and its policy statements")
                .arg(file_arg.clone())
                .arg(
                    Arg::new("pattern")
                        .long("pattern")
                        .short('p')
                        .action(ArgAction::Set)
                        .help("Integration pattern overriding the file (REQUEST_RESPONSE, RUN_JOB, WAIT_FOR_TASK_TOKEN)"),
                )
                .arg(
                    Arg::new("statements-only")
                        .long("statements-only")
                        .action(ArgAction::SetTrue)
                        .help("Print only the policy statements"),
                )
                .arg(Arg::new("compact").long("compact").action(ArgAction::SetTrue).help("Print single-line JSON")),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a task file without rendering it")
                .arg(file_arg),
        )
}

fn load(sub: &ArgMatches) -> Result<(TaskFile, Compiler)> {
    let file = sub.get_one::<String>("file").context("missing task file argument")?;
    let task_file = load_task_file(file)?;
    let env = task_file.deployment_env(DeploymentEnv::from_env());
    debug!(partition = %env.partition, region = %env.region, account = %env.account, "deployment environment");
    Ok((task_file, Compiler::new(env)))
}

fn run_compile(sub: &ArgMatches) -> Result<()> {
    let (mut task_file, compiler) = load(sub)?;
    if let Some(pattern) = sub.get_one::<String>("pattern") {
        let pattern: IntegrationPattern = pattern.parse()?;
        task_file.task.integration_pattern = Some(pattern);
    }

    let compiled = compiler.compile(&task_file.task)?;
    let output = if sub.get_flag("statements-only") {
        serde_json::to_value(&compiled.policy_statements)?
    } else {
        serde_json::to_value(&compiled)?
    };
    print_json(&output, sub.get_flag("compact"))
}

fn run_validate(sub: &ArgMatches) -> Result<()> {
    let (task_file, compiler) = load(sub)?;
    compiler.validate(&task_file.task)?;
    let report = serde_json::json!({
        "operation": task_file.task.kind.definition().operation(),
        "pattern": task_file.task.pattern(),
        "valid": true,
    });
    print_json(&report, false)
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    let rendered = if compact { serde_json::to_string(value)? } else { serde_json::to_string_pretty(value)? };
    println!("{rendered}");
    Ok(())
}
