use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use logo_robot::{Interpreter, RobotConfig, RobotTurtle, Scalar, TracingTurtle, Turtle, parse};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Logo interpreter for a drawing turtle.
///
/// Without --file or SOURCE an interactive prompt is started; every line is
/// parsed and run against the same turtle.
///
/// EXAMPLES:
///     logo-robot 'REPEAT 4 [ FD 10 RT 90 ]'
///     logo-robot --file square.logo -D size=25
///     logo-robot --robot --config robot.toml
#[derive(Parser, Debug)]
#[command(name = "logo-robot")]
#[command(version)]
struct Args {
    /// Drive the physical robot instead of the text simulation
    #[arg(long)]
    robot: bool,

    /// TOML file with robot wiring and calibration, used with --robot
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Program file to run once
    #[arg(long, short = 'f', value_name = "FILE", conflicts_with = "source")]
    file: Option<PathBuf>,

    /// Program text to run once; words are joined with spaces
    source: Vec<String>,

    /// Bind a variable, e.g. -D size=10 (numbers where they parse, else strings)
    #[arg(short = 'D', value_name = "NAME=VALUE", value_parser = parse_define)]
    define: Vec<(String, Scalar)>,

    /// Print diagnostics to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn parse_define(text: &str) -> Result<(String, Scalar), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {text:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("variable name must not be empty".into());
    }
    Ok((name.to_string(), Scalar::from_literal(value.trim())))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut interpreter = Interpreter::new();
    for (name, value) in &args.define {
        if args.verbose {
            eprintln!("{} {name} = {value}", "define".cyan());
        }
        interpreter.set_var(name.clone(), value.clone());
    }

    let mut turtle = open_turtle(&args)?;

    let outcome = drive(&args, &interpreter, turtle.as_mut());

    // The pen is parked even when the program failed.
    let closed = turtle.close().context("failed to close turtle");

    if args.verbose {
        let state = toml::to_string(&turtle.state()).context("failed to encode turtle state")?;
        eprintln!("{}\n{}", "final state".cyan(), state.trim_end());
    }

    outcome?;
    closed
}

fn open_turtle(args: &Args) -> Result<Box<dyn Turtle>> {
    if !args.robot {
        if args.verbose {
            eprintln!("{} text simulation", "turtle".cyan());
        }
        return Ok(Box::new(TracingTurtle::stdout()));
    }

    let config = match &args.config {
        Some(path) => RobotConfig::load(path).context("failed to load robot configuration")?,
        None => RobotConfig::default(),
    };
    if args.verbose {
        eprintln!(
            "{} robot: pen servo on pin {}, wheels {:?} / {:?}",
            "turtle".cyan(),
            config.pen_servo_pin,
            config.left_wheel_pins,
            config.right_wheel_pins
        );
    }

    let robot = RobotTurtle::from_config(&config, TracingTurtle::stdout())
        .context("failed to set up robot hardware")?;
    Ok(Box::new(robot))
}

fn drive(args: &Args, interpreter: &Interpreter, turtle: &mut dyn Turtle) -> Result<()> {
    if let Some(path) = &args.file {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        run_once(interpreter, &source, turtle, args.verbose)
    } else if !args.source.is_empty() {
        run_once(interpreter, &args.source.join(" "), turtle, args.verbose)
    } else {
        repl(interpreter, turtle, args.verbose)
    }
}

fn run_once(
    interpreter: &Interpreter,
    source: &str,
    turtle: &mut dyn Turtle,
    verbose: bool,
) -> Result<()> {
    let program = parse(source).context("failed to parse program")?;
    if verbose {
        eprintln!("{} {} top-level commands", "parsed".cyan(), program.len());
    }
    interpreter
        .run(&program, turtle, &mut io::stdin(), &mut io::stdout())
        .context("program aborted")?;
    Ok(())
}

fn repl(interpreter: &Interpreter, turtle: &mut dyn Turtle, verbose: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == ":quit" || trimmed == ":q" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if let Err(err) = run_once(interpreter, &line, turtle, verbose) {
                    eprintln!("{} {err:#}", "error:".red().bold());
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => bail!("failed to read input: {err}"),
        }
    }

    Ok(())
}
