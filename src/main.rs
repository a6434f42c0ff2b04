//! Circuitry - command-line driver for the logic simulator
//!
//! Loads a saved circuit, runs it and prints the resulting node states.
//! Logging is controlled through `RUST_LOG`.

use circuitry::constants::sim;
use circuitry::nodes::CATALOG;
use circuitry::{
    Circuit, CircuitError, CircuitResult, Connection, FileManager, Node, NodeKind, Package,
    PackageInfo, PortInfo,
};
use clap::{ArgGroup, Args, Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// How `run` advances the loaded circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Exactly N ticks
    Ticks(usize),
    /// Until fixed point, giving up after N ticks
    Settle(usize),
}

/// Run configuration parsed from the command line
#[derive(Debug, Parser)]
#[command(name = "circuitry", version, about = "Tick-based digital logic simulator")]
struct RunConfig {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a saved circuit, reset it, run it and print every node
    Run(RunArgs),
    /// Write a half adder demo circuit
    Demo {
        /// Destination file
        file: PathBuf,
    },
    /// List the node catalogue
    Kinds,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("mode").args(["ticks", "max_ticks"])))]
struct RunArgs {
    /// Saved circuit to load
    file: PathBuf,

    /// Run exactly this many ticks
    #[arg(long)]
    ticks: Option<usize>,

    /// Run until nothing is pending, giving up after this many ticks
    #[arg(long, default_value_t = sim::DEFAULT_MAX_TICKS)]
    max_ticks: usize,
}

impl RunArgs {
    fn mode(&self) -> RunMode {
        match self.ticks {
            Some(n) => RunMode::Ticks(n),
            None => RunMode::Settle(self.max_ticks),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let config = RunConfig::parse();

    let result = match config.command {
        Command::Run(args) => {
            let mode = args.mode();
            run(args.file, mode)
        }
        Command::Demo { file } => demo(file),
        Command::Kinds => {
            kinds();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(file: PathBuf, mode: RunMode) -> CircuitResult<()> {
    let data = FileManager::new().load_from_file(&file)?;
    let mut circuit = Circuit::from_nodes(data.nodes)?;
    circuit.reset();

    match mode {
        RunMode::Ticks(n) => {
            circuit.tick_n(n);
            println!("ran {n} ticks");
        }
        RunMode::Settle(limit) => match circuit.calc_bounded(limit) {
            Ok(ticks) => println!("settled after {ticks} ticks"),
            Err(CircuitError::NoFixedPoint { ticks }) => {
                println!("no fixed point after {ticks} ticks, showing last state")
            }
            Err(e) => return Err(e),
        },
    }

    print_states(&circuit)
}

fn print_states(circuit: &Circuit) -> CircuitResult<()> {
    for id in circuit.live_nodes() {
        let node = circuit.node(id)?;
        let depth = depth(circuit, node)?;
        let mut line = format!("{}{} [{}]", "  ".repeat(depth), node.label(), node.kind().name());
        for out in node.outputs() {
            line.push_str(&format!(" {}={}", out.id, u8::from(out.state)));
        }
        if let Some(lit) = node.is_lit() {
            line.push_str(if lit { " (lit)" } else { " (dark)" });
        }
        println!("{line}");
    }
    Ok(())
}

fn depth(circuit: &Circuit, node: &Node) -> CircuitResult<usize> {
    let mut depth = 0;
    let mut parent = node.parent();
    while let Some(id) = parent {
        depth += 1;
        parent = circuit.node(id)?.parent();
    }
    Ok(depth)
}

/// Half adder packaged as a single node, fed by a constant and a button
fn demo(file: PathBuf) -> CircuitResult<()> {
    let a = Node::package_input(PortInfo::new("a", "A", "first addend"), 0);
    let b = Node::package_input(PortInfo::new("b", "B", "second addend"), 1);
    let xor = Node::new(NodeKind::Xor);
    let and = Node::new(NodeKind::And);
    let sum = Node::package_output(PortInfo::new("sum", "Sum", "a xor b"), 0);
    let carry = Node::package_output(PortInfo::new("carry", "Carry", "a and b"), 1);
    let inner = vec![
        Connection::new(a.id(), "out", xor.id(), "a"),
        Connection::new(b.id(), "out", xor.id(), "b"),
        Connection::new(a.id(), "out", and.id(), "a"),
        Connection::new(b.id(), "out", and.id(), "b"),
        Connection::new(xor.id(), "out", sum.id(), "in"),
        Connection::new(and.id(), "out", carry.id(), "in"),
    ];
    let adder = Package::from_boundaries(
        PackageInfo::new("half adder")
            .with_description("Adds two bits")
            .with_author("circuitry demo"),
        vec![a, b, xor, and, sum, carry],
        inner,
    )?;

    let mut circuit = Circuit::new();
    let one = circuit.add_node(Node::new(NodeKind::True).with_name("one"))?;
    let button = circuit.add_node(Node::button().with_name("toggle"))?;
    let adder = circuit.add_node(adder)?;
    let sum_led = circuit.add_node(Node::led().with_name("sum"))?;
    let carry_led = circuit.add_node(Node::led().with_name("carry"))?;
    circuit.connect(one, "out", adder, "a")?;
    circuit.connect(button, "out", adder, "b")?;
    circuit.connect(adder, "sum", sum_led, "in")?;
    circuit.connect(adder, "carry", carry_led, "in")?;

    FileManager::new().save_to_file(&file, &circuit, "Half adder demo")?;
    info!("Demo circuit written");
    println!("wrote {}", file.display());
    Ok(())
}

fn kinds() {
    for entry in CATALOG.iter() {
        let meta = &entry.metadata;
        let ports = |defs: &[circuitry::nodes::PortDefinition]| {
            defs.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(",")
        };
        println!(
            "{:<8} {:<10} in[{}] out[{}]{}  {}",
            meta.node_type,
            meta.category.display_string(),
            ports(&meta.inputs),
            ports(&meta.outputs),
            if meta.force_update { " force" } else { "" },
            meta.description
        );
    }
}
