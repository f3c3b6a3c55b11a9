use env_logger;
use getopts::Options;
use log::{debug, error, info};
use std::fs;
use std::{env, process};

use rhoevm_kcfg::modules::config::Config;
use rhoevm_kcfg::modules::cterm::CTerm;
use rhoevm_kcfg::modules::format::{bitmap_hex, parse_bytecode};
use rhoevm_kcfg::modules::jumpdests::{jumpdest_offsets, process_jumpdests};
use rhoevm_kcfg::modules::kevm::KEVM;
use rhoevm_kcfg::modules::semantics::KCFGSemantics;

#[derive(Debug)]
struct Args {
  bytecode_file: String,
  state_file: Option<String>,
  config_file: Option<String>,
  use_hex: bool,
  verbose_level: Option<String>,
}

fn print_usage(program: &str, opts: &Options) {
  let brief = format!("Usage: {} BYTECODE_FILE [options]", program);
  print!("{}", opts.usage(&brief));
  process::exit(0);
}

fn parse_args() -> Args {
  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();

  let mut opts = Options::new();
  opts.optopt("s", "state", "JSON state to classify", "FILE");
  opts.optopt("c", "config", "JSON semantics config", "FILE");
  opts.optflag("x", "hex", "print integers and bytes in hexadecimal");
  opts.optopt("v", "verbose", "level of verbose", "LEVEL");
  opts.optflag("h", "help", "print this help menu");

  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(f) => {
      eprintln!("Error: {}", f);
      print_usage(&program, &opts);
      process::exit(1);
    }
  };

  if matches.opt_present("h") {
    print_usage(&program, &opts);
  }

  let bytecode_file = if !matches.free.is_empty() {
    matches.free[0].clone()
  } else {
    eprintln!("Error: BYTECODE_FILE is required.");
    print_usage(&program, &opts);
    process::exit(1);
  };

  Args {
    bytecode_file,
    state_file: matches.opt_str("s"),
    config_file: matches.opt_str("c"),
    use_hex: matches.opt_present("x"),
    verbose_level: matches.opt_str("v"),
  }
}

fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
  match path {
    Some(path) => {
      info!("Loading config from file: {}", path);
      Ok(Config::from_json(&fs::read_to_string(path)?)?)
    }
    None => Ok(Config::default()),
  }
}

fn classify_state(path: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
  info!("Loading state from file: {}", path);
  let cterm: CTerm = serde_json::from_str(&fs::read_to_string(path)?)?;
  let semantics = config.semantics();
  let kevm = KEVM::new(config.use_hex);

  let cterm = match semantics.custom_step(&cterm)? {
    Some(step) => {
      println!("custom step: {} (depth {}, cut: {})", step.rule_labels.join(", "), step.depth, step.cut);
      step.cterm
    }
    None => cterm,
  };
  let cterm = semantics.abstract_node(cterm);

  for line in kevm.short_info(&cterm) {
    println!("{}", line);
  }
  if semantics.is_terminal(&cterm) {
    println!("terminal: true");
    return Ok(());
  }
  println!("terminal: false");

  let branches = semantics.extract_branches(&cterm);
  println!("branches: {}", branches.len());
  for branch in &branches {
    println!("  {}", kevm.pretty_print(branch));
  }
  Ok(())
}

fn main() {
  let args = parse_args();

  // Set the verbose level
  match args.verbose_level.as_deref() {
    Some("0") | Some("error") => env::set_var("RUST_LOG", "error"),
    Some("1") | Some("warn") => env::set_var("RUST_LOG", "warn"),
    Some("2") | Some("info") => env::set_var("RUST_LOG", "info"),
    Some("3") | Some("debug") => env::set_var("RUST_LOG", "debug"),
    Some("4") | Some("trace") => env::set_var("RUST_LOG", "trace"),
    _ => env::set_var("RUST_LOG", "info"),
  }
  env_logger::init();

  let mut config = match load_config(args.config_file.as_deref()) {
    Ok(config) => config,
    Err(e) => {
      error!("Failed to load config: {}", e);
      process::exit(1);
    }
  };
  config.use_hex |= args.use_hex;
  debug!("{:?}", config);

  // ------------- Load the binary file -------------
  info!("Loading binary from file: {}", args.bytecode_file);
  let binary = match fs::read_to_string(&args.bytecode_file) {
    Ok(text) => text,
    Err(e) => {
      error!("Failed to read file '{}': {}", args.bytecode_file, e);
      process::exit(1);
    }
  };
  let bytecode = match parse_bytecode(&binary) {
    Ok(bs) => bs,
    Err(e) => {
      error!("Invalid bytecode in '{}': {}", args.bytecode_file, e);
      process::exit(1);
    }
  };

  let jumpdests = process_jumpdests(&bytecode);
  let offsets = jumpdest_offsets(&jumpdests);
  info!("{} bytes, {} jump destinations", bytecode.len(), offsets.len());
  if config.use_hex {
    println!("jumpdests: {}", bitmap_hex(&jumpdests));
  }
  for offset in offsets {
    println!("JUMPDEST @ 0x{:x}", offset);
  }

  if let Some(state_file) = args.state_file {
    if let Err(e) = classify_state(&state_file, &config) {
      error!("Failed to classify state '{}': {}", state_file, e);
      process::exit(1);
    }
  }
}
