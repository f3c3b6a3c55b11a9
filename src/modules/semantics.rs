use log::{debug, trace};
use sha2::{Digest, Sha256};

use crate::modules::cterm::CTerm;
use crate::modules::error::SemanticsError;
use crate::modules::jumpdests::compute_jumpdests;
use crate::modules::kast::{flatten_label, KInner, KSort};
use crate::modules::kevm::{halt, jumpi, pc_applied, sharp_execute, wordstack_len, BYTES_APPEND};
use crate::modules::prelude::{int_token, ml_equals_true, neq_int, not_bool};

pub const PROGRAM_LOAD_RULE: &str = "EVM.program.load";

const JUMPI_APPLIED: &str = "____EVM_InternalOp_BinStackOp_Int_Int";

/// The result of a custom step: the rewritten state and how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub cterm: CTerm,
  pub depth: usize,
  pub logs: Vec<KInner>,
  pub rule_labels: Vec<String>,
  pub cut: bool,
}

/// Hooks consulted by a KCFG explorer while it extends proof nodes.
pub trait KCFGSemantics {
  fn is_terminal(&self, cterm: &CTerm) -> bool;
  fn extract_branches(&self, cterm: &CTerm) -> Vec<KInner>;
  fn abstract_node(&self, cterm: CTerm) -> CTerm;
  fn same_loop(&self, cterm1: &CTerm, cterm2: &CTerm) -> bool;
  fn custom_step(&self, cterm: &CTerm) -> Result<Option<Step>, SemanticsError>;
}

// Instruction stream shapes ----------------------------------------------------------------------

/// `loadProgram(BYTECODE) ~> CONTINUATION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgram<'a> {
  pub bytecode: &'a KInner,
  pub continuation: KInner,
}

/// `#exec JUMPI PCOUNT COND ~> #pc [ JUMPI ] ~> #execute ~> CONTINUATION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpiBranch<'a> {
  pub pcount: &'a KInner,
  pub cond: &'a KInner,
  pub continuation: KInner,
}

// A trailing pattern variable absorbs every remaining item of the sequence.
fn rest_of(items: &[KInner]) -> KInner {
  match items {
    [single] => single.clone(),
    _ => KInner::Seq(items.to_vec()),
  }
}

pub fn match_load_program(k_cell: &KInner) -> Option<LoadProgram<'_>> {
  let items = match k_cell {
    KInner::Seq(items) => items,
    _ => return None,
  };
  match items.as_slice() {
    [KInner::Apply(label, args), rest @ ..] if label == "loadProgram" && args.len() == 1 && !rest.is_empty() => {
      Some(LoadProgram { bytecode: &args[0], continuation: rest_of(rest) })
    }
    _ => None,
  }
}

pub fn match_jumpi_branch(k_cell: &KInner) -> Option<JumpiBranch<'_>> {
  let items = match k_cell {
    KInner::Seq(items) => items,
    _ => return None,
  };
  match items.as_slice() {
    [KInner::Apply(label, args), pc_next, execute, rest @ ..]
      if label == JUMPI_APPLIED
        && args.len() == 3
        && args[0] == jumpi()
        && *pc_next == pc_applied(jumpi())
        && *execute == sharp_execute()
        && !rest.is_empty() =>
    {
      Some(JumpiBranch { pcount: &args[1], cond: &args[2], continuation: rest_of(rest) })
    }
    _ => None,
  }
}

/// Unwraps `bool2Word(B)` to `B`.
pub fn match_bool_2_word(cond: &KInner) -> Option<&KInner> {
  match cond {
    KInner::Apply(label, args) if label == "bool2Word" && args.len() == 1 => Some(&args[0]),
    _ => None,
  }
}

pub fn is_functional(term: &KInner) -> bool {
  term.label() == Some("runLemma")
}

// `runLemma(...)`, `runLemma(...) ~> .K` or `runLemma(...) ~> X:K`
fn is_functional_request(k_cell: &KInner) -> bool {
  if is_functional(k_cell) {
    return true;
  }
  match k_cell {
    KInner::Seq(items) => match items.as_slice() {
      [head] => is_functional(head),
      [head, KInner::Var(..)] => is_functional(head),
      _ => false,
    },
    _ => false,
  }
}

fn is_halted(k_cell: &KInner) -> bool {
  if *k_cell == halt() {
    return true;
  }
  match k_cell {
    KInner::Seq(items) => match items.as_slice() {
      [] => true,
      [head] => *head == halt(),
      [head, KInner::Var(..)] => *head == halt(),
      _ => false,
    },
    _ => false,
  }
}

fn abstract_term_safely(term: &KInner, base_name: &str, sort: KSort) -> KInner {
  let mut hasher = Sha256::new();
  hasher.update(term.to_string().as_bytes());
  let digest = hasher.finalize();
  let name = format!("{}_{}", base_name, &hex::encode(digest)[..8]);
  KInner::Var(name, Some(sort))
}

// KEVM -------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KEVMSemantics {
  pub auto_abstract_gas: bool,
}

impl KEVMSemantics {
  pub fn new(auto_abstract_gas: bool) -> Self {
    KEVMSemantics { auto_abstract_gas }
  }

  /// Rules after which the explorer must stop and hand the node back.
  pub fn cut_point_rules(
    break_on_jumpi: bool,
    break_on_calls: bool,
    break_on_storage: bool,
    break_on_basic_blocks: bool,
    break_on_load_program: bool,
  ) -> Vec<String> {
    let mut cut_point_rules: Vec<&str> = vec![];
    if break_on_jumpi {
      cut_point_rules.extend(["EVM.jumpi.true", "EVM.jumpi.false"]);
    }
    if break_on_basic_blocks {
      cut_point_rules.push("EVM.end-basic-block");
    }
    if break_on_calls || break_on_basic_blocks {
      cut_point_rules.extend([
        "EVM.call",
        "EVM.callcode",
        "EVM.delegatecall",
        "EVM.staticcall",
        "EVM.create",
        "EVM.create2",
        "EVM.end",
        "EVM.return.exception",
        "EVM.return.revert",
        "EVM.return.success",
        "EVM.precompile.true",
        "EVM.precompile.false",
      ]);
    }
    if break_on_storage {
      cut_point_rules.extend(["EVM.sstore", "EVM.sload"]);
    }
    if break_on_load_program {
      cut_point_rules.push(PROGRAM_LOAD_RULE);
    }
    cut_point_rules.into_iter().map(String::from).collect()
  }

  pub fn terminal_rules(break_every_step: bool) -> Vec<String> {
    let mut terminal_rules = vec!["EVM.halt".to_string()];
    if break_every_step {
      terminal_rules.push("EVM.step".to_string());
    }
    terminal_rules
  }
}

impl KCFGSemantics for KEVMSemantics {
  fn is_terminal(&self, cterm: &CTerm) -> bool {
    let k_cell = match cterm.cell("K_CELL") {
      Some(k) => k,
      None => return false,
    };
    if is_halted(k_cell) {
      trace!("terminal: halted");
      return true;
    }

    // With a fully symbolic program only functional claims can make progress.
    if let Some(program) = cterm.cell("PROGRAM_CELL") {
      if program.is_var() {
        let functional = is_functional_request(k_cell);
        trace!("symbolic program, functional request: {}", functional);
        return !functional;
      }
    }
    false
  }

  fn extract_branches(&self, cterm: &CTerm) -> Vec<KInner> {
    let branch = match cterm.cell("K_CELL").and_then(match_jumpi_branch) {
      Some(branch) => branch,
      None => return vec![],
    };
    let cond = match match_bool_2_word(branch.cond) {
      Some(b) => b.clone(),
      None => neq_int(branch.cond.clone(), int_token(0)),
    };
    trace!("branching on {}", cond);
    vec![ml_equals_true(cond.clone()), ml_equals_true(not_bool(cond))]
  }

  fn abstract_node(&self, cterm: CTerm) -> CTerm {
    if !self.auto_abstract_gas {
      return cterm;
    }

    let mut abstracted = cterm.clone();
    if let Some(KInner::Apply(label, args)) = cterm.cell("GAS_CELL") {
      if label == "infGas" && args.len() == 1 && !args[0].is_var() {
        let vgas = abstract_term_safely(&args[0], "VGAS", KSort::int());
        abstracted = abstracted.with_cell("GAS_CELL", KInner::apply("infGas", vec![vgas]));
      }
    }
    if let Some(refund) = cterm.cell("REFUND_CELL") {
      if !refund.is_var() {
        abstracted = abstracted.with_cell("REFUND_CELL", abstract_term_safely(refund, "VREFUND", KSort::int()));
      }
    }
    abstracted
  }

  fn same_loop(&self, cterm1: &CTerm, cterm2: &CTerm) -> bool {
    // In the same program, at the same calldepth, at the same program counter
    for cell in ["PC_CELL", "CALLDEPTH_CELL", "PROGRAM_CELL"] {
      if cterm1.cell(cell) != cterm2.cell(cell) {
        return false;
      }
    }

    let branch1 = cterm1.cell("K_CELL").and_then(match_jumpi_branch);
    let branch2 = cterm2.cell("K_CELL").and_then(match_jumpi_branch);
    let (branch1, branch2) = match (branch1, branch2) {
      (Some(b1), Some(b2)) => (b1, b2),
      _ => return false,
    };
    if branch1.pcount != branch2.pcount {
      return false;
    }

    // Same wordstack structure
    let len1 = cterm1.cell("WORDSTACK_CELL").and_then(wordstack_len);
    let len2 = cterm2.cell("WORDSTACK_CELL").and_then(wordstack_len);
    matches!((len1, len2), (Some(l1), Some(l2)) if l1 == l2)
  }

  fn custom_step(&self, cterm: &CTerm) -> Result<Option<Step>, SemanticsError> {
    let load = match cterm.cell("K_CELL").and_then(match_load_program) {
      Some(load) => load,
      None => return Ok(None),
    };

    let bytecode_sections = flatten_label(BYTES_APPEND, load.bytecode);
    let jumpdests = compute_jumpdests(&bytecode_sections)?;
    debug!("{}: {} bytecode sections", PROGRAM_LOAD_RULE, bytecode_sections.len());

    let new_cterm = cterm
      .with_cell("JUMPDESTS_CELL", jumpdests)
      .with_cell("PROGRAM_CELL", load.bytecode.clone())
      .with_cell("K_CELL", KInner::seq(vec![load.continuation]));
    Ok(Some(Step {
      cterm: new_cterm,
      depth: 1,
      logs: vec![],
      rule_labels: vec![PROGRAM_LOAD_RULE.to_string()],
      cut: true,
    }))
  }
}
