use log::debug;
use num_bigint::BigInt;
use num_traits::Signed;

use crate::modules::cterm::CTerm;
use crate::modules::error::SemanticsError;
use crate::modules::kast::{build_assoc, build_cons, flatten_label, top_down, KInner, KSort};
use crate::modules::prelude::{int_token, lt_int, ml_equals_false, ml_equals_true, pretty_bytes};
use crate::modules::pretty::{base_symbol_table, kevm_patch_symbol_table, pretty_print, SymbolTable};

pub const WORDSTACK_CONS: &str = "_:__EVM-TYPES_WordStack_Int_WordStack";
pub const BYTES_APPEND: &str = "_+Bytes__BYTES-HOOKED_Bytes_Bytes_Bytes";
pub const ACCOUNT_CELL_MAP: &str = "_AccountCellMap_";

pub fn halt() -> KInner {
  KInner::apply0("halt")
}

pub fn sharp_execute() -> KInner {
  KInner::apply0("execute")
}

pub fn jumpi() -> KInner {
  KInner::apply0("JUMPI_EVM_BinStackOp")
}

pub fn jump() -> KInner {
  KInner::apply0("JUMP_EVM_UnStackOp")
}

pub fn jumpi_applied(pc: KInner, cond: KInner) -> KInner {
  KInner::apply("____EVM_InternalOp_BinStackOp_Int_Int", vec![jumpi(), pc, cond])
}

pub fn jump_applied(pc: KInner) -> KInner {
  KInner::apply("___EVM_InternalOp_UnStackOp_Int", vec![jump(), pc])
}

pub fn pc_applied(op: KInner) -> KInner {
  KInner::apply("pc", vec![op])
}

pub fn load_program(bytecode: KInner) -> KInner {
  KInner::apply("loadProgram", vec![bytecode])
}

pub fn run_lemma(term: KInner) -> KInner {
  KInner::apply("runLemma", vec![term])
}

pub fn bool_2_word(cond: KInner) -> KInner {
  KInner::apply("bool2Word", vec![cond])
}

pub fn pow128() -> KInner {
  KInner::apply0("pow128_WORD_Int")
}

pub fn range_uint(width: i64, i: KInner) -> KInner {
  KInner::apply("rangeUInt", vec![int_token(width), i])
}

pub fn range_address(i: KInner) -> KInner {
  KInner::apply("rangeAddress", vec![i])
}

pub fn range_nonce(i: KInner) -> KInner {
  KInner::apply("rangeNonce", vec![i])
}

pub fn range_blocknum(ba: KInner) -> KInner {
  KInner::apply("rangeBlockNum", vec![ba])
}

pub fn size_bytes(ba: KInner) -> KInner {
  KInner::apply("lengthBytes(_)_BYTES-HOOKED_Int_Bytes", vec![ba])
}

pub fn inf_gas(g: KInner) -> KInner {
  KInner::apply("infGas", vec![g])
}

pub fn is_precompiled_account(i: KInner, s: KInner) -> KInner {
  KInner::apply("isPrecompiledAccount", vec![i, s])
}

pub fn bytes_append(b1: KInner, b2: KInner) -> KInner {
  KInner::apply(BYTES_APPEND, vec![b1, b2])
}

pub fn bytes_empty() -> KInner {
  KInner::apply0(".Bytes_BYTES-HOOKED_Bytes")
}

pub fn buf(width: KInner, v: KInner) -> KInner {
  KInner::apply("buf", vec![width, v])
}

pub fn account_cell(
  id: KInner,
  balance: KInner,
  code: KInner,
  storage: KInner,
  orig_storage: KInner,
  nonce: KInner,
) -> KInner {
  KInner::apply(
    "<account>",
    vec![
      KInner::apply("<acctID>", vec![id]),
      KInner::apply("<balance>", vec![balance]),
      KInner::apply("<code>", vec![code]),
      KInner::apply("<storage>", vec![storage]),
      KInner::apply("<origStorage>", vec![orig_storage]),
      KInner::apply("<nonce>", vec![nonce]),
    ],
  )
}

/// Wraps `<account>` cells into map items keyed by their `<acctID>` cell.
pub fn accounts(accts: Vec<KInner>) -> KInner {
  let wrapped = accts
    .into_iter()
    .map(|acct| match &acct {
      KInner::Apply(label, args) if label == "<account>" && !args.is_empty() => {
        KInner::apply("AccountCellMapItem", vec![args[0].clone(), acct.clone()])
      }
      _ => acct,
    })
    .collect();
  build_assoc(KInner::apply0(".AccountCellMap"), ACCOUNT_CELL_MAP, wrapped)
}

pub fn wordstack_empty() -> KInner {
  KInner::apply0(".WordStack_EVM-TYPES_WordStack")
}

pub fn wordstack(items: Vec<KInner>) -> KInner {
  build_cons(wordstack_empty(), WORDSTACK_CONS, items)
}

/// Number of `:` cells on the stack. A stack that is a bare variable has no
/// known length.
pub fn wordstack_len(wordstack: &KInner) -> Option<usize> {
  if wordstack.is_var() {
    return None;
  }
  Some(flatten_label(WORDSTACK_CONS, wordstack).len() - 1)
}

fn symbolic_arg(cell: &KInner) -> Option<&KInner> {
  match cell {
    KInner::Apply(_, args) if args.len() == 1 && args[0].is_var() => Some(&args[0]),
    _ => None,
  }
}

fn account_invariant(account: &KInner, schedule: &KInner) -> Vec<KInner> {
  let args = account.args();
  if args.len() < 6 {
    return vec![];
  }
  let (acct_id, balance, nonce) = (&args[0], &args[1], &args[5]);

  let mut constraints = vec![];
  if let Some(id) = symbolic_arg(acct_id) {
    constraints.push(ml_equals_true(range_address(id.clone())));
    constraints.push(ml_equals_false(is_precompiled_account(id.clone(), schedule.clone())));
  }
  if let Some(b) = symbolic_arg(balance) {
    constraints.push(ml_equals_true(range_uint(256, b.clone())));
  }
  if let Some(n) = symbolic_arg(nonce) {
    constraints.push(ml_equals_true(range_nonce(n.clone())));
  }
  constraints
}

/// Adds the range side conditions KEVM assumes for every reachable configuration.
pub fn add_invariant(cterm: CTerm) -> Result<CTerm, SemanticsError> {
  let schedule = cterm.try_cell("SCHEDULE_CELL")?.clone();
  let mut constraints = vec![];

  let word_stack = cterm.try_cell("WORDSTACK_CELL")?;
  if !word_stack.is_var() {
    let items = flatten_label(WORDSTACK_CONS, word_stack);
    for i in &items[..items.len() - 1] {
      constraints.push(ml_equals_true(range_uint(256, i.clone())));
    }
  }

  let accounts_cell = cterm.try_cell("ACCOUNTS_CELL")?;
  if *accounts_cell != KInner::apply0(".AccountCellMap") {
    for wrapped in flatten_label(ACCOUNT_CELL_MAP, accounts_cell) {
      match &wrapped {
        KInner::Apply(label, args) if label == "AccountCellMapItem" && args.len() == 2 => {
          if let KInner::Apply(..) = &args[1] {
            constraints.extend(account_invariant(&args[1], &schedule));
          }
        }
        _ => continue,
      }
    }
  }

  let id = cterm.try_cell("ID_CELL")?.clone();
  let caller = cterm.try_cell("CALLER_CELL")?.clone();
  let origin = cterm.try_cell("ORIGIN_CELL")?.clone();
  constraints.push(ml_equals_true(range_address(id)));
  constraints.push(ml_equals_true(range_address(caller.clone())));
  constraints.push(ml_equals_false(is_precompiled_account(caller, schedule.clone())));
  constraints.push(ml_equals_true(lt_int(size_bytes(cterm.try_cell("CALLDATA_CELL")?.clone()), pow128())));
  constraints.push(ml_equals_true(range_uint(256, cterm.try_cell("CALLVALUE_CELL")?.clone())));
  constraints.push(ml_equals_true(range_address(origin.clone())));
  constraints.push(ml_equals_false(is_precompiled_account(origin, schedule)));
  constraints.push(ml_equals_true(range_blocknum(cterm.try_cell("NUMBER_CELL")?.clone())));
  constraints.push(ml_equals_true(range_uint(256, cterm.try_cell("TIMESTAMP_CELL")?.clone())));

  debug!("adding {} invariant constraints", constraints.len());
  Ok(constraints.into_iter().fold(cterm, |c, p| c.add_constraint(p)))
}

fn int_to_hex(token: &str) -> Option<String> {
  let n: BigInt = token.parse().ok()?;
  if n.is_negative() {
    Some(format!("-0x{:x}", n.abs()))
  } else {
    Some(format!("0x{:x}", n))
  }
}

/// Rewrites Int and Bytes tokens into hexadecimal text.
pub fn kinner_to_hex(term: KInner) -> KInner {
  let mut to_hex = |term: KInner| match &term {
    KInner::Token(text, sort) if *sort == KSort::int() => match int_to_hex(text) {
      Some(h) => KInner::Token(h, KSort::int()),
      None => term,
    },
    KInner::Token(_, sort) if *sort == KSort::bytes() => match pretty_bytes(&term) {
      Ok(bs) => KInner::Token(format!("0x{}", hex::encode(bs)), KSort::bytes()),
      Err(_) => term,
    },
    _ => term,
  };
  top_down(&mut to_hex, term)
}

/// Printer facade carrying the patched symbol table.
pub struct KEVM {
  use_hex: bool,
  symbol_table: SymbolTable,
}

impl Default for KEVM {
  fn default() -> Self {
    KEVM::new(false)
  }
}

impl KEVM {
  pub fn new(use_hex: bool) -> Self {
    let mut symbol_table = base_symbol_table();
    kevm_patch_symbol_table(&mut symbol_table);
    KEVM { use_hex, symbol_table }
  }

  pub fn use_hex_encoding(&self) -> bool {
    self.use_hex
  }

  pub fn pretty_print(&self, term: &KInner) -> String {
    if self.use_hex {
      pretty_print(&self.symbol_table, &kinner_to_hex(term.clone()))
    } else {
      pretty_print(&self.symbol_table, term)
    }
  }

  pub fn short_info(&self, cterm: &CTerm) -> Vec<String> {
    let k_cell = match cterm.cell("K_CELL") {
      Some(k) => k,
      None => return vec!["(empty configuration)".to_string()],
    };
    let mut pretty_cell = self.pretty_print(k_cell).replace('\n', " ");
    if pretty_cell.chars().count() > 80 {
      pretty_cell = pretty_cell.chars().take(80).collect::<String>() + " ...";
    }
    let mut ret_strs = vec![format!("k: {}", pretty_cell)];
    for (cell, name) in [("PC_CELL", "pc"), ("CALLDEPTH_CELL", "callDepth"), ("STATUSCODE_CELL", "statusCode")] {
      if let Some(value) = cterm.cell(cell) {
        ret_strs.push(format!("{}: {}", name, self.pretty_print(value)));
      }
    }
    ret_strs
  }
}
