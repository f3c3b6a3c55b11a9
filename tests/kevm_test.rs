use rhoevm_kcfg::modules::cterm::CTerm;
use rhoevm_kcfg::modules::error::SemanticsError;
use rhoevm_kcfg::modules::kast::{KInner, KSort};
use rhoevm_kcfg::modules::kevm::{
  account_cell, accounts, add_invariant, is_precompiled_account, jumpi, jumpi_applied, kinner_to_hex, pc_applied,
  pow128, range_address, range_blocknum, range_nonce, range_uint, sharp_execute, size_bytes, wordstack,
  wordstack_empty, wordstack_len, KEVM, WORDSTACK_CONS,
};
use rhoevm_kcfg::modules::prelude::{bytes_token, int_token, lt_int, ml_bottom, ml_equals_false, ml_equals_true};

#[test]
fn test_wordstack_len() {
  assert_eq!(wordstack_len(&wordstack_empty()), Some(0));
  assert_eq!(wordstack_len(&wordstack(vec![int_token(1), int_token(2), KInner::var("X")])), Some(3));
  let open_tail = KInner::apply(WORDSTACK_CONS, vec![int_token(1), KInner::var("REST")]);
  assert_eq!(wordstack_len(&open_tail), Some(1));
  assert_eq!(wordstack_len(&KInner::var("WS")), None);
}

fn invariant_state() -> CTerm {
  let acct = account_cell(
    KInner::var("ACCT_ID"),
    KInner::var("BAL"),
    bytes_token(&[]),
    KInner::var("STORE"),
    KInner::var("ORIG"),
    int_token(1),
  );

  CTerm::from_cells([
    ("K_CELL", KInner::seq(vec![sharp_execute()])),
    ("SCHEDULE_CELL", KInner::apply0("CANCUN_EVM")),
    ("WORDSTACK_CELL", wordstack(vec![KInner::var("W0"), int_token(3)])),
    ("ACCOUNTS_CELL", accounts(vec![acct])),
    ("ID_CELL", KInner::var("ID")),
    ("CALLER_CELL", KInner::var("CALLER")),
    ("ORIGIN_CELL", KInner::var("ORIGIN")),
    ("CALLDATA_CELL", KInner::var("CALLDATA")),
    ("CALLVALUE_CELL", KInner::var("VALUE")),
    ("NUMBER_CELL", KInner::var("NUMBER")),
    ("TIMESTAMP_CELL", KInner::var("TIMESTAMP")),
  ])
}

#[test]
fn test_add_invariant() {
  let cterm = add_invariant(invariant_state()).unwrap();
  let schedule = KInner::apply0("CANCUN_EVM");
  let expected = vec![
    ml_equals_true(range_uint(256, KInner::var("W0"))),
    ml_equals_true(range_uint(256, int_token(3))),
    ml_equals_true(range_address(KInner::var("ACCT_ID"))),
    ml_equals_false(is_precompiled_account(KInner::var("ACCT_ID"), schedule.clone())),
    ml_equals_true(range_uint(256, KInner::var("BAL"))),
    ml_equals_true(range_address(KInner::var("ID"))),
    ml_equals_true(range_address(KInner::var("CALLER"))),
    ml_equals_false(is_precompiled_account(KInner::var("CALLER"), schedule.clone())),
    ml_equals_true(lt_int(size_bytes(KInner::var("CALLDATA")), pow128())),
    ml_equals_true(range_uint(256, KInner::var("VALUE"))),
    ml_equals_true(range_address(KInner::var("ORIGIN"))),
    ml_equals_false(is_precompiled_account(KInner::var("ORIGIN"), schedule)),
    ml_equals_true(range_blocknum(KInner::var("NUMBER"))),
    ml_equals_true(range_uint(256, KInner::var("TIMESTAMP"))),
  ];
  assert_eq!(cterm.constraints, expected);
  // concrete nonce gets no range constraint
  assert!(!cterm.constraints.contains(&ml_equals_true(range_nonce(int_token(1)))));
}

#[test]
fn test_add_invariant_is_idempotent() {
  let once = add_invariant(invariant_state()).unwrap();
  let twice = add_invariant(once.clone()).unwrap();
  assert_eq!(once, twice);
}

#[test]
fn test_add_invariant_missing_cell() {
  let mut cterm = invariant_state();
  cterm.cells.remove("CALLER_CELL");
  match add_invariant(cterm) {
    Err(SemanticsError::MissingCell(name)) => assert_eq!(name, "CALLER_CELL"),
    other => panic!("expected missing cell, got {:?}", other),
  }
}

#[test]
fn test_accounts_map() {
  assert_eq!(accounts(vec![]), KInner::apply0(".AccountCellMap"));
  let a1 = account_cell(int_token(1), int_token(0), bytes_token(&[]), KInner::var("S1"), KInner::var("O1"), int_token(0));
  let a2 = account_cell(int_token(2), int_token(0), bytes_token(&[]), KInner::var("S2"), KInner::var("O2"), int_token(0));
  let map = accounts(vec![a1.clone(), a2.clone()]);
  assert_eq!(
    map,
    KInner::apply(
      "_AccountCellMap_",
      vec![
        KInner::apply("AccountCellMapItem", vec![KInner::apply("<acctID>", vec![int_token(1)]), a1]),
        KInner::apply("AccountCellMapItem", vec![KInner::apply("<acctID>", vec![int_token(2)]), a2]),
      ]
    )
  );
}

#[test]
fn test_kinner_to_hex() {
  assert_eq!(kinner_to_hex(int_token(255)), KInner::token("0xff", KSort::int()));
  assert_eq!(kinner_to_hex(int_token(-16)), KInner::token("-0x10", KSort::int()));
  assert_eq!(kinner_to_hex(bytes_token(&[0x60, 0x5b])), KInner::token("0x605b", KSort::bytes()));
  let nested = KInner::apply("_+Int_", vec![KInner::var("X"), int_token(4096)]);
  assert_eq!(kinner_to_hex(nested), KInner::apply("_+Int_", vec![KInner::var("X"), KInner::token("0x1000", KSort::int())]));
  // symbolic leaves are untouched
  assert_eq!(kinner_to_hex(KInner::var("Y")), KInner::var("Y"));
}

#[test]
fn test_pretty_print_parenthesizes() {
  let kevm = KEVM::default();
  let sum = KInner::apply("_+Int_", vec![KInner::var("X"), int_token(1)]);
  assert_eq!(kevm.pretty_print(&sum), "(X +Int 1)");
  let product = KInner::apply("_*Int_", vec![sum, int_token(2)]);
  assert_eq!(kevm.pretty_print(&product), "((X +Int 1) *Int 2)");
  assert_eq!(kevm.pretty_print(&KInner::apply("notBool_", vec![KInner::var("B")])), "(notBool B)");
  assert_eq!(kevm.pretty_print(&ml_equals_true(KInner::var("B"))), "{ true #Equals B }");
  assert_eq!(kevm.pretty_print(&ml_bottom()), "#Bottom");
}

#[test]
fn test_pretty_print_word_comparison() {
  let kevm = KEVM::default();
  let lt = KInner::apply("_<Word__EVM-TYPES_Int_Int_Int", vec![KInner::var("A"), int_token(3)]);
  assert_eq!(kevm.pretty_print(&lt), "((A) <Word (3))");
}

#[test]
fn test_pretty_print_defaults() {
  let kevm = KEVM::default();
  assert_eq!(kevm.pretty_print(&KInner::apply("foo", vec![KInner::var("A"), int_token(1)])), "foo(A, 1)");
  assert_eq!(kevm.pretty_print(&KInner::apply("_=/=K_", vec![KInner::var("A"), KInner::var("B")])), "A =/=K B");
  assert_eq!(kevm.pretty_print(&KInner::seq(vec![])), ".K");
  assert_eq!(kevm.pretty_print(&KInner::seq(vec![sharp_execute(), KInner::var("K")])), "execute\n~> K");
  assert_eq!(kevm.pretty_print(&accounts(vec![])), ".Bag");
}

#[test]
fn test_pretty_print_hex() {
  let kevm = KEVM::new(true);
  assert!(kevm.use_hex_encoding());
  let sum = KInner::apply("_+Int_", vec![int_token(16), int_token(255)]);
  assert_eq!(kevm.pretty_print(&sum), "(0x10 +Int 0xff)");
  assert_eq!(kevm.pretty_print(&bytes_token(&[0xde, 0xad])), "0xdead");
}

#[test]
fn test_short_info() {
  let kevm = KEVM::default();
  let k_cell = KInner::seq(vec![jumpi_applied(int_token(9), KInner::var("C")), pc_applied(jumpi()), sharp_execute()]);
  let cterm = CTerm::from_cells([("K_CELL", k_cell), ("PC_CELL", int_token(4)), ("CALLDEPTH_CELL", int_token(0))]);
  let info = kevm.short_info(&cterm);
  assert_eq!(info.len(), 3);
  assert!(info[0].starts_with("k: ____EVM_InternalOp_BinStackOp_Int_Int(JUMPI_EVM_BinStackOp, 9, C) ~> "));
  assert!(info[0].ends_with(" ..."));
  assert_eq!(info[0].chars().count(), "k: ".len() + 80 + " ...".len());
  assert_eq!(info[1], "pc: 4");
  assert_eq!(info[2], "callDepth: 0");
}

#[test]
fn test_short_info_empty_configuration() {
  let kevm = KEVM::default();
  assert_eq!(kevm.short_info(&CTerm::default()), vec!["(empty configuration)".to_string()]);
}

#[test]
fn test_pretty_print_wrong_arity() {
  let kevm = KEVM::default();
  let equals = KInner::apply("#Equals", vec![KInner::var("B")]);
  assert_eq!(kevm.pretty_print(&equals), "#Equals(B)");
  let lt = KInner::apply("_<Word__EVM-TYPES_Int_Int_Int", vec![KInner::var("A")]);
  assert_eq!(kevm.pretty_print(&lt), "(A)");

  let cterm = CTerm::from_cells([("K_CELL", KInner::seq(vec![equals, KInner::var("K")]))]);
  assert_eq!(kevm.short_info(&cterm)[0], "k: #Equals(B) ~> K");
}
