use rhoevm_kcfg::modules::error::SemanticsError;
use rhoevm_kcfg::modules::format::parse_bytecode;
use rhoevm_kcfg::modules::jumpdests::{compute_jumpdests, jumpdest_offsets, process_jumpdests, Section, JUMPDEST};
use rhoevm_kcfg::modules::kast::KInner;
use rhoevm_kcfg::modules::kevm::buf;
use rhoevm_kcfg::modules::prelude::{bytes_token, int_token};

#[test]
fn test_jumpdest_after_push_operand() {
  assert_eq!(process_jumpdests(&[0x60, 0x5b, 0x5b]), vec![0, 0, 1]);
}

#[test]
fn test_jumpdest_then_stop() {
  assert_eq!(process_jumpdests(&[0x5b, 0x00]), vec![1, 0]);
}

#[test]
fn test_push32_operand_is_skipped() {
  let mut bytecode = vec![0x7f];
  bytecode.extend(vec![0x00; 31]);
  bytecode.push(0x5b);
  assert_eq!(bytecode.len(), 33);
  assert_eq!(process_jumpdests(&bytecode), vec![0; 33]);
}

#[test]
fn test_empty_bytecode() {
  assert_eq!(process_jumpdests(&[]), Vec::<u8>::new());
}

#[test]
fn test_truncated_push_at_end() {
  // PUSH2 with a single operand byte left
  assert_eq!(process_jumpdests(&[0x5b, 0x61, 0x5b]), vec![1, 0, 0]);
}

#[test]
fn test_solc_preamble() {
  // PUSH1 0x80 PUSH1 0x40 MSTORE CALLVALUE DUP1 ISZERO PUSH2 0x000f JUMPI PUSH0 DUP1 REVERT JUMPDEST
  let bytecode = parse_bytecode("0x608060405234801561000f575f80fd5b").unwrap();
  let jumpdests = process_jumpdests(&bytecode);
  assert_eq!(jumpdest_offsets(&jumpdests), vec![0x0f]);
}

#[test]
fn test_flags_only_real_jumpdests() {
  let samples: Vec<Vec<u8>> = vec![
    vec![0x5b; 8],
    vec![0x60, 0x5b, 0x61, 0x5b, 0x5b, 0x5b, 0x56],
    (0u8..=255).collect(),
    vec![0x7f; 40],
  ];
  for bytecode in samples {
    let jumpdests = process_jumpdests(&bytecode);
    assert_eq!(jumpdests.len(), bytecode.len());
    for (i, flag) in jumpdests.iter().enumerate() {
      assert!(*flag == 0 || *flag == 1);
      if *flag == 1 {
        assert_eq!(bytecode[i], JUMPDEST);
      }
    }
  }
  assert_eq!(process_jumpdests(&[0x5b; 8]), vec![1; 8]);
}

#[test]
fn test_compute_jumpdests_over_sections() {
  let sections = vec![bytes_token(&[0x5b]), buf(int_token(3), KInner::var("B")), bytes_token(&[0x00, 0x5b])];
  let jumpdests = compute_jumpdests(&sections).unwrap();
  assert_eq!(jumpdests, bytes_token(&[1, 0, 0, 0, 0, 1]));
}

#[test]
fn test_sections_are_scanned_independently() {
  // a PUSH at the end of one section does not swallow the next section
  let sections = vec![bytes_token(&[0x61]), bytes_token(&[0x5b])];
  assert_eq!(compute_jumpdests(&sections).unwrap(), bytes_token(&[0, 1]));
}

#[test]
fn test_section_from_term() {
  assert_eq!(Section::from_term(&bytes_token(&[0x5b, 0x00])).unwrap(), Section::Concrete(vec![0x5b, 0x00]));
  let symbolic = Section::from_term(&buf(int_token(32), KInner::var("X"))).unwrap();
  assert_eq!(symbolic, Section::Symbolic { width: 32 });
  assert_eq!(symbolic.jumpdests(), vec![0; 32]);
}

#[test]
fn test_unsupported_section() {
  let res = compute_jumpdests(&[bytes_token(&[0x5b]), KInner::var("PROGRAM")]);
  assert!(matches!(res, Err(SemanticsError::UnsupportedSection(_))));
}

#[test]
fn test_symbolic_width_is_rejected() {
  let res = compute_jumpdests(&[buf(KInner::var("W"), KInner::var("X"))]);
  assert!(matches!(res, Err(SemanticsError::NonConcreteWidth(_))));
}

#[test]
fn test_invalid_hex_bytecode() {
  assert!(matches!(parse_bytecode("0x6g"), Err(SemanticsError::Hex(_))));
}
