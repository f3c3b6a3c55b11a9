use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::modules::kast::KInner;

pub type Formatter = Box<dyn Fn(&[String]) -> String + Send + Sync>;
pub type SymbolTable = HashMap<String, Formatter>;

pub fn paren(f: Formatter) -> Formatter {
  Box::new(move |args: &[String]| format!("({})", f(args)))
}

fn infix(op: &'static str) -> Formatter {
  Box::new(move |args: &[String]| args.join(&format!(" {} ", op)))
}

fn prefix(op: &'static str) -> Formatter {
  Box::new(move |args: &[String]| format!("{} {}", op, args.join(" ")))
}

fn word_comparison(op: &'static str) -> Formatter {
  paren(Box::new(move |args: &[String]| match args {
    [a, b] => format!("({}) {} ({})", a, op, b),
    _ => args.join(&format!(" {} ", op)),
  }))
}

pub fn base_symbol_table() -> SymbolTable {
  let mut table = SymbolTable::new();
  let infixes: [(&str, &'static str); 17] = [
    ("_|->_", "|->"),
    ("_andBool_", "andBool"),
    ("_orBool_", "orBool"),
    ("_impliesBool_", "impliesBool"),
    ("_&Int_", "&Int"),
    ("_*Int_", "*Int"),
    ("_+Int_", "+Int"),
    ("_-Int_", "-Int"),
    ("_/Int_", "/Int"),
    ("_|Int_", "|Int"),
    ("_modInt_", "modInt"),
    ("_==Int_", "==Int"),
    ("_=/=Int_", "=/=Int"),
    ("_<Int_", "<Int"),
    ("_up/Int__EVM-TYPES_Int_Int_Int", "up/Int"),
    ("_:__EVM-TYPES_WordStack_Int_WordStack", ":"),
    ("typedArgs", ","),
  ];
  for (label, op) in infixes {
    table.insert(label.to_string(), infix(op));
  }
  table.insert("_Set_".to_string(), Box::new(|args: &[String]| args.join(" ")));
  table.insert("#And".to_string(), infix("#And"));
  table.insert("#Or".to_string(), infix("#Or"));
  table.insert("#Implies".to_string(), infix("#Implies"));
  table.insert(
    "#Equals".to_string(),
    Box::new(|args: &[String]| match args {
      [a, b] => format!("{{ {} #Equals {} }}", a, b),
      _ => format!("#Equals({})", args.join(", ")),
    }),
  );
  table.insert("#Top".to_string(), Box::new(|_: &[String]| "#Top".to_string()));
  table.insert("notBool_".to_string(), prefix("notBool"));
  table
}

pub fn kevm_patch_symbol_table(table: &mut SymbolTable) {
  table.insert("#Bottom".to_string(), Box::new(|_: &[String]| "#Bottom".to_string()));
  table.insert("_Map_".to_string(), paren(Box::new(|args: &[String]| args.join("\n"))));
  table.insert("_AccountCellMap_".to_string(), paren(Box::new(|args: &[String]| args.join("\n"))));
  table.insert(".AccountCellMap".to_string(), Box::new(|_: &[String]| ".Bag".to_string()));
  table.insert("AccountCellMapItem".to_string(), Box::new(|args: &[String]| args.last().cloned().unwrap_or_default()));
  table.insert("_<Word__EVM-TYPES_Int_Int_Int".to_string(), word_comparison("<Word"));
  table.insert("_>Word__EVM-TYPES_Int_Int_Int".to_string(), word_comparison(">Word"));
  table.insert("_<=Word__EVM-TYPES_Int_Int_Int".to_string(), word_comparison("<=Word"));
  table.insert("_>=Word__EVM-TYPES_Int_Int_Int".to_string(), word_comparison(">=Word"));
  table.insert("_==Word__EVM-TYPES_Int_Int_Int".to_string(), word_comparison("==Word"));
  table.insert("_s<Word__EVM-TYPES_Int_Int_Int".to_string(), word_comparison("s<Word"));

  let paren_symbols = [
    "_|->_",
    "#And",
    "_andBool_",
    "#Implies",
    "_impliesBool_",
    "_&Int_",
    "_*Int_",
    "_+Int_",
    "_-Int_",
    "_/Int_",
    "_|Int_",
    "_modInt_",
    "notBool_",
    "#Or",
    "_orBool_",
    "_Set_",
    "typedArgs",
    "_up/Int__EVM-TYPES_Int_Int_Int",
    "_:__EVM-TYPES_WordStack_Int_WordStack",
  ];
  for symb in paren_symbols {
    if let Some(f) = table.remove(symb) {
      table.insert(symb.to_string(), paren(f));
    }
  }
}

fn mixfix() -> &'static (Regex, Regex) {
  static MIXFIX: OnceLock<(Regex, Regex)> = OnceLock::new();
  MIXFIX.get_or_init(|| {
    (Regex::new(r"^_([^_]+)_$").expect("infix pattern"), Regex::new(r"^([^_]+)_$").expect("prefix pattern"))
  })
}

fn default_unparse(label: &str, args: &[String]) -> String {
  let (infix_re, prefix_re) = mixfix();
  if let Some(caps) = infix_re.captures(label) {
    if args.len() == 2 {
      return format!("{} {} {}", args[0], &caps[1], args[1]);
    }
  }
  if let Some(caps) = prefix_re.captures(label) {
    if args.len() == 1 {
      return format!("{} {}", &caps[1], args[0]);
    }
  }
  if args.is_empty() {
    label.to_string()
  } else {
    format!("{}({})", label, args.join(", "))
  }
}

pub fn pretty_print(table: &SymbolTable, term: &KInner) -> String {
  match term {
    KInner::Var(name, _) => name.clone(),
    KInner::Token(text, _) => text.clone(),
    KInner::Apply(label, args) => {
      let args: Vec<String> = args.iter().map(|arg| pretty_print(table, arg)).collect();
      match table.get(label) {
        Some(f) => f(&args),
        None => default_unparse(label, &args),
      }
    }
    KInner::Seq(items) if items.is_empty() => ".K".to_string(),
    KInner::Seq(items) => items.iter().map(|item| pretty_print(table, item)).collect::<Vec<_>>().join("\n~> "),
  }
}
