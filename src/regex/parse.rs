use std::collections::HashMap;
use std::rc::Rc;

use regex_syntax::hir::GroupKind as LibGroup;
use regex_syntax::hir::HirKind as LibHir;
use regex_syntax::hir::RepetitionKind as LibRepKind;
use regex_syntax::hir::RepetitionRange as LibRepRange;

use crate::automaton::atom::Atom;
use crate::automaton::Label;
use crate::error::Result;
use crate::mapping::{Marker, Variable};

/// A simplified Hir with branchings of arity at most 2 and as little
/// redundancy as possible — the tree that the Glushkov construction walks.
#[derive(Clone, Debug)]
pub enum Hir {
    /// The empty language.
    Empty,
    /// The language of words of length 1.
    Label(Rc<Label>),
    Concat(Box<Hir>, Box<Hir>),
    Alternation(Box<Hir>, Box<Hir>),
    /// Either epsilon or a word of the inner language.
    Option(Box<Hir>),
    /// The language of repetitions of *at least one* word of the inner language.
    Closure(Box<Hir>),
}

impl Hir {
    /// Parse `regex` into the simplified Hir, applying the surface-level
    /// transforms of §6.1: implicit anchors become a leading/trailing `.*`,
    /// and the whole expression is wrapped in an implicit `match` group if
    /// the pattern doesn't already name one.
    pub fn from_regex(regex: &str, raw: bool) -> Result<Hir> {
        let (anchor_begin, anchor_end, regex) = if raw {
            (true, true, regex.to_string())
        } else {
            Hir::reformat(regex)
        };

        let mut variables = HashMap::new();

        let lib_hir = regex_syntax::ParserBuilder::new()
            .dot_matches_new_line(true)
            .build()
            .parse(&regex)?;
        let hir = Hir::from_lib_hir(lib_hir, &mut variables);

        if raw {
            return Ok(hir);
        }

        let hir = if variables.contains_key("match") {
            hir
        } else {
            let var = Rc::new(Variable::new("match".to_string(), variables.len()));
            let marker_open = Label::Assignation(Marker::Open(var.clone()));
            let marker_close = Label::Assignation(Marker::Close(var));

            Hir::concat(
                Hir::concat(Hir::label(marker_open), hir),
                Hir::label(marker_close),
            )
        };

        let any = match regex_syntax::hir::Hir::any(false).into_kind() {
            LibHir::Class(x) => x,
            _ => unreachable!("Hir::any always builds a Class"),
        };

        let hir = if anchor_begin {
            hir
        } else {
            Hir::concat(
                Hir::option(Hir::closure(Hir::label(Label::Atom(Atom::from_hir_class(
                    any.clone(),
                ))))),
                hir,
            )
        };

        let hir = if anchor_end {
            hir
        } else {
            Hir::concat(
                hir,
                Hir::option(Hir::closure(Hir::label(Label::Atom(
                    Atom::from_hir_class(any),
                )))),
            )
        };

        Ok(hir)
    }

    /// Build an Hir from `regex_syntax`'s Hir, assigning a dense id to each
    /// newly named capture group encountered along the way.
    fn from_lib_hir(
        hir: regex_syntax::hir::Hir,
        variables: &mut HashMap<String, Rc<Variable>>,
    ) -> Hir {
        match hir.into_kind() {
            LibHir::Empty => Hir::epsilon(),

            LibHir::Literal(lit) => Hir::label(Label::Atom(Atom::from_hir_literal(lit))),

            LibHir::Class(class) => Hir::label(Label::Atom(Atom::from_hir_class(class))),

            LibHir::Repetition(rep) => {
                let hir = Hir::from_lib_hir(*rep.hir, variables);
                match rep.kind {
                    LibRepKind::ZeroOrOne => Hir::option(hir),
                    LibRepKind::ZeroOrMore => Hir::option(Hir::closure(hir)),
                    LibRepKind::OneOrMore => Hir::closure(hir),
                    LibRepKind::Range(range) => Hir::repetition(hir, range),
                }
            }

            LibHir::Group(group) => {
                let subtree = Hir::from_lib_hir(*group.hir, variables);
                match group.kind {
                    LibGroup::NonCapturing | LibGroup::CaptureIndex(_) => subtree,
                    LibGroup::CaptureName { name, index: _ } => {
                        let real_name = match name.find("__") {
                            None => name.clone(),
                            Some(i) => name[0..i].to_string(),
                        };

                        let var = variables.get(&real_name).cloned().unwrap_or_else(|| {
                            let var = Rc::new(Variable::new(real_name.clone(), variables.len()));
                            variables.insert(real_name, var.clone());
                            var
                        });

                        let marker_open = Label::Assignation(Marker::Open(var.clone()));
                        let marker_close = Label::Assignation(Marker::Close(var));

                        Hir::concat(
                            Hir::concat(Hir::label(marker_open), subtree),
                            Hir::label(marker_close),
                        )
                    }
                }
            }

            LibHir::Concat(sub) => sub.into_iter().fold(Hir::epsilon(), |acc, branch| {
                Hir::concat(acc, Hir::from_lib_hir(branch, variables))
            }),

            LibHir::Alternation(sub) => sub.into_iter().fold(Hir::Empty, |acc, branch| {
                Hir::alternation(acc, Hir::from_lib_hir(branch, variables))
            }),

            other => panic!("regex construct not supported: {:?}", other),
        }
    }

    fn epsilon() -> Hir {
        Hir::option(Hir::Empty)
    }

    fn label(label: Label) -> Hir {
        Hir::Label(Rc::new(label))
    }

    fn option(hir: Hir) -> Hir {
        Hir::Option(Box::new(hir))
    }

    fn concat(hir1: Hir, hir2: Hir) -> Hir {
        Hir::Concat(Box::new(hir1), Box::new(hir2))
    }

    fn alternation(hir1: Hir, hir2: Hir) -> Hir {
        Hir::Alternation(Box::new(hir1), Box::new(hir2))
    }

    fn closure(hir: Hir) -> Hir {
        Hir::Closure(Box::new(hir))
    }

    fn repetition(hir: Hir, range: LibRepRange) -> Hir {
        let (min, max) = match range {
            LibRepRange::Exactly(n) => (n, Some(n)),
            LibRepRange::AtLeast(n) => (n, None),
            LibRepRange::Bounded(m, n) => (m, Some(n)),
        };

        let mut result = Hir::epsilon();

        for i in 0..min {
            if i == min - 1 && max.is_none() {
                // An unbounded repetition folds its last copy into a closure
                // instead of expanding it, saving a few states.
                result = Hir::concat(result, Hir::closure(hir.clone()));
            } else {
                result = Hir::concat(result, hir.clone());
            }
        }

        if let Some(max) = max {
            let mut optionals = Hir::epsilon();

            for _ in min..max {
                optionals = Hir::option(Hir::concat(hir.clone(), optionals));
            }

            result = Hir::concat(result, optionals);
        }

        result
    }

    fn reformat(regex: &str) -> (bool, bool, String) {
        let mut regex = String::from(regex);

        let anchor_begin = Some(&b'^') == regex.as_bytes().first();
        let anchor_end = Some(&b'$') == regex.as_bytes().last();

        if anchor_begin {
            regex.remove(0);
        }

        if anchor_end {
            regex.remove(regex.len() - 1);
        }

        (anchor_begin, anchor_end, regex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanchored_pattern_wraps_with_dot_star() {
        // No explicit way to inspect the tree shape cheaply; just check it parses
        // and produces something non-trivial for a plain literal.
        let hir = Hir::from_regex("a", false).unwrap();
        assert!(matches!(hir, Hir::Concat(_, _)));
    }

    #[test]
    fn raw_mode_skips_anchors_and_implicit_group() {
        let hir = Hir::from_regex("a", true).unwrap();
        assert!(matches!(hir, Hir::Label(_)));
    }

    #[test]
    fn invalid_pattern_is_an_error_not_a_panic() {
        assert!(Hir::from_regex("(", false).is_err());
    }
}
