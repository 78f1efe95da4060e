/// Glushkov's construction: turn a regex Hir into a linearized local language,
/// then into a VA with one state per term plus an implicit origin state.
use std::collections::LinkedList;
use std::rc::Rc;

use bit_set::BitSet;

use crate::automaton::{Label, VA};

use super::parse::Hir;

#[derive(Clone, Debug)]
pub struct GlushkovTerm {
    id: usize,
    label: Rc<Label>,
}

#[derive(Clone, Debug)]
pub struct GlushkovFactors {
    /// Terms that can start a word (prefixes).
    p: LinkedList<GlushkovTerm>,
    /// Terms that can end a word (suffixes).
    d: LinkedList<GlushkovTerm>,
    /// Factors of size 2: pairs of terms that can be adjacent.
    f: LinkedList<(GlushkovTerm, GlushkovTerm)>,
    /// Whether the language contains the empty word.
    g: bool,
}

#[derive(Clone, Debug)]
pub struct LocalLang {
    pub nb_terms: usize,
    pub factors: GlushkovFactors,
}

/// A local language is a regular language fully characterized by its
/// factors of size 2, its prefixes and suffixes, and whether it contains
/// the empty word.
impl LocalLang {
    pub fn into_va(self) -> VA {
        let inner_transitions = self
            .factors
            .f
            .into_iter()
            .map(|(source, target)| (source.id + 1, (*target.label).clone(), target.id + 1));
        let pref_transitions = self
            .factors
            .p
            .into_iter()
            .map(|target| (0, (*target.label).clone(), target.id + 1));

        let transitions: Vec<_> = inner_transitions.chain(pref_transitions).collect();

        let mut finals = BitSet::with_capacity(self.nb_terms + 1);
        for x in self.factors.d {
            finals.insert(x.id + 1);
        }
        if self.factors.g {
            finals.insert(0);
        }

        VA::new(self.nb_terms + 1, 0, transitions, finals)
    }

    /// Build a local language representing the input Hir.
    pub fn from_hir(hir: Hir, id_offset: usize) -> LocalLang {
        match hir {
            Hir::Empty => LocalLang::empty(),
            Hir::Label(label) => LocalLang::label(label, id_offset),
            Hir::Concat(hir1, hir2) => {
                let lang1 = LocalLang::from_hir(*hir1, id_offset);
                let lang2 = LocalLang::from_hir(*hir2, id_offset + lang1.nb_terms);
                LocalLang::concatenation(lang1, lang2)
            }
            Hir::Alternation(hir1, hir2) => {
                let lang1 = LocalLang::from_hir(*hir1, id_offset);
                let lang2 = LocalLang::from_hir(*hir2, id_offset + lang1.nb_terms);
                LocalLang::alternation(lang1, lang2)
            }
            Hir::Option(hir) => LocalLang::optional(LocalLang::from_hir(*hir, id_offset)),
            Hir::Closure(hir) => LocalLang::closure(LocalLang::from_hir(*hir, id_offset)),
        }
    }

    /// Register a new term in the local language and return it.
    fn register_label(&mut self, label: Rc<Label>, id_offset: usize) -> GlushkovTerm {
        self.nb_terms += 1;
        GlushkovTerm {
            id: self.nb_terms + id_offset - 1,
            label,
        }
    }

    /// A local language of a single term.
    fn label(label: Rc<Label>, id_offset: usize) -> LocalLang {
        let mut lang = LocalLang::empty();
        let term = lang.register_label(label, id_offset);
        lang.factors.p.push_back(term.clone());
        lang.factors.d.push_back(term);
        lang
    }

    fn empty() -> LocalLang {
        LocalLang {
            nb_terms: 0,
            factors: GlushkovFactors {
                p: LinkedList::new(),
                d: LinkedList::new(),
                f: LinkedList::new(),
                g: false,
            },
        }
    }

    /// Concatenation of words from the first and second input languages.
    fn concatenation(lang1: LocalLang, lang2: LocalLang) -> LocalLang {
        let nb_terms = lang1.nb_terms + lang2.nb_terms;
        let mut factors = GlushkovFactors {
            p: lang1.factors.p,
            d: lang2.factors.d,
            f: lang1.factors.f,
            g: lang1.factors.g && lang2.factors.g,
        };

        {
            let mut owned_lang2_factors = lang2.factors.f;
            factors.f.append(&mut owned_lang2_factors);
        }

        for x in &lang1.factors.d {
            for y in &lang2.factors.p {
                factors.f.push_back((x.clone(), y.clone()));
            }
        }

        if lang1.factors.g {
            let mut owned_lang2_p = lang2.factors.p;
            factors.p.append(&mut owned_lang2_p);
        }

        if lang2.factors.g {
            let mut owned_lang1_d = lang1.factors.d;
            factors.d.append(&mut owned_lang1_d);
        }

        LocalLang { nb_terms, factors }
    }

    /// Words from the first or the second input languages.
    fn alternation(lang1: LocalLang, mut lang2: LocalLang) -> LocalLang {
        let nb_terms = lang1.nb_terms + lang2.nb_terms;
        let mut factors = lang1.factors;

        factors.p.append(&mut lang2.factors.p);
        factors.d.append(&mut lang2.factors.d);
        factors.f.append(&mut lang2.factors.f);
        factors.g = factors.g || lang2.factors.g;

        LocalLang { nb_terms, factors }
    }

    /// The empty word plus the input language.
    fn optional(mut lang: LocalLang) -> LocalLang {
        lang.factors.g = true;
        lang
    }

    /// One or more repetitions of words of the input language.
    fn closure(mut lang: LocalLang) -> LocalLang {
        for x in &lang.factors.d {
            for y in &lang.factors.p {
                lang.factors.f.push_back((x.clone(), y.clone()));
            }
        }

        lang
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::parse::Hir;

    #[test]
    fn single_literal_builds_two_state_va() {
        let hir = Hir::from_regex("a", true).unwrap();
        let va = LocalLang::from_hir(hir, 0).into_va();
        assert_eq!(va.num_states(), 2);
        assert!(va.finals().contains(1));
    }

    #[test]
    fn closure_makes_initial_state_accept_empty_word() {
        let hir = Hir::from_regex("a*", true).unwrap();
        let va = LocalLang::from_hir(hir, 0).into_va();
        assert!(va.finals().contains(va.initial()));
    }
}
