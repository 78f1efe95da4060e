use regex_syntax::hir;

/// A predicate over a single character.
#[derive(Clone, Debug)]
pub enum Atom {
    /// Matches every character.
    Any,
    Literal(char),
    /// A sorted list of inclusive code-point ranges.
    Class(Vec<(char, char)>),
    /// The complement of a sorted list of inclusive code-point ranges.
    ClassComplement(Vec<(char, char)>),
}

impl Atom {
    pub fn matches(&self, c: char) -> bool {
        match self {
            Atom::Any => true,
            Atom::Literal(x) => c == *x,
            Atom::Class(ranges) => in_ranges(ranges, c),
            Atom::ClassComplement(ranges) => !in_ranges(ranges, c),
        }
    }

    pub fn from_hir_literal(lit: hir::Literal) -> Atom {
        match lit {
            hir::Literal::Unicode(c) => Atom::Literal(c),
            hir::Literal::Byte(b) => Atom::Literal(b as char),
        }
    }

    /// `regex_syntax` already resolves `[^...]` into the complement's concrete
    /// ranges at parse time, so a class coming out of the parser is always
    /// represented here as `Class`; `ClassComplement` exists so the type
    /// mirrors the spec's data model and so callers constructing a VA by hand
    /// (e.g. tests) can express a complement without pre-computing its ranges.
    pub fn from_hir_class(class: hir::Class) -> Atom {
        match class {
            hir::Class::Unicode(class) => Atom::Class(
                class
                    .ranges()
                    .iter()
                    .map(|r| (r.start(), r.end()))
                    .collect(),
            ),
            hir::Class::Bytes(class) => Atom::Class(
                class
                    .ranges()
                    .iter()
                    .map(|r| (r.start() as char, r.end() as char))
                    .collect(),
            ),
        }
    }
}

fn in_ranges(ranges: &[(char, char)], c: char) -> bool {
    ranges.iter().any(|&(start, end)| start <= c && c <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_everything() {
        assert!(Atom::Any.matches('x'));
        assert!(Atom::Any.matches('\0'));
    }

    #[test]
    fn literal_matches_only_itself() {
        let a = Atom::Literal('a');
        assert!(a.matches('a'));
        assert!(!a.matches('b'));
    }

    #[test]
    fn class_and_complement_are_dual() {
        let class = Atom::Class(vec![('a', 'z')]);
        let complement = Atom::ClassComplement(vec![('a', 'z')]);
        assert!(class.matches('m'));
        assert!(!complement.matches('m'));
        assert!(!class.matches('5'));
        assert!(complement.matches('5'));
    }
}
