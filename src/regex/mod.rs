mod glushkov;
mod parse;

use crate::automaton::VA;
use crate::error::Result;

/// Compile a pattern into a VA, applying the surface-level transforms of
/// §6.1 (implicit `.*` anchoring, implicit `match` group).
pub fn compile(regex: &str) -> Result<VA> {
    let hir = parse::Hir::from_regex(regex, false)?;
    Ok(glushkov::LocalLang::from_hir(hir, 0).into_va())
}

/// Compile a pattern into a VA without any of the surface-level transforms:
/// no implicit anchoring, no implicit `match` group.
pub fn compile_raw(regex: &str) -> Result<VA> {
    let hir = parse::Hir::from_regex(regex, true)?;
    Ok(glushkov::LocalLang::from_hir(hir, 0).into_va())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_wraps_unnamed_pattern_in_match_group() {
        let va = compile("a").unwrap();
        assert!(va.num_states() > 2);
    }

    #[test]
    fn compile_raw_rejects_invalid_pattern() {
        assert!(compile_raw("(").is_err());
    }
}
