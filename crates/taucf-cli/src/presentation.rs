//! Plain-text rendering of compilers, families and toolchains.

use std::fmt::Write;

use taucf_core::{InstalledCompiler, InstalledCompilerFamily, InstalledCompilerSet, KnowledgeBase};

/// Every role keyword, with required roles marked.
pub fn role_listing(kb: &KnowledgeBase) -> Vec<String> {
    kb.roles()
        .iter()
        .map(|role| {
            let marker = if role.is_required() { " (required)" } else { "" };
            format!("{:<8} {}{marker}", role.keyword(), role.language())
        })
        .collect()
}

/// One compiler with its wrapper chain, indented by nesting depth.
pub fn describe_compiler(compiler: &InstalledCompiler) -> String {
    let mut out = String::new();
    let mut current = Some(compiler);
    let mut depth = 0;
    while let Some(c) = current {
        let indent = "  ".repeat(depth);
        let _ = writeln!(
            out,
            "{indent}{} [{} {}] {}",
            c.absolute_path().display(),
            c.family().name(),
            c.role().keyword(),
            c.uid()
        );
        let flags = c.wrapper_flags();
        for (label, values) in [
            ("include", &flags.include_path),
            ("libpath", &flags.library_path),
            ("flags", &flags.compiler_flags),
            ("libs", &flags.libraries),
        ] {
            if !values.is_empty() {
                let _ = writeln!(out, "{indent}  {label}: {}", values.join(" "));
            }
        }
        current = c.wrapped().map(AsRef::as_ref);
        depth += 1;
    }
    out
}

pub fn describe_family(family: &InstalledCompilerFamily) -> String {
    if family.is_empty() {
        return format!("No {} compilers found\n", family.family().name());
    }
    let mut out = String::new();
    for (role, compiler) in family.iter() {
        let _ = writeln!(out, "{:<8} {}", role.keyword(), compiler.absolute_path().display());
    }
    out
}

pub fn describe_set(set: &InstalledCompilerSet) -> String {
    let mut out = String::new();
    for (role, compiler) in set.iter() {
        let _ = writeln!(
            out,
            "{:<8} {} ({})",
            role.keyword(),
            compiler.absolute_path().display(),
            compiler.family().name()
        );
    }
    let _ = writeln!(out, "uid      {}", set.uid());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use taucf_core::compiler::builtin::{CC, GNU, MPI_CC, SYSTEM_MPI};
    use taucf_core::{CompilerInfo, FamilyKind, WrapperFlags};

    #[test]
    fn test_role_listing_marks_required() {
        let kb = KnowledgeBase::builtin().unwrap();
        let lines = role_listing(&kb);
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("CC"));
        assert!(lines[0].ends_with("(required)"));
        assert!(!lines[3].ends_with("(required)"));
    }

    #[test]
    fn test_describe_wrapper_chain() {
        let kb = KnowledgeBase::builtin().unwrap();
        let gnu = kb.find_family(FamilyKind::Host, GNU).unwrap();
        let mpi = kb.find_family(FamilyKind::Mpi, SYSTEM_MPI).unwrap();
        let gcc = Arc::new(
            InstalledCompiler::new(PathBuf::from("/usr/bin/gcc"), CompilerInfo::new(gnu, CC, "gcc"), None)
                .unwrap(),
        );
        let flags = WrapperFlags {
            libraries: vec!["mpi".into()],
            ..WrapperFlags::default()
        };
        let mpicc = InstalledCompiler::new(
            PathBuf::from("/usr/bin/mpicc"),
            CompilerInfo::new(mpi, MPI_CC, "mpicc"),
            Some((gcc, flags)),
        )
        .unwrap();

        let text = describe_compiler(&mpicc);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("/usr/bin/mpicc [System MPI_CC]"));
        assert_eq!(lines[1], "  libs: mpi");
        assert!(lines[2].starts_with("  /usr/bin/gcc [GNU CC]"));
    }
}
