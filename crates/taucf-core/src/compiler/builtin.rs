//! Built-in compiler roles and families.

use super::{CompilerFamily, CompilerRole, FamilyKind, KnowledgeBase};
use crate::error::CfResult;

pub const CC: CompilerRole = CompilerRole::new("CC", "C", true);
pub const CXX: CompilerRole = CompilerRole::new("CXX", "C++", true);
pub const FC: CompilerRole = CompilerRole::new("FC", "Fortran", true);
pub const MPI_CC: CompilerRole = CompilerRole::new("MPI_CC", "MPI C", false);
pub const MPI_CXX: CompilerRole = CompilerRole::new("MPI_CXX", "MPI C++", false);
pub const MPI_FC: CompilerRole = CompilerRole::new("MPI_FC", "MPI Fortran", false);

/// Host-compiler roles.
pub const HOST_ROLES: [CompilerRole; 3] = [CC, CXX, FC];

/// MPI wrapper roles.
pub const MPI_ROLES: [CompilerRole; 3] = [MPI_CC, MPI_CXX, MPI_FC];

// Host family names referenced elsewhere (package recipes, host defaults).
pub const GNU: &str = "GNU";
pub const INTEL: &str = "Intel";
pub const PGI: &str = "PGI";
pub const IBM: &str = "IBM";
pub const CRAY: &str = "Cray";
pub const LLVM: &str = "LLVM";
pub const APPLE: &str = "Apple";

// MPI family names.
pub const SYSTEM_MPI: &str = "System";

fn host_families() -> Vec<CompilerFamily> {
    vec![
        CompilerFamily::new(GNU, FamilyKind::Host)
            .with_members(CC, &["gcc"])
            .with_members(CXX, &["g++"])
            .with_members(FC, &["gfortran", "g77"])
            .with_signature(&["--version"], r"Free Software Foundation"),
        CompilerFamily::new(INTEL, FamilyKind::Host)
            .with_members(CC, &["icc"])
            .with_members(CXX, &["icpc"])
            .with_members(FC, &["ifort"])
            .with_signature(&["--version"], r"Intel(?:\(R\))? Corporation"),
        CompilerFamily::new(PGI, FamilyKind::Host)
            .with_members(CC, &["pgcc"])
            .with_members(CXX, &["pgCC", "pgc++", "pgcxx"])
            .with_members(FC, &["pgfortran", "pgf90", "pgf77"])
            .with_signature(&["-V"], r"The Portland Group|PGI Compilers"),
        CompilerFamily::new(IBM, FamilyKind::Host)
            .with_members(CC, &["xlc", "xlc_r"])
            .with_members(CXX, &["xlC", "xlc++", "xlC_r"])
            .with_members(FC, &["xlf", "xlf_r", "xlf90", "xlf95"])
            .with_signature(&["-qversion"], r"IBM XL"),
        CompilerFamily::new(CRAY, FamilyKind::Host)
            .with_members(CC, &["cc"])
            .with_members(CXX, &["CC"])
            .with_members(FC, &["ftn"])
            .with_wrapper_flags(&["-craype-verbose"])
            .with_signature(&["-V"], r"Cray (?:C|C\+\+|Fortran)"),
        CompilerFamily::new(LLVM, FamilyKind::Host)
            .with_members(CC, &["clang"])
            .with_members(CXX, &["clang++"])
            .with_members(FC, &["flang", "flang-new"])
            .with_signature(
                &["--version"],
                r"(?m)^(?:Ubuntu |Debian |Homebrew )?clang version",
            ),
        CompilerFamily::new(APPLE, FamilyKind::Host)
            .with_members(CC, &["clang", "cc", "gcc"])
            .with_members(CXX, &["clang++", "c++", "g++"])
            .with_signature(&["--version"], r"Apple (?:LLVM|clang) version"),
    ]
}

fn mpi_families() -> Vec<CompilerFamily> {
    vec![
        CompilerFamily::mpi(SYSTEM_MPI)
            .with_members(MPI_CC, &["mpicc"])
            .with_members(MPI_CXX, &["mpic++", "mpicxx", "mpiCC"])
            .with_members(MPI_FC, &["mpiftn", "mpif90", "mpif77"]),
        CompilerFamily::mpi(INTEL)
            .with_members(MPI_CC, &["mpiicc"])
            .with_members(MPI_CXX, &["mpiicpc"])
            .with_members(MPI_FC, &["mpiifort"]),
        CompilerFamily::mpi(IBM)
            .with_members(MPI_CC, &["mpixlc"])
            .with_members(MPI_CXX, &["mpixlc++", "mpixlC"])
            .with_members(MPI_FC, &["mpixlf77"]),
        CompilerFamily::mpi(CRAY)
            .with_wrapper_flags(&["-craype-verbose"])
            .with_members(MPI_CC, &["cc"])
            .with_members(MPI_CXX, &["CC"])
            .with_members(MPI_FC, &["ftn"]),
    ]
}

impl KnowledgeBase {
    /// The knowledge base of every compiler taucf knows about.
    pub fn builtin() -> CfResult<Self> {
        let mut kb = Self::new();
        for role in HOST_ROLES.into_iter().chain(MPI_ROLES) {
            kb.register_role(role)?;
        }
        for family in host_families().into_iter().chain(mpi_families()) {
            kb.register_family(family)?;
        }
        Ok(kb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registers_everything() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(
            kb.role_keywords(),
            ["CC", "CXX", "FC", "MPI_CC", "MPI_CXX", "MPI_FC"]
        );
        assert_eq!(kb.required_roles().len(), 3);
        assert_eq!(
            kb.family_names(FamilyKind::Mpi),
            ["System", "Intel", "IBM", "Cray"]
        );
        assert!(kb.family_names(FamilyKind::Host).contains(&"PGI"));
    }

    #[test]
    fn test_builtin_signatures_compile() {
        let kb = KnowledgeBase::builtin().unwrap();
        for family in kb.families(None) {
            assert!(family.signature_matches("").is_ok(), "{}", family.name());
        }
    }

    #[test]
    fn test_system_mpi_aliases_in_preference_order() {
        let kb = KnowledgeBase::builtin().unwrap();
        let system = kb.find_family(FamilyKind::Mpi, SYSTEM_MPI).unwrap();
        assert_eq!(system.aliases(MPI_CXX), ["mpic++", "mpicxx", "mpiCC"]);
        assert_eq!(system.show_wrapper_flags(), ["-show"]);
    }

    #[test]
    fn test_llvm_and_apple_signatures_do_not_overlap() {
        let kb = KnowledgeBase::builtin().unwrap();
        let llvm = kb.find_family(FamilyKind::Host, LLVM).unwrap();
        let apple = kb.find_family(FamilyKind::Host, APPLE).unwrap();
        let apple_banner = "Apple clang version 15.0.0 (clang-1500.1.0.2.5)";
        let ubuntu_banner = "Ubuntu clang version 14.0.0-1ubuntu1";
        assert!(apple.signature_matches(apple_banner).unwrap());
        assert!(!llvm.signature_matches(apple_banner).unwrap());
        assert!(llvm.signature_matches(ubuntu_banner).unwrap());
    }
}
