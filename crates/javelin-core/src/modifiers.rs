use std::fmt;

use bitflags::bitflags;

/// JVM `access_flags` bits (JVMS §4.1, §4.5, §4.6).
///
/// Several bits are overloaded; their meaning depends on whether they are read
/// from a class, a field or a method. See [`ModifierSet::from_access_flags`].
pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    /// `ACC_SUPER` on classes.
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    /// `ACC_BRIDGE` on methods.
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_BRIDGE: u16 = 0x0040;
    /// `ACC_VARARGS` on methods.
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MODULE: u16 = 0x8000;
}

/// Java access level. `Package` is the absence of an access keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessSpecifier {
    Private,
    Package,
    Protected,
    Public,
}

impl AccessSpecifier {
    pub fn keyword(self) -> &'static str {
        match self {
            AccessSpecifier::Private => "private",
            AccessSpecifier::Package => "",
            AccessSpecifier::Protected => "protected",
            AccessSpecifier::Public => "public",
        }
    }
}

impl fmt::Display for AccessSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single source-level modifier keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Synchronized,
    Volatile,
    Transient,
    Native,
    Strictfp,
    Default,
    Sealed,
    NonSealed,
}

impl Modifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "static" => Modifier::Static,
            "final" => Modifier::Final,
            "abstract" => Modifier::Abstract,
            "synchronized" => Modifier::Synchronized,
            "volatile" => Modifier::Volatile,
            "transient" => Modifier::Transient,
            "native" => Modifier::Native,
            "strictfp" => Modifier::Strictfp,
            "default" => Modifier::Default,
            "sealed" => Modifier::Sealed,
            "non-sealed" => Modifier::NonSealed,
            _ => return None,
        })
    }

    fn flag(self) -> ModifierSet {
        match self {
            Modifier::Public => ModifierSet::PUBLIC,
            Modifier::Protected => ModifierSet::PROTECTED,
            Modifier::Private => ModifierSet::PRIVATE,
            Modifier::Static => ModifierSet::STATIC,
            Modifier::Final => ModifierSet::FINAL,
            Modifier::Abstract => ModifierSet::ABSTRACT,
            Modifier::Synchronized => ModifierSet::SYNCHRONIZED,
            Modifier::Volatile => ModifierSet::VOLATILE,
            Modifier::Transient => ModifierSet::TRANSIENT,
            Modifier::Native => ModifierSet::NATIVE,
            Modifier::Strictfp => ModifierSet::STRICTFP,
            Modifier::Default => ModifierSet::DEFAULT,
            Modifier::Sealed => ModifierSet::SEALED,
            Modifier::NonSealed => ModifierSet::NON_SEALED,
        }
    }
}

bitflags! {
    /// Modifiers of a declaration, independent of where it was read from.
    ///
    /// Classfile-only properties (`SYNTHETIC`, `BRIDGE`, `VARARGS`, `ENUM`) are
    /// tracked here too so providers can share one representation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierSet: u32 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const SYNCHRONIZED = 1 << 6;
        const VOLATILE = 1 << 7;
        const TRANSIENT = 1 << 8;
        const NATIVE = 1 << 9;
        const STRICTFP = 1 << 10;
        const DEFAULT = 1 << 11;
        const SEALED = 1 << 12;
        const NON_SEALED = 1 << 13;

        const SYNTHETIC = 1 << 16;
        const BRIDGE = 1 << 17;
        const VARARGS = 1 << 18;
        const ENUM = 1 << 19;
    }
}

/// Which kind of classfile entity an `access_flags` word belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Class,
    Field,
    Method,
}

impl ModifierSet {
    pub fn from_modifiers(modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        modifiers
            .into_iter()
            .fold(ModifierSet::empty(), |acc, m| acc | m.flag())
    }

    pub fn has(self, modifier: Modifier) -> bool {
        self.contains(modifier.flag())
    }

    /// Interpret a JVM `access_flags` word.
    pub fn from_access_flags(flags: u16, kind: MemberKind) -> Self {
        use access_flags::*;

        let mut out = ModifierSet::empty();
        let mut set = |bit: u16, flag: ModifierSet| {
            if flags & bit != 0 {
                out |= flag;
            }
        };

        set(ACC_PUBLIC, ModifierSet::PUBLIC);
        set(ACC_PRIVATE, ModifierSet::PRIVATE);
        set(ACC_PROTECTED, ModifierSet::PROTECTED);
        set(ACC_STATIC, ModifierSet::STATIC);
        set(ACC_FINAL, ModifierSet::FINAL);
        set(ACC_SYNTHETIC, ModifierSet::SYNTHETIC);
        set(ACC_ENUM, ModifierSet::ENUM);
        set(ACC_ABSTRACT, ModifierSet::ABSTRACT);

        match kind {
            MemberKind::Class => {}
            MemberKind::Field => {
                set(ACC_VOLATILE, ModifierSet::VOLATILE);
                set(ACC_TRANSIENT, ModifierSet::TRANSIENT);
            }
            MemberKind::Method => {
                set(ACC_SYNCHRONIZED, ModifierSet::SYNCHRONIZED);
                set(ACC_BRIDGE, ModifierSet::BRIDGE);
                set(ACC_VARARGS, ModifierSet::VARARGS);
                set(ACC_NATIVE, ModifierSet::NATIVE);
                set(ACC_STRICT, ModifierSet::STRICTFP);
            }
        }
        out
    }

    /// The declared access level. Returns `Package` when no access bit is set.
    pub fn access(self) -> AccessSpecifier {
        if self.contains(ModifierSet::PUBLIC) {
            AccessSpecifier::Public
        } else if self.contains(ModifierSet::PROTECTED) {
            AccessSpecifier::Protected
        } else if self.contains(ModifierSet::PRIVATE) {
            AccessSpecifier::Private
        } else {
            AccessSpecifier::Package
        }
    }

    pub fn is_static(self) -> bool {
        self.contains(ModifierSet::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(ModifierSet::FINAL)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(ModifierSet::ABSTRACT)
    }

    pub fn is_synthetic(self) -> bool {
        self.contains(ModifierSet::SYNTHETIC)
    }
}

#[cfg(test)]
mod tests {
    use super::access_flags::*;
    use super::*;

    #[test]
    fn overloaded_bits_depend_on_member_kind() {
        let flags = ACC_PUBLIC | ACC_VARARGS | ACC_BRIDGE;
        let method = ModifierSet::from_access_flags(flags, MemberKind::Method);
        assert!(method.contains(ModifierSet::VARARGS | ModifierSet::BRIDGE));
        assert!(!method.contains(ModifierSet::TRANSIENT));

        let field = ModifierSet::from_access_flags(flags, MemberKind::Field);
        assert!(field.contains(ModifierSet::TRANSIENT | ModifierSet::VOLATILE));
        assert!(!field.contains(ModifierSet::VARARGS));
    }

    #[test]
    fn class_super_bit_is_not_synchronized() {
        let class = ModifierSet::from_access_flags(ACC_PUBLIC | ACC_SYNCHRONIZED, MemberKind::Class);
        assert_eq!(class, ModifierSet::PUBLIC);
    }

    #[test]
    fn access_defaults_to_package() {
        assert_eq!(ModifierSet::STATIC.access(), AccessSpecifier::Package);
        assert_eq!(
            ModifierSet::from_modifiers([Modifier::Protected, Modifier::Final]).access(),
            AccessSpecifier::Protected
        );
    }

    #[test]
    fn modifier_keywords_round_trip() {
        for kw in ["public", "static", "final", "non-sealed", "default"] {
            let m = Modifier::from_keyword(kw).unwrap();
            assert!(ModifierSet::from_modifiers([m]).has(m));
        }
        assert_eq!(Modifier::from_keyword("class"), None);
    }
}
