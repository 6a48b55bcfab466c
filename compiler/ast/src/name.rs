use std::fmt;
use utility::Atom;

/// The package every unit implicitly depends on.
pub const BUILTIN_PACK: &str = "builtin";

/// A fully qualified name.
///
/// A name is *standalone* iff both the package and the namespace are absent;
/// only standalone names are candidates for local-scope and type-variable
/// lookup.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name {
    pub pack: Option<Atom>,
    pub ns: Option<Atom>,
    pub local: Atom,
}

impl Name {
    pub fn standalone(local: impl Into<Atom>) -> Self {
        Self {
            pack: None,
            ns: None,
            local: local.into(),
        }
    }

    /// A name inside the builtin package.
    pub fn builtin(local: impl Into<Atom>) -> Self {
        Self {
            pack: Some(Atom::from(BUILTIN_PACK)),
            ns: None,
            local: local.into(),
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.pack.is_none() && self.ns.is_none()
    }

    /// Promote the name into the given package.
    #[must_use]
    pub fn pack(mut self, pack: Atom) -> Self {
        self.pack = Some(pack);
        self
    }

    /// Strip the package off the name.
    #[must_use]
    pub fn unpack(mut self) -> Self {
        self.pack = None;
        self
    }

    /// Place the name inside the given namespace.
    #[must_use]
    pub fn in_ns(mut self, ns: Atom) -> Self {
        self.ns = Some(ns);
        self
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pack) = self.pack {
            write!(f, "@{pack}::")?;
        }
        if let Some(ns) = self.ns {
            write!(f, "{ns}::")?;
        }
        write!(f, "{}", self.local)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::Name;
    use utility::Atom;

    #[test]
    fn standalone_names() {
        let name = Name::standalone("item");
        assert!(name.is_standalone());
        assert!(!name.pack(Atom::from("pack")).is_standalone());
    }

    #[test]
    fn packing_round_trips() {
        let name = Name::standalone("item").pack(Atom::from("pack"));
        assert_eq!(name.unpack(), Name::standalone("item"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Name::standalone("item").to_string(), "item");
        assert_eq!(Name::builtin("Int").to_string(), "@builtin::Int");
        assert_eq!(
            Name::builtin("push").in_ns(Atom::from("Array")).to_string(),
            "@builtin::Array::push",
        );
    }
}
