use crate::HashMap;
use std::{
    fmt,
    sync::{LazyLock, Mutex},
};

/// An interned string.
///
/// Atoms are compared by index which makes comparisons cheap.
/// The backing interner lives for the whole process and leaks its strings
/// which allows [`Self::to_str`] to hand out `&'static str`s.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(u32);

impl Atom {
    pub fn to_str(self) -> &'static str {
        Interner::the().lock().unwrap().get(self)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Interner::the().lock().unwrap().intern_borrowed(value)
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Interner::the().lock().unwrap().intern_owned(value)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

// No Ordering impls for Atom:
//
// * Comparison by index would be fast but highly unintuitive and in most cases not what
//   the user wants.
// * Comparison by string would be rather slow and the user should explicitly opt-in
//   via `Atom::to_str`.

struct Interner {
    atoms: HashMap<&'static str, Atom>,
    strings: Vec<&'static str>,
}

impl Interner {
    fn the() -> &'static Mutex<Self> {
        static SELF: LazyLock<Mutex<Interner>> = LazyLock::new(|| Mutex::new(Interner::new()));

        &SELF
    }

    fn new() -> Self {
        Self {
            atoms: HashMap::default(),
            strings: Vec::new(),
        }
    }

    fn intern_borrowed(&mut self, value: &str) -> Atom {
        if let Some(&atom) = self.atoms.get(value) {
            return atom;
        }

        self.insert(Box::leak(Box::from(value)))
    }

    fn intern_owned(&mut self, value: String) -> Atom {
        if let Some(&atom) = self.atoms.get(&*value) {
            return atom;
        }

        self.insert(String::leak(value))
    }

    fn insert(&mut self, value: &'static str) -> Atom {
        let atom = Atom(self.strings.len().try_into().unwrap());
        self.strings.push(value);
        self.atoms.insert(value, atom);
        atom
    }

    fn get(&self, atom: Atom) -> &'static str {
        self.strings[atom.0 as usize]
    }
}

#[cfg(test)]
mod test {
    use super::Atom;

    #[test]
    fn interning_is_idempotent() {
        assert_eq!(Atom::from("alpha"), Atom::from("alpha"));
        assert_eq!(Atom::from("alpha"), Atom::from(String::from("alpha")));
        assert_ne!(Atom::from("alpha"), Atom::from("beta"));
    }

    #[test]
    fn to_str_round_trips() {
        assert_eq!(Atom::from("gamma").to_str(), "gamma");
    }
}
