//! The closed-world class hierarchy.
//!
//! [`ClassTable`] owns every class and every code [`Signature`] of the
//! program. Lowering queries it through [`ClassHierarchy`] when it builds a
//! virtual call site; nothing in the IR mutates it.
//!
//! Superclasses must be declared before their subclasses, so class IDs are a
//! topological order of the hierarchy and superclass chains cannot cycle.

use smallvec::SmallVec;

use crate::signature::{CodeKind, Signature};
use crate::{ClassId, Name, SigId, StringInterner, Ty};

/// Query interface over the class hierarchy.
///
/// Implementations must be pure and stable for the duration of one
/// compilation.
pub trait ClassHierarchy {
    /// Every concrete class that is `class` or one of its subclasses.
    fn subtypes_of(&self, class: ClassId) -> SmallVec<[ClassId; 8]>;

    /// Method lookup by name and exact parameter types, starting at `class`
    /// and walking up its superclass chain.
    fn resolve_method(&self, class: ClassId, name: Name, params: &[Ty]) -> Option<SigId>;
}

/// A class declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: Name,
    pub superclass: Option<ClassId>,
    /// Abstract classes are never instantiated, so they are not concrete
    /// subtypes of anything.
    pub is_abstract: bool,
    pub fields: Vec<(Name, Ty)>,
    pub methods: Vec<SigId>,
    pub constructors: Vec<SigId>,
    pub tests: Vec<SigId>,
    pub fixtures: Vec<SigId>,
}

/// All classes and signatures of a program.
pub struct ClassTable {
    classes: Vec<ClassInfo>,
    signatures: Vec<Signature>,
    init_name: Name,
    next_fixture: u32,
}

impl ClassTable {
    /// Create an empty table. The interner provides the constructor name.
    pub fn new(interner: &StringInterner) -> Self {
        Self {
            classes: Vec::new(),
            signatures: Vec::new(),
            init_name: interner.intern("<init>"),
            next_fixture: 0,
        }
    }

    // Declarations

    /// Declare a concrete class.
    pub fn add_class(&mut self, name: Name, superclass: Option<ClassId>) -> ClassId {
        self.push_class(name, superclass, false)
    }

    /// Declare an abstract class.
    pub fn add_abstract_class(&mut self, name: Name, superclass: Option<ClassId>) -> ClassId {
        self.push_class(name, superclass, true)
    }

    fn push_class(&mut self, name: Name, superclass: Option<ClassId>, is_abstract: bool) -> ClassId {
        let id = ClassId::new(
            u32::try_from(self.classes.len())
                .unwrap_or_else(|_| panic!("class count exceeds u32::MAX")),
        );
        debug_assert!(
            superclass.map_or(true, |s| s < id),
            "superclass must be declared before its subclass"
        );
        self.classes.push(ClassInfo {
            name,
            superclass,
            is_abstract,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            tests: Vec::new(),
            fixtures: Vec::new(),
        });
        id
    }

    pub fn add_field(&mut self, class: ClassId, name: Name, ty: Ty) {
        self.classes[class.index()].fields.push((name, ty));
    }

    pub fn add_method(&mut self, class: ClassId, name: Name, params: &[Ty], returns: Ty) -> SigId {
        let sig = self.push_signature(class, name, params, CodeKind::Method { returns });
        self.classes[class.index()].methods.push(sig);
        sig
    }

    pub fn add_constructor(&mut self, class: ClassId, params: &[Ty]) -> SigId {
        let sig = self.push_signature(class, self.init_name, params, CodeKind::Constructor);
        self.classes[class.index()].constructors.push(sig);
        sig
    }

    pub fn add_test(&mut self, class: ClassId, name: Name) -> SigId {
        let sig = self.push_signature(class, name, &[], CodeKind::Test);
        self.classes[class.index()].tests.push(sig);
        sig
    }

    /// Declare a fixture. Fixtures are anonymous in source; they are named
    /// `fixture0`, `fixture1`, ... in declaration order across the table.
    pub fn add_fixture(&mut self, interner: &StringInterner, class: ClassId) -> SigId {
        let name = interner.intern(&format!("fixture{}", self.next_fixture));
        self.next_fixture += 1;
        let sig = self.push_signature(class, name, &[], CodeKind::Fixture);
        self.classes[class.index()].fixtures.push(sig);
        sig
    }

    fn push_signature(&mut self, class: ClassId, name: Name, params: &[Ty], kind: CodeKind) -> SigId {
        let id = SigId::new(
            u32::try_from(self.signatures.len())
                .unwrap_or_else(|_| panic!("signature count exceeds u32::MAX")),
        );
        self.signatures.push(Signature {
            class,
            name,
            params: params.iter().copied().collect(),
            kind,
        });
        id
    }

    // Queries

    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.index()]
    }

    #[inline]
    pub fn signature(&self, id: SigId) -> &Signature {
        &self.signatures[id.index()]
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn num_signatures(&self) -> usize {
        self.signatures.len()
    }

    /// All class IDs in declaration order.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(|i| ClassId::new(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// All signature IDs in declaration order.
    pub fn signature_ids(&self) -> impl Iterator<Item = SigId> + '_ {
        (0..self.signatures.len()).map(|i| SigId::new(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    pub fn find_class(&self, name: Name) -> Option<ClassId> {
        self.class_ids().find(|&id| self.class(id).name == name)
    }

    /// The class itself followed by its superclasses, nearest first.
    pub fn ancestors(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::successors(Some(class), move |&c| self.class(c).superclass)
    }

    /// Whether `sub` is `sup` or one of its (transitive) subclasses.
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        self.ancestors(sub).any(|c| c == sup)
    }

    /// Field type lookup, walking up the superclass chain.
    pub fn field_type(&self, class: ClassId, name: Name) -> Option<Ty> {
        self.ancestors(class).find_map(|c| {
            self.class(c)
                .fields
                .iter()
                .find(|(n, _)| *n == name)
                .map(|&(_, ty)| ty)
        })
    }

    /// Constructor lookup. Constructors are not inherited.
    pub fn constructor_lookup(&self, class: ClassId, params: &[Ty]) -> Option<SigId> {
        self.class(class)
            .constructors
            .iter()
            .copied()
            .find(|&sig| self.signature(sig).params.as_slice() == params)
    }

    /// The fixtures that run before each test of `class`: inherited fixtures
    /// first, then the class's own, each in declaration order.
    pub fn fixtures_lookup(&self, class: ClassId) -> Vec<SigId> {
        let chain: SmallVec<[ClassId; 8]> = self.ancestors(class).collect();
        chain
            .iter()
            .rev()
            .flat_map(|&c| self.class(c).fixtures.iter().copied())
            .collect()
    }

    pub fn tests_of(&self, class: ClassId) -> &[SigId] {
        &self.class(class).tests
    }
}

impl ClassHierarchy for ClassTable {
    fn subtypes_of(&self, class: ClassId) -> SmallVec<[ClassId; 8]> {
        // Subclasses always have larger IDs than their superclasses.
        self.class_ids()
            .skip(class.index())
            .filter(|&c| !self.class(c).is_abstract && self.is_subclass(c, class))
            .collect()
    }

    fn resolve_method(&self, class: ClassId, name: Name, params: &[Ty]) -> Option<SigId> {
        self.ancestors(class).find_map(|c| {
            self.class(c)
                .methods
                .iter()
                .copied()
                .find(|&sig| self.signature(sig).matches(name, params))
        })
    }
}
