use kit_types::{ClassHierarchy, ClassId, ClassTable, Name, SigId, StringInterner, Ty};
use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::resolve_dynamic_targets;

/// A hierarchy given directly as subtype lists and a resolution table.
#[derive(Default)]
struct MockHierarchy {
    subtypes: FxHashMap<ClassId, Vec<ClassId>>,
    methods: FxHashMap<ClassId, SigId>,
}

impl ClassHierarchy for MockHierarchy {
    fn subtypes_of(&self, class: ClassId) -> SmallVec<[ClassId; 8]> {
        self.subtypes
            .get(&class)
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default()
    }

    fn resolve_method(&self, class: ClassId, _name: Name, _params: &[Ty]) -> Option<SigId> {
        self.methods.get(&class).copied()
    }
}

fn class(n: u32) -> ClassId {
    ClassId::new(n)
}

fn sig(n: u32) -> SigId {
    SigId::new(n)
}

#[test]
fn every_overriding_subtype_contributes() {
    let mut h = MockHierarchy::default();
    h.subtypes.insert(class(0), vec![class(0), class(1), class(2)]);
    h.methods.insert(class(0), sig(30));
    h.methods.insert(class(1), sig(10));
    h.methods.insert(class(2), sig(20));

    let targets = resolve_dynamic_targets(&h, class(0), Name::EMPTY, &[]);
    assert_eq!(targets.as_slice(), &[sig(10), sig(20), sig(30)]);
}

#[test]
fn inherited_implementations_are_deduplicated() {
    let mut h = MockHierarchy::default();
    h.subtypes.insert(class(0), vec![class(0), class(1), class(2), class(3)]);
    for c in 0..4 {
        h.methods.insert(class(c), sig(7));
    }

    let targets = resolve_dynamic_targets(&h, class(0), Name::EMPTY, &[]);
    assert_eq!(targets.as_slice(), &[sig(7)]);
}

#[test]
fn subtypes_without_a_match_contribute_nothing() {
    let mut h = MockHierarchy::default();
    h.subtypes.insert(class(0), vec![class(1), class(2)]);
    h.methods.insert(class(2), sig(4));

    let targets = resolve_dynamic_targets(&h, class(0), Name::EMPTY, &[]);
    assert_eq!(targets.as_slice(), &[sig(4)]);
}

#[test]
fn no_concrete_subtypes_gives_an_empty_set() {
    let h = MockHierarchy::default();
    assert!(resolve_dynamic_targets(&h, class(0), Name::EMPTY, &[]).is_empty());
}

#[test]
fn result_does_not_depend_on_subtype_order() {
    let mut forward = MockHierarchy::default();
    forward.subtypes.insert(class(0), vec![class(1), class(2), class(3)]);
    let mut backward = MockHierarchy::default();
    backward.subtypes.insert(class(0), vec![class(3), class(2), class(1)]);
    for h in [&mut forward, &mut backward] {
        h.methods.insert(class(1), sig(9));
        h.methods.insert(class(2), sig(3));
        h.methods.insert(class(3), sig(9));
    }

    assert_eq!(
        resolve_dynamic_targets(&forward, class(0), Name::EMPTY, &[]),
        resolve_dynamic_targets(&backward, class(0), Name::EMPTY, &[])
    );
}

#[test]
fn resolves_against_a_class_table() {
    let interner = StringInterner::new();
    let mut table = ClassTable::new(&interner);
    let speak = interner.intern("speak");

    let animal = table.add_abstract_class(interner.intern("Animal"), None);
    let dog = table.add_class(interner.intern("Dog"), Some(animal));
    let puppy = table.add_class(interner.intern("Puppy"), Some(dog));
    let cat = table.add_class(interner.intern("Cat"), Some(animal));

    let animal_speak = table.add_method(animal, speak, &[], Ty::Str);
    let dog_speak = table.add_method(dog, speak, &[], Ty::Str);
    let cat_speak = table.add_method(cat, speak, &[], Ty::Str);

    // Animal is abstract: its own body is never the run-time target.
    let from_animal = resolve_dynamic_targets(&table, animal, speak, &[]);
    assert_eq!(from_animal.as_slice(), &[dog_speak, cat_speak]);
    assert!(!from_animal.contains(&animal_speak));

    // Puppy inherits Dog's override.
    let from_puppy = resolve_dynamic_targets(&table, puppy, speak, &[]);
    assert_eq!(from_puppy.as_slice(), &[dog_speak]);

    // No match on parameter types: nothing to call.
    assert!(resolve_dynamic_targets(&table, animal, speak, &[Ty::Int]).is_empty());
}
