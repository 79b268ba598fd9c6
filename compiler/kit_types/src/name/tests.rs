use super::*;

#[test]
fn empty_string_is_pre_interned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
    assert_eq!(interner.len(), 1);
}

#[test]
fn interning_is_idempotent() {
    let interner = StringInterner::new();
    let a = interner.intern("toString");
    let b = interner.intern("toString");
    assert_eq!(a, b);
    assert_eq!(interner.len(), 2);
}

#[test]
fn distinct_strings_get_distinct_names() {
    let interner = StringInterner::new();
    let a = interner.intern("Animal");
    let b = interner.intern("Dog");
    assert_ne!(a, b);
    assert_eq!(interner.lookup(a), "Animal");
    assert_eq!(interner.lookup(b), "Dog");
}

#[test]
fn foreign_name_resolves_to_empty() {
    let interner = StringInterner::new();
    assert_eq!(interner.lookup(Name::from_raw(99)), "");
}
