#![no_main]

use libfuzzer_sys::arbitrary;
use libfuzzer_sys::fuzz_target;
use tablelock::sql::{IdentifierRegistry, MAX_IDENTIFIER};

#[derive(arbitrary::Arbitrary, Debug)]
enum IdentifierMethod {
    Intern { text: String, quoted: bool },
    Decode { bytes: Vec<u8> },
}

fuzz_target!(|methods: Vec<IdentifierMethod>| {
    let registry = IdentifierRegistry::new();

    use IdentifierMethod::*;
    for method in methods {
        match method {
            Intern { text, quoted } => {
                let id = registry.intern(&text, quoted);
                if quoted {
                    assert!(!id.is_reserved());
                } else if text.is_ascii() {
                    assert_eq!(registry.intern(&text.to_ascii_uppercase(), false), id);
                }
                assert_eq!(registry.intern(&text, quoted), id);
                assert!(registry.name(id).unwrap().len() <= MAX_IDENTIFIER);
                assert_eq!(registry.decode(&registry.encode(id)).unwrap(), id);
            }
            Decode { bytes } => {
                if let Ok(id) = registry.decode(&bytes) {
                    assert_eq!(registry.decode(&registry.encode(id)).unwrap(), id);
                }
            }
        }
    }
});
