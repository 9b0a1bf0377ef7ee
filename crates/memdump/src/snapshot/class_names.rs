//! Class-name resolution.

use super::Dump;
use crate::domain::{Address, TYPE_CLASS, TYPE_ICLASS, TYPE_MODULE};
use std::collections::HashMap;

impl Dump {
    /// Replace class addresses by class names.
    ///
    /// `CLASS` and `MODULE` records name themselves. An `ICLASS` record is
    /// named `I(<name>)` after the class it points to, which may itself be
    /// an `ICLASS`: chains of any length are resolved. Every record with a
    /// class gets that name in `class` (the raw address when unresolved),
    /// the address in `class_address`, and with `add_reference_to_class`,
    /// a reference to the class.
    ///
    /// Running it again on its own output changes nothing: the lookup uses
    /// `class_address` when it is already set.
    #[must_use]
    pub fn resolve_class_names(&self, add_reference_to_class: bool) -> Dump {
        let names = self.class_names();

        self.map(|mut record| {
            let Some(class_address) = record
                .class_address
                .clone()
                .or_else(|| record.class.clone().map(Address::from))
            else {
                return record;
            };

            let name = if record.is_type(TYPE_ICLASS) {
                names
                    .get(&record.address)
                    .cloned()
                    .unwrap_or_else(|| iclass_name(lookup(&names, &class_address)))
            } else {
                lookup(&names, &class_address).to_string()
            };

            record.class = Some(name);
            if add_reference_to_class {
                record.references.insert(class_address.clone());
            }
            record.class_address = Some(class_address);
            record
        })
    }

    /// Names of every class, module and resolvable indirection class.
    fn class_names(&self) -> HashMap<Address, String> {
        let mut names: HashMap<Address, String> = self
            .each_record()
            .filter(|r| r.is_type(TYPE_CLASS) || r.is_type(TYPE_MODULE))
            .filter_map(|r| Some((r.address.clone(), r.name.clone()?)))
            .collect();

        let mut pending: Vec<(&Address, Address)> = self
            .each_record()
            .filter(|r| r.is_type(TYPE_ICLASS))
            .filter_map(|r| {
                let target = r
                    .class_address
                    .clone()
                    .or_else(|| r.class.clone().map(Address::from))?;
                Some((&r.address, target))
            })
            .collect();

        let mut round = 0usize;
        loop {
            round += 1;
            let before = pending.len();
            pending.retain(|(address, target)| match names.get(target) {
                Some(name) => {
                    let name = iclass_name(name);
                    names.insert((*address).clone(), name);
                    false
                }
                None => true,
            });
            tracing::debug!(round, resolved = before - pending.len(), "resolving ICLASS names");
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
        if !pending.is_empty() {
            tracing::debug!(unresolved = pending.len(), "ICLASS records without a named class");
        }

        names
    }
}

fn lookup<'a>(names: &'a HashMap<Address, String>, address: &'a Address) -> &'a str {
    names.get(address).map_or(address.as_str(), String::as_str)
}

fn iclass_name(name: &str) -> String {
    format!("I({name})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::snapshot::fixtures::refs;

    fn classes() -> Dump {
        Dump::from_records([
            Record::new("0xc").with_type(TYPE_CLASS).with_name("String"),
            Record::new("0xm").with_type(TYPE_MODULE).with_name("Comparable"),
            Record::new("0xi1").with_type(TYPE_ICLASS).with_class("0xm"),
            Record::new("0xi2").with_type(TYPE_ICLASS).with_class("0xi1"),
            Record::new("0xs").with_type("STRING").with_class("0xc"),
            Record::new("0xo").with_type("OBJECT").with_class("0xi2"),
            Record::new("0xu").with_type("OBJECT").with_class("0xunknown"),
        ])
    }

    fn class_of<'a>(dump: &'a Dump, address: &str) -> Option<&'a str> {
        dump.find_by_address(address)?.class.as_deref()
    }

    #[test]
    fn resolves_classes_and_iclass_chains() {
        let result = classes().resolve_class_names(false);
        assert_eq!(class_of(&result, "0xs"), Some("String"));
        assert_eq!(class_of(&result, "0xi1"), Some("I(Comparable)"));
        assert_eq!(class_of(&result, "0xi2"), Some("I(I(Comparable))"));
        assert_eq!(class_of(&result, "0xo"), Some("I(I(Comparable))"));
        assert_eq!(
            result.find_by_address("0xs").unwrap().class_address,
            Some(Address::new("0xc"))
        );
    }

    #[test]
    fn unresolved_class_keeps_its_address() {
        let result = classes().resolve_class_names(false);
        assert_eq!(class_of(&result, "0xu"), Some("0xunknown"));
        assert!(class_of(&result, "0xc").is_none());
    }

    #[test]
    fn optionally_references_the_class() {
        let dump = classes();
        assert!(refs(&dump.resolve_class_names(false), "0xs").is_empty());
        assert_eq!(refs(&dump.resolve_class_names(true), "0xs"), ["0xc"]);
    }

    #[test]
    fn resolution_is_idempotent() {
        let once = classes().resolve_class_names(true);
        assert_eq!(once.resolve_class_names(true), once);
    }
}
