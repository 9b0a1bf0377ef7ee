//! GML export, for graph viewers such as Gephi or yEd.
//!
//! GML node ids are integers, so records are numbered in address order
//! and the address goes into the `label` attribute. String and number
//! attributes are copied onto the node; lists and objects are not
//! representable and are skipped. Edges towards addresses outside the
//! dump are dropped.

use crate::domain::Address;
use crate::snapshot::Dump;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, Write};

/// Write `dump` as a GML graph.
///
/// # Errors
///
/// Returns the first error reported by `w`.
pub fn write_gml<W: Write>(dump: &Dump, w: &mut W) -> io::Result<()> {
    let ids: HashMap<&Address, usize> = dump.addresses().zip(0..).collect();

    writeln!(w, "graph")?;
    writeln!(w, "[")?;
    writeln!(w, "  directed 1")?;

    for (record, id) in dump.each_record().zip(0usize..) {
        writeln!(w, "  node")?;
        writeln!(w, "  [")?;
        writeln!(w, "    id {id}")?;
        writeln!(w, "    label \"{}\"", escape(record.address.as_str()))?;

        let fields = serde_json::to_value(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Value::Object(fields) = fields {
            for (key, value) in &fields {
                let key = gml_key(key);
                if key.is_empty() || key == "id" || key == "label" {
                    continue;
                }
                match value {
                    Value::String(s) => writeln!(w, "    {key} \"{}\"", escape(s))?,
                    Value::Number(n) => writeln!(w, "    {key} {n}")?,
                    _ => {}
                }
            }
        }
        writeln!(w, "  ]")?;
    }

    let mut skipped = 0usize;
    for record in dump.each_record() {
        let Some(&source) = ids.get(&record.address) else {
            continue;
        };
        for reference in &record.references {
            let Some(target) = ids.get(reference) else {
                skipped += 1;
                continue;
            };
            writeln!(w, "  edge")?;
            writeln!(w, "  [")?;
            writeln!(w, "    source {source}")?;
            writeln!(w, "    target {target}")?;
            writeln!(w, "  ]")?;
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "dropped edges to addresses outside the dump");
    }

    writeln!(w, "]")
}

/// Render `dump` as a GML string.
///
/// # Errors
///
/// Returns an error if a record cannot be converted to JSON.
pub fn render_gml(dump: &Dump) -> io::Result<String> {
    let mut buffer = Vec::new();
    write_gml(dump, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// GML keys are alphanumeric and start with a letter.
fn gml_key(key: &str) -> String {
    key.chars()
        .filter(char::is_ascii_alphanumeric)
        .skip_while(char::is_ascii_digit)
        .collect()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}
