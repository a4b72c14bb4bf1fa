//! Human readable rendering of attenuations.
//!
//! The rendering is a pure function of the attenuation map, so a verifier
//! can recompute it and compare it with the statement a user signed.

use crate::Attenuations;

/// Fixed opening sentence of every rendered statement.
pub const STATEMENT_PREAMBLE: &str =
    "I further authorize the stated URI to perform the following actions on my behalf: ";

/// Renders `att` as a numbered list of clauses.
///
/// Resources are visited in ascending order and their abilities are grouped
/// by namespace, one clause per group. Clause numbers run across the whole
/// statement:
///
/// ```text
/// I further authorize the stated URI to perform the following actions on my
/// behalf: (1) "crud": "read" for "https://example.com". (2) "kv": "read",
/// "write" for "kepler:example://default/kv".
/// ```
#[must_use]
pub fn render_statement(att: &Attenuations) -> String {
    let mut statement = String::from(STATEMENT_PREAMBLE);
    let mut section = 1;

    for (resource, abilities) in att {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for ability in abilities.keys() {
            match groups.last_mut() {
                Some((namespace, names)) if *namespace == ability.namespace() => {
                    names.push(ability.name());
                }
                _ => groups.push((ability.namespace(), vec![ability.name()])),
            }
        }

        for (namespace, names) in groups {
            let names = names
                .iter()
                .map(|name| format!("\"{name}\""))
                .collect::<Vec<_>>()
                .join(", ");
            statement.push_str(&format!(
                "({section}) \"{namespace}\": {names} for \"{resource}\". "
            ));
            section += 1;
        }
    }

    statement
}
