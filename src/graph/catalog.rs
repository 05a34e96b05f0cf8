//! Parts catalog lookup for the add-part search box, and the part ids that
//! quote warnings refer to.

use serde::{Deserialize, Serialize};

/// One orderable part from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Part {
	/// Item ID as the service spells it.
	pub id: String,
	/// Free-text description, possibly empty.
	#[serde(default)]
	pub description: String,
}

/// Lowercase with whitespace and hyphens removed, so "LLG-3 mm" matches
/// "llg3mm".
pub fn normalize(text: &str) -> String {
	text.chars()
		.filter(|c| !c.is_whitespace() && *c != '-')
		.flat_map(char::to_lowercase)
		.collect()
}

/// Parts whose normalized id or description contains the normalized query.
/// An empty query matches nothing.
pub fn search<'a>(parts: &'a [Part], query: &str) -> Vec<&'a Part> {
	let needle = normalize(query);
	if needle.is_empty() {
		return Vec::new();
	}
	parts
		.iter()
		.filter(|p| normalize(&p.id).contains(&needle) || normalize(&p.description).contains(&needle))
		.collect()
}

/// The part id named in a warning, taken from its first parenthesized group.
pub fn warning_part_id(warning: &str) -> Option<&str> {
	let open = warning.find('(')?;
	let rest = &warning[open + 1..];
	let close = rest.find(')')?;
	let id = &rest[..close];
	(!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn catalog() -> Vec<Part> {
		vec![
			Part {
				id: "LLG-3".into(),
				description: "Liquid light guide 3 mm".into(),
			},
			Part {
				id: "SOLA-SE".into(),
				description: "Sola light engine".into(),
			},
		]
	}

	#[test]
	fn search_ignores_spaces_hyphens_and_case() {
		let parts = catalog();
		let hits: Vec<&str> = search(&parts, "llg3").iter().map(|p| p.id.as_str()).collect();
		assert_eq!(hits, vec!["LLG-3"]);
		assert_eq!(search(&parts, "LIGHT ENGINE").len(), 1);
		assert_eq!(search(&parts, "light").len(), 2);
		assert!(search(&parts, " - ").is_empty());
		assert!(search(&parts, "").is_empty());
	}

	#[test]
	fn extracts_part_id_from_warning() {
		assert_eq!(warning_part_id("Missing power supply (PSU-12) for Sola"), Some("PSU-12"));
		assert_eq!(warning_part_id("first (A) then (B)"), Some("A"));
		assert_eq!(warning_part_id("no id here"), None);
		assert_eq!(warning_part_id("empty ()"), None);
		assert_eq!(warning_part_id("unclosed (X"), None);
	}
}
